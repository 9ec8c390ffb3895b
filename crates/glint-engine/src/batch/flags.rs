use bitflags::bitflags;

use super::Vertex;

bitflags! {
    /// Layout of the interleaved `values` passed to `triangle_batch`.
    ///
    /// Exactly one of `XY`/`XYZ` is required. Colors are optional: `RGB`
    /// and `RGBA` are normalized floats, `RGB8` and `RGBA8` are given in
    /// `0..=255`. Missing components default to `z = 0`, `st = 0` and an
    /// opaque white color.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BatchFlags: u32 {
        const XY = 1 << 0;
        const XYZ = 1 << 1;
        const ST = 1 << 2;
        const RGB = 1 << 3;
        const RGBA = 1 << 4;
        const RGB8 = 1 << 5;
        const RGBA8 = 1 << 6;

        const XY_ST = Self::XY.bits() | Self::ST.bits();
        const XY_RGBA = Self::XY.bits() | Self::RGBA.bits();
        const XY_ST_RGBA = Self::XY.bits() | Self::ST.bits() | Self::RGBA.bits();
        const XYZ_ST_RGBA = Self::XYZ.bits() | Self::ST.bits() | Self::RGBA.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("batch flags need exactly one of XY or XYZ")]
    Position,
    #[error("batch flags name more than one color layout")]
    Color,
}

/// Decoded [`BatchFlags`]: component counts per vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub position: usize,
    pub texcoord: bool,
    pub color: usize,
    pub color_bytes: bool,
}

impl VertexLayout {
    pub fn from_flags(flags: BatchFlags) -> Result<Self, LayoutError> {
        let position = match (flags.contains(BatchFlags::XY), flags.contains(BatchFlags::XYZ)) {
            (true, false) => 2,
            (false, true) => 3,
            _ => return Err(LayoutError::Position),
        };
        let colors = [
            (BatchFlags::RGB, 3, false),
            (BatchFlags::RGBA, 4, false),
            (BatchFlags::RGB8, 3, true),
            (BatchFlags::RGBA8, 4, true),
        ];
        let mut color = 0;
        let mut color_bytes = false;
        for (flag, n, bytes) in colors {
            if flags.contains(flag) {
                if color != 0 {
                    return Err(LayoutError::Color);
                }
                color = n;
                color_bytes = bytes;
            }
        }
        Ok(Self {
            position,
            texcoord: flags.contains(BatchFlags::ST),
            color,
            color_bytes,
        })
    }

    /// Floats per vertex in the interleaved input.
    #[inline]
    pub fn stride(&self) -> usize {
        self.position + if self.texcoord { 2 } else { 0 } + self.color
    }

    /// Decodes one vertex from its slice of `values`.
    pub fn read(&self, v: &[f32], tint: [f32; 4]) -> Vertex {
        let z = if self.position == 3 { v[2] } else { 0.0 };
        let mut i = self.position;
        let texcoord = if self.texcoord {
            i += 2;
            [v[i - 2], v[i - 1]]
        } else {
            [0.0, 0.0]
        };
        let divisor = if self.color_bytes { 255.0 } else { 1.0 };
        let mut color = [1.0f32; 4];
        for (c, src) in color.iter_mut().zip(&v[i..i + self.color]) {
            *c = src / divisor;
        }
        for (c, t) in color.iter_mut().zip(tint) {
            *c *= t;
        }
        Vertex {
            position: [v[0], v[1], z],
            texcoord,
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_per_layout() {
        let l = VertexLayout::from_flags(BatchFlags::XY).unwrap();
        assert_eq!(l.stride(), 2);
        let l = VertexLayout::from_flags(BatchFlags::XYZ_ST_RGBA).unwrap();
        assert_eq!(l.stride(), 9);
        let l = VertexLayout::from_flags(BatchFlags::XY | BatchFlags::RGB8).unwrap();
        assert_eq!(l.stride(), 5);
    }

    #[test]
    fn position_is_required_and_exclusive() {
        assert_eq!(VertexLayout::from_flags(BatchFlags::ST), Err(LayoutError::Position));
        assert_eq!(
            VertexLayout::from_flags(BatchFlags::XY | BatchFlags::XYZ),
            Err(LayoutError::Position)
        );
        assert_eq!(
            VertexLayout::from_flags(BatchFlags::XY | BatchFlags::RGB | BatchFlags::RGBA),
            Err(LayoutError::Color)
        );
    }

    #[test]
    fn read_defaults_and_byte_colors() {
        let l = VertexLayout::from_flags(BatchFlags::XY | BatchFlags::RGB8).unwrap();
        let v = l.read(&[1.0, 2.0, 255.0, 0.0, 51.0], [1.0; 4]);
        assert_eq!(v.position, [1.0, 2.0, 0.0]);
        assert_eq!(v.texcoord, [0.0, 0.0]);
        assert_eq!((v.color[0], v.color[1], v.color[3]), (1.0, 0.0, 1.0));
        approx::assert_relative_eq!(v.color[2], 0.2, epsilon = 1e-6);
    }

    #[test]
    fn read_applies_tint() {
        let l = VertexLayout::from_flags(BatchFlags::XY_ST).unwrap();
        let v = l.read(&[0.0, 0.0, 0.5, 1.0], [0.5, 1.0, 1.0, 1.0]);
        assert_eq!(v.texcoord, [0.5, 1.0]);
        assert_eq!(v.color, [0.5, 1.0, 1.0, 1.0]);
    }
}
