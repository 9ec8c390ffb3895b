use bytemuck::{Pod, Zeroable};

/// One buffered vertex: position, texture coordinate and color.
///
/// Layout matches the backends' default vertex stream
/// (location 0: xyz, 1: st, 2: rgba).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const STRIDE: u64 = core::mem::size_of::<Vertex>() as u64;
    pub const POSITION_OFFSET: u64 = 0;
    pub const TEXCOORD_OFFSET: u64 = 12;
    pub const COLOR_OFFSET: u64 = 20;

    #[inline]
    pub const fn new(x: f32, y: f32, s: f32, t: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y, 0.0],
            texcoord: [s, t],
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_tightly_packed() {
        assert_eq!(Vertex::STRIDE, 36);
        let v = Vertex::new(1.0, 2.0, 0.5, 0.25, [1.0; 4]);
        let bytes: &[u8] = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), 36);
        assert_eq!(&bytes[Vertex::TEXCOORD_OFFSET as usize..][..4], &0.5f32.to_ne_bytes());
    }
}
