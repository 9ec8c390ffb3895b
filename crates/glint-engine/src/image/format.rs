/// Pixel layout of client-side image data.
///
/// Backends store every texture as RGBA8; these formats describe the data
/// the caller uploads and reads back.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Format {
    Luminance,
    LuminanceAlpha,
    Rgb,
    #[default]
    Rgba,
    Alpha,
    Rg,
    Bgr,
    Bgra,
    Abgr,
}

impl Format {
    pub const fn channels(self) -> usize {
        match self {
            Format::Luminance | Format::Alpha => 1,
            Format::LuminanceAlpha | Format::Rg => 2,
            Format::Rgb | Format::Bgr => 3,
            Format::Rgba | Format::Bgra | Format::Abgr => 4,
        }
    }

    /// Format used for decoded files of `channels` channels.
    pub const fn from_channels(channels: usize) -> Option<Format> {
        match channels {
            1 => Some(Format::Luminance),
            2 => Some(Format::LuminanceAlpha),
            3 => Some(Format::Rgb),
            4 => Some(Format::Rgba),
            _ => None,
        }
    }

    fn expand(self, p: &[u8]) -> [u8; 4] {
        match self {
            Format::Luminance => [p[0], p[0], p[0], 255],
            Format::LuminanceAlpha => [p[0], p[0], p[0], p[1]],
            Format::Rgb => [p[0], p[1], p[2], 255],
            Format::Rgba => [p[0], p[1], p[2], p[3]],
            Format::Alpha => [255, 255, 255, p[0]],
            Format::Rg => [p[0], p[1], 0, 255],
            Format::Bgr => [p[2], p[1], p[0], 255],
            Format::Bgra => [p[2], p[1], p[0], p[3]],
            Format::Abgr => [p[3], p[2], p[1], p[0]],
        }
    }

    fn reduce(self, c: [u8; 4], out: &mut Vec<u8>) {
        match self {
            Format::Luminance => out.push(c[0]),
            Format::LuminanceAlpha => out.extend_from_slice(&[c[0], c[3]]),
            Format::Rgb => out.extend_from_slice(&c[..3]),
            Format::Rgba => out.extend_from_slice(&c),
            Format::Alpha => out.push(c[3]),
            Format::Rg => out.extend_from_slice(&c[..2]),
            Format::Bgr => out.extend_from_slice(&[c[2], c[1], c[0]]),
            Format::Bgra => out.extend_from_slice(&[c[2], c[1], c[0], c[3]]),
            Format::Abgr => out.extend_from_slice(&[c[3], c[2], c[1], c[0]]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("pixel buffer of {available} bytes is too small for {width}x{height} rows of pitch {pitch}")]
pub struct PixelBufferError {
    pub width: usize,
    pub height: usize,
    pub pitch: usize,
    pub available: usize,
}

/// Converts `width × height` pixels of `format` (rows `pitch` bytes apart)
/// to tightly packed RGBA8.
pub fn to_rgba8(
    format: Format,
    src: &[u8],
    width: usize,
    height: usize,
    pitch: usize,
) -> Result<Vec<u8>, PixelBufferError> {
    let row_bytes = width * format.channels();
    let pitch = pitch.max(row_bytes);
    let needed = if height == 0 { 0 } else { pitch * (height - 1) + row_bytes };
    if src.len() < needed {
        return Err(PixelBufferError {
            width,
            height,
            pitch,
            available: src.len(),
        });
    }
    let mut out = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let row = &src[y * pitch..y * pitch + row_bytes];
        for p in row.chunks_exact(format.channels()) {
            out.extend_from_slice(&format.expand(p));
        }
    }
    Ok(out)
}

/// Converts tightly packed RGBA8 to tightly packed `format`.
pub fn from_rgba8(format: Format, rgba: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len() / 4 * format.channels());
    for c in rgba.chunks_exact(4) {
        format.reduce([c[0], c[1], c[2], c[3]], &mut out);
    }
    out
}

/// Client-side pixel buffer: the counterpart of a CPU surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub format: Format,
    /// Tightly packed rows, top row first.
    pub pixels: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, format: Format, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            pixels,
        }
    }

    #[inline]
    pub fn pitch(&self) -> usize {
        self.width as usize * self.format.channels()
    }

    /// Pixel at (x, y) expanded to RGBA, or `None` out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let n = self.format.channels();
        let at = y as usize * self.pitch() + x as usize * n;
        self.pixels.get(at..at + n).map(|p| self.format.expand(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luminance_expands_to_grey() {
        let out = to_rgba8(Format::Luminance, &[10, 20], 2, 1, 2).unwrap();
        assert_eq!(out, vec![10, 10, 10, 255, 20, 20, 20, 255]);
    }

    #[test]
    fn pitch_skips_row_padding() {
        let src = [1, 2, 3, 0xEE, 4, 5, 6, 0xEE];
        let out = to_rgba8(Format::Rgb, &src, 1, 2, 4).unwrap();
        assert_eq!(out, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(to_rgba8(Format::Rgba, &[0; 7], 2, 1, 8).is_err());
    }

    #[test]
    fn bgra_round_trips_through_rgba() {
        let src = [1, 2, 3, 4];
        let rgba = to_rgba8(Format::Bgra, &src, 1, 1, 4).unwrap();
        assert_eq!(rgba, vec![3, 2, 1, 4]);
        assert_eq!(from_rgba8(Format::Bgra, &rgba), src.to_vec());
    }

    #[test]
    fn alpha_only_keeps_alpha() {
        let rgba = to_rgba8(Format::Alpha, &[7], 1, 1, 1).unwrap();
        assert_eq!(rgba, vec![255, 255, 255, 7]);
        assert_eq!(from_rgba8(Format::Alpha, &rgba), vec![7]);
    }

    #[test]
    fn bitmap_pixel_lookup() {
        let b = Bitmap::new(2, 1, Format::Rgb, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(b.pixel(1, 0), Some([4, 5, 6, 255]));
        assert_eq!(b.pixel(2, 0), None);
    }
}
