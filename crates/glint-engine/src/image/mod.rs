//! Images: GPU textures plus the state used when blitting them.
//!
//! Pixel formats and conversions live in `format`, file decoding and
//! encoding in `codec` (backed by the `image` crate).

pub mod codec;
mod format;

pub use codec::{CodecError, FileFormat};
pub use format::{Bitmap, Format, PixelBufferError, from_rgba8, to_rgba8};

use crate::coords::Vec2;
use crate::handle::TargetId;
use crate::paint::{BlendMode, Color};
use crate::renderer::TextureHandle;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
    /// Linear within and between mip levels.
    LinearMipmap,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum WrapMode {
    /// Clamp to the edge texel.
    #[default]
    None,
    Repeat,
    Mirrored,
}

/// Texture sampling state as seen by a backend.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Sampling {
    pub filter: FilterMode,
    pub wrap_x: WrapMode,
    pub wrap_y: WrapMode,
}

/// An image owned by a renderer.
#[derive(Debug, Clone)]
pub struct Image {
    pub texture: TextureHandle,
    /// Logical size in pixels.
    pub w: u32,
    pub h: u32,
    /// Allocated texture size (power-of-two padded on backends that need it).
    pub texture_w: u32,
    pub texture_h: u32,
    pub format: Format,
    pub blend_mode: BlendMode,
    pub use_blending: bool,
    pub sampling: Sampling,
    pub color: Color,
    /// Normalized point of the image placed at blit coordinates.
    pub anchor: Vec2,
    pub has_mipmaps: bool,
    pub target: Option<TargetId>,
}

impl Image {
    pub fn new(texture: TextureHandle, w: u32, h: u32, texture_w: u32, texture_h: u32, format: Format) -> Self {
        Self {
            texture,
            w,
            h,
            texture_w,
            texture_h,
            format,
            blend_mode: BlendMode::default(),
            use_blending: true,
            sampling: Sampling::default(),
            color: Color::WHITE,
            anchor: Vec2::new(0.5, 0.5),
            has_mipmaps: false,
            target: None,
        }
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    /// Texture coordinates of a source rectangle given in image pixels.
    pub fn texcoords(&self, x: f32, y: f32, w: f32, h: f32) -> [f32; 4] {
        let tw = self.texture_w as f32;
        let th = self.texture_h as f32;
        [x / tw, y / th, (x + w) / tw, (y + h) / th]
    }
}

/// Read-only snapshot of an image's state.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub w: u32,
    pub h: u32,
    pub texture_w: u32,
    pub texture_h: u32,
    pub format: Format,
    pub channels: usize,
    pub blend_mode: BlendMode,
    pub use_blending: bool,
    pub sampling: Sampling,
    pub color: Color,
    pub anchor: Vec2,
    pub has_mipmaps: bool,
    pub target: Option<TargetId>,
}

impl From<&Image> for ImageInfo {
    fn from(img: &Image) -> Self {
        Self {
            w: img.w,
            h: img.h,
            texture_w: img.texture_w,
            texture_h: img.texture_h,
            format: img.format,
            channels: img.channels(),
            blend_mode: img.blend_mode,
            use_blending: img.use_blending,
            sampling: img.sampling,
            color: img.color,
            anchor: img.anchor,
            has_mipmaps: img.has_mipmaps,
            target: img.target,
        }
    }
}

/// Texture size for a logical size, padded to powers of two when needed.
pub fn texture_size(w: u32, h: u32, non_power_of_two: bool) -> (u32, u32) {
    if non_power_of_two {
        (w, h)
    } else {
        (w.max(1).next_power_of_two(), h.max(1).next_power_of_two())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_of_two_padding() {
        assert_eq!(texture_size(100, 64, false), (128, 64));
        assert_eq!(texture_size(100, 64, true), (100, 64));
        assert_eq!(texture_size(0, 1, false), (1, 1));
    }

    #[test]
    fn texcoords_use_texture_size() {
        let img = Image::new(TextureHandle(1), 100, 50, 128, 64, Format::Rgba);
        assert_eq!(img.texcoords(0.0, 0.0, 64.0, 32.0), [0.0, 0.0, 0.5, 0.5]);
    }

    #[test]
    fn defaults() {
        let img = Image::new(TextureHandle(1), 4, 4, 4, 4, Format::Rgb);
        assert_eq!(img.anchor, Vec2::new(0.5, 0.5));
        assert!(img.use_blending);
        assert_eq!(img.channels(), 3);
        assert_eq!(ImageInfo::from(&img).channels, 3);
    }
}
