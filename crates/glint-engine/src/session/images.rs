use std::path::Path;

use crate::coords::{Rect, Vec2};
use crate::handle::{ImageId, TargetId};
use crate::image::{Bitmap, FileFormat, FilterMode, Format, ImageInfo, WrapMode};
use crate::paint::{BlendEq, BlendFunc, BlendPreset, Color};

use super::Session;

impl Session {
    // ── creation ──────────────────────────────────────────────────────────

    pub fn create_image(&mut self, w: u32, h: u32, format: Format) -> Option<ImageId> {
        self.dispatch("create_image", |r| r.create_image(w, h, format))
    }

    pub fn load_image(&mut self, path: impl AsRef<Path>) -> Option<ImageId> {
        let path = path.as_ref();
        self.dispatch("load_image", |r| r.load_image(path))
    }

    /// Decodes an encoded file (PNG, BMP, TGA, JPEG, GIF) held in memory.
    pub fn load_image_from_memory(&mut self, bytes: &[u8]) -> Option<ImageId> {
        self.dispatch("load_image_from_memory", |r| r.load_image_from_memory(bytes))
    }

    /// New image sharing `image`'s texture but with its own drawing state.
    pub fn create_alias_image(&mut self, image: ImageId) -> Option<ImageId> {
        self.dispatch("create_alias_image", |r| r.create_alias_image(image))
    }

    /// Deep copy with its own texture.
    pub fn copy_image(&mut self, image: ImageId) -> Option<ImageId> {
        self.dispatch("copy_image", |r| r.copy_image(image))
    }

    pub fn copy_image_from_surface(&mut self, bitmap: &Bitmap) -> Option<ImageId> {
        self.dispatch("copy_image_from_surface", |r| r.copy_image_from_surface(bitmap))
    }

    pub fn copy_image_from_target(&mut self, target: TargetId) -> Option<ImageId> {
        self.dispatch("copy_image_from_target", |r| r.copy_image_from_target(target))
    }

    pub fn copy_surface_from_image(&mut self, image: ImageId) -> Option<Bitmap> {
        self.dispatch("copy_surface_from_image", |r| r.copy_surface_from_image(image))
    }

    /// Target contents as an RGBA bitmap, top row first.
    pub fn copy_surface_from_target(&mut self, target: TargetId) -> Option<Bitmap> {
        self.dispatch("copy_surface_from_target", |r| r.copy_surface_from_target(target))
    }

    // ── updates ───────────────────────────────────────────────────────────

    pub fn update_image(
        &mut self,
        image: ImageId,
        image_rect: Option<Rect>,
        bitmap: &Bitmap,
        surface_rect: Option<Rect>,
    ) {
        self.dispatch("update_image", |r| {
            r.update_image(image, image_rect, bitmap, surface_rect)
        });
    }

    pub fn update_image_bytes(&mut self, image: ImageId, image_rect: Option<Rect>, bytes: &[u8], bytes_per_row: usize) {
        self.dispatch("update_image_bytes", |r| {
            r.update_image_bytes(image, image_rect, bytes, bytes_per_row)
        });
    }

    /// Writes the image to `path`; the format follows the extension unless
    /// given.
    pub fn save_image(&mut self, image: ImageId, path: impl AsRef<Path>, format: Option<FileFormat>) -> bool {
        let path = path.as_ref();
        self.dispatch("save_image", |r| r.save_image(image, path, format))
            .is_some()
    }

    /// Stale or unknown images are ignored.
    pub fn free_image(&mut self, image: ImageId) {
        if let Some(r) = self.current_renderer_mut() {
            r.free_image(image);
        }
    }

    // ── sampling ──────────────────────────────────────────────────────────

    pub fn generate_mipmaps(&mut self, image: ImageId) {
        self.dispatch("generate_mipmaps", |r| r.generate_mipmaps(image));
    }

    pub fn set_image_filter(&mut self, image: ImageId, filter: FilterMode) {
        self.dispatch("set_image_filter", |r| r.set_image_filter(image, filter));
    }

    pub fn set_wrap_mode(&mut self, image: ImageId, wrap_x: WrapMode, wrap_y: WrapMode) {
        self.dispatch("set_wrap_mode", |r| r.set_wrap_mode(image, wrap_x, wrap_y));
    }

    // ── drawing state ─────────────────────────────────────────────────────

    /// Modulation color applied when the image is drawn.
    pub fn set_color(&mut self, image: ImageId, color: Color) {
        self.dispatch("set_color", |r| r.set_image_color(image, color));
    }

    pub fn set_rgba(&mut self, image: ImageId, r: u8, g: u8, b: u8, a: u8) {
        self.set_color(image, Color::rgba(r, g, b, a));
    }

    pub fn unset_color(&mut self, image: ImageId) {
        self.set_color(image, Color::WHITE);
    }

    /// Normalized point of the image placed at blit coordinates
    /// (0.5, 0.5 is the center).
    pub fn set_anchor(&mut self, image: ImageId, anchor_x: f32, anchor_y: f32) {
        self.dispatch("set_anchor", |r| r.set_anchor(image, Vec2::new(anchor_x, anchor_y)));
    }

    pub fn set_blending(&mut self, image: ImageId, enable: bool) {
        self.dispatch("set_blending", |r| r.set_blending(image, enable));
    }

    pub fn set_blend_mode(&mut self, image: ImageId, preset: BlendPreset) {
        self.dispatch("set_blend_mode", |r| r.set_blend_mode(image, preset));
    }

    pub fn set_blend_function(
        &mut self,
        image: ImageId,
        source_color: BlendFunc,
        dest_color: BlendFunc,
        source_alpha: BlendFunc,
        dest_alpha: BlendFunc,
    ) {
        self.dispatch("set_blend_function", |r| {
            r.set_blend_function(image, source_color, dest_color, source_alpha, dest_alpha)
        });
    }

    pub fn set_blend_equation(&mut self, image: ImageId, color_equation: BlendEq, alpha_equation: BlendEq) {
        self.dispatch("set_blend_equation", |r| {
            r.set_blend_equation(image, color_equation, alpha_equation)
        });
    }

    pub fn image_info(&mut self, image: ImageId) -> Option<ImageInfo> {
        self.dispatch("image_info", |r| r.image_info(image))
    }
}
