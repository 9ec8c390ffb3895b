use std::path::Path;

use crate::batch::FlushTrigger;
use crate::coords::{Rect, Vec2};
use crate::error::{ErrorCode, GpuError, GpuResult};
use crate::handle::{ImageId, TargetId};
use crate::image::{
    Bitmap, CodecError, FileFormat, FilterMode, Format, Image, ImageInfo, Sampling, WrapMode,
    codec, from_rgba8, texture_size, to_rgba8,
};
use crate::paint::{BlendEq, BlendFunc, BlendMode, BlendPreset, Color};
use crate::target::coords;

use super::{Features, PixelRect, Renderer, TextureDesc};

/// Copies a `w × h` region at (x, y) out of tightly packed RGBA8 rows
/// `src_w` pixels wide.
fn crop_rgba(src: &[u8], src_w: u32, x: u32, y: u32, w: u32, h: u32) -> Vec<u8> {
    let row = src_w as usize * 4;
    let mut out = Vec::with_capacity(w as usize * h as usize * 4);
    for r in y..y + h {
        let start = r as usize * row + x as usize * 4;
        let end = start + w as usize * 4;
        if let Some(bytes) = src.get(start..end) {
            out.extend_from_slice(bytes);
        }
    }
    out
}

fn codec_error(function: &'static str, err: CodecError) -> GpuError {
    let code = if err.is_not_found() {
        ErrorCode::FileNotFound
    } else {
        ErrorCode::DataError
    };
    GpuError::new(function, code, err.to_string())
}

/// Integer region of `rect` inside `w × h`, or `None` when nothing is left.
fn clamp_region(rect: Rect, w: u32, h: u32) -> Option<(u32, u32, u32, u32)> {
    let r = rect.normalized().intersect(Rect::from_size(w as f32, h as f32))?;
    let x0 = r.x.floor() as u32;
    let y0 = r.y.floor() as u32;
    let x1 = ((r.x + r.w).ceil() as u32).min(w);
    let y1 = ((r.y + r.h).ceil() as u32).min(h);
    (x1 > x0 && y1 > y0).then(|| (x0, y0, x1 - x0, y1 - y0))
}

impl Renderer {
    // ── creation ──────────────────────────────────────────────────────────

    pub(crate) fn create_image(&mut self, w: u32, h: u32, format: Format) -> GpuResult<ImageId> {
        self.create_image_named("create_image", w, h, format)
    }

    fn create_image_named(&mut self, function: &'static str, w: u32, h: u32, format: Format) -> GpuResult<ImageId> {
        if w == 0 || h == 0 {
            return Err(GpuError::user(function, format!("image size {w}x{h} must be non-zero")));
        }
        let (tw, th) = texture_size(w, h, self.features.contains(Features::NON_POWER_OF_TWO));
        let texture = self
            .backend
            .create_texture(&TextureDesc {
                width: tw,
                height: th,
                sampling: Sampling::default(),
            })
            .map_err(|e| GpuError::backend(function, e))?;
        let id = self.handles.image();
        self.images.insert(id, Image::new(texture, w, h, tw, th, format));
        self.texture_refs.insert(texture, 1);
        if self.settings.debug_level.traces() {
            log::debug!("{function}: {id:?} {w}x{h} ({tw}x{th} texture)");
        }
        Ok(id)
    }

    /// Creates an image holding a copy of `bitmap`.
    pub(crate) fn copy_image_from_surface(&mut self, bitmap: &Bitmap) -> GpuResult<ImageId> {
        self.image_from_bitmap("copy_image_from_surface", bitmap)
    }

    fn image_from_bitmap(&mut self, function: &'static str, bitmap: &Bitmap) -> GpuResult<ImageId> {
        let rgba = to_rgba8(
            bitmap.format,
            &bitmap.pixels,
            bitmap.width as usize,
            bitmap.height as usize,
            bitmap.pitch(),
        )
        .map_err(|e| GpuError::data(function, e.to_string()))?;
        let id = self.create_image_named(function, bitmap.width, bitmap.height, bitmap.format)?;
        self.upload(function, id, PixelRect::new(0, 0, bitmap.width, bitmap.height), &rgba)?;
        Ok(id)
    }

    fn upload(&mut self, function: &'static str, id: ImageId, region: PixelRect, rgba: &[u8]) -> GpuResult<()> {
        let texture = self.image(function, id)?.texture;
        let result = self.backend.update_texture(texture, region, rgba);
        if let Err(e) = result {
            self.free_image(id);
            return Err(GpuError::backend(function, e));
        }
        Ok(())
    }

    pub(crate) fn load_image(&mut self, path: &Path) -> GpuResult<ImageId> {
        const FN: &str = "load_image";
        let bitmap = codec::load_file(path).map_err(|e| codec_error(FN, e))?;
        self.image_from_bitmap(FN, &bitmap)
    }

    pub(crate) fn load_image_from_memory(&mut self, bytes: &[u8]) -> GpuResult<ImageId> {
        const FN: &str = "load_image_from_memory";
        let bitmap = codec::decode(bytes).map_err(|e| codec_error(FN, e))?;
        self.image_from_bitmap(FN, &bitmap)
    }

    /// A new image sharing `image`'s texture, with its own state.
    pub(crate) fn create_alias_image(&mut self, image: ImageId) -> GpuResult<ImageId> {
        let mut alias = self.image("create_alias_image", image)?.clone();
        alias.target = None;
        *self.texture_refs.entry(alias.texture).or_insert(0) += 1;
        let id = self.handles.image();
        self.images.insert(id, alias);
        Ok(id)
    }

    /// A new image with `image`'s pixels and state and its own texture.
    pub(crate) fn copy_image(&mut self, image: ImageId) -> GpuResult<ImageId> {
        const FN: &str = "copy_image";
        let src = self.image(FN, image)?.clone();
        if let Some(t) = src.target {
            self.flush_if(FlushTrigger::TargetState(t))?;
        }
        let texels = self
            .backend
            .read_texture(src.texture)
            .map_err(|e| GpuError::backend(FN, e))?;
        let rgba = crop_rgba(&texels, src.texture_w, 0, 0, src.w, src.h);

        let id = self.create_image_named(FN, src.w, src.h, src.format)?;
        self.upload(FN, id, PixelRect::new(0, 0, src.w, src.h), &rgba)?;
        let copy = self.image_mut(FN, id)?;
        copy.blend_mode = src.blend_mode;
        copy.use_blending = src.use_blending;
        copy.color = src.color;
        copy.anchor = src.anchor;
        let sampling = src.sampling;
        let texture = copy.texture;
        copy.sampling = sampling;
        if sampling != Sampling::default() {
            self.backend
                .set_texture_sampling(texture, sampling)
                .map_err(|e| GpuError::backend(FN, e))?;
        }
        Ok(id)
    }

    /// Reads a target's pixels, top row first, at its physical size.
    fn read_target_rgba(&mut self, function: &'static str, target: TargetId) -> GpuResult<(u32, u32, Vec<u8>)> {
        self.require(function, Features::READBACK)?;
        self.flush_if(FlushTrigger::TargetState(target))?;
        let t = self.target(function, target)?;
        let surface = t.surface;
        let (base_w, base_h) = (t.base_w, t.base_h);
        let (sw, _) = self
            .backend
            .surface_size(surface)
            .ok_or_else(|| GpuError::null_argument(function, "surface"))?;
        let raw = self
            .backend
            .read_surface(surface)
            .map_err(|e| GpuError::backend(function, e))?;
        let t = self.target(function, target)?;
        let rows = if t.flips_y() {
            crop_rgba(&raw, sw, 0, 0, base_w, base_h)
        } else {
            // Window surfaces are exactly the physical size.
            coords::rows_top_first(t, raw)
        };
        Ok((base_w, base_h, rows))
    }

    pub(crate) fn copy_image_from_target(&mut self, target: TargetId) -> GpuResult<ImageId> {
        const FN: &str = "copy_image_from_target";
        let (w, h, rgba) = self.read_target_rgba(FN, target)?;
        let id = self.create_image_named(FN, w, h, Format::Rgba)?;
        self.upload(FN, id, PixelRect::new(0, 0, w, h), &rgba)?;
        Ok(id)
    }

    pub(crate) fn copy_surface_from_target(&mut self, target: TargetId) -> GpuResult<Bitmap> {
        let (w, h, rgba) = self.read_target_rgba("copy_surface_from_target", target)?;
        Ok(Bitmap::new(w, h, Format::Rgba, rgba))
    }

    /// The image's pixels in its own format.
    pub(crate) fn copy_surface_from_image(&mut self, image: ImageId) -> GpuResult<Bitmap> {
        const FN: &str = "copy_surface_from_image";
        let img = self.image(FN, image)?.clone();
        if let Some(t) = img.target {
            self.flush_if(FlushTrigger::TargetState(t))?;
        }
        let texels = self
            .backend
            .read_texture(img.texture)
            .map_err(|e| GpuError::backend(FN, e))?;
        let rgba = crop_rgba(&texels, img.texture_w, 0, 0, img.w, img.h);
        Ok(Bitmap::new(img.w, img.h, img.format, from_rgba8(img.format, &rgba)))
    }

    // ── updates ───────────────────────────────────────────────────────────

    fn flush_for_image_write(&mut self, image: ImageId) -> GpuResult<()> {
        self.flush_if(FlushTrigger::ImageUpdate(image))?;
        if let Some(t) = self.images.get(&image).and_then(|i| i.target) {
            self.flush_if(FlushTrigger::TargetState(t))?;
        }
        Ok(())
    }

    /// Copies `surface_rect` of `bitmap` into `image_rect` of `image`.
    ///
    /// `None` rects mean the whole image / bitmap. Pixels are not scaled:
    /// the copied area is the smaller of the two rects, clipped to both
    /// buffers.
    pub(crate) fn update_image(
        &mut self,
        image: ImageId,
        image_rect: Option<Rect>,
        bitmap: &Bitmap,
        surface_rect: Option<Rect>,
    ) -> GpuResult<()> {
        const FN: &str = "update_image";
        let (iw, ih) = {
            let img = self.image(FN, image)?;
            (img.w, img.h)
        };
        let dst = image_rect.unwrap_or(Rect::from_size(iw as f32, ih as f32));
        let src = surface_rect.unwrap_or(Rect::from_size(bitmap.width as f32, bitmap.height as f32));
        let Some((dx, dy, dw, dh)) = clamp_region(dst, iw, ih) else {
            return Ok(());
        };
        let Some((sx, sy, sw, sh)) = clamp_region(src, bitmap.width, bitmap.height) else {
            return Ok(());
        };
        let (w, h) = (dw.min(sw), dh.min(sh));

        let full = to_rgba8(
            bitmap.format,
            &bitmap.pixels,
            bitmap.width as usize,
            bitmap.height as usize,
            bitmap.pitch(),
        )
        .map_err(|e| GpuError::data(FN, e.to_string()))?;
        let rgba = crop_rgba(&full, bitmap.width, sx, sy, w, h);

        self.flush_for_image_write(image)?;
        let texture = self.image(FN, image)?.texture;
        self.backend
            .update_texture(texture, PixelRect::new(dx, dy, w, h), &rgba)
            .map_err(|e| GpuError::backend(FN, e))
    }

    /// Writes raw rows in the image's own format into `image_rect`.
    pub(crate) fn update_image_bytes(
        &mut self,
        image: ImageId,
        image_rect: Option<Rect>,
        bytes: &[u8],
        bytes_per_row: usize,
    ) -> GpuResult<()> {
        const FN: &str = "update_image_bytes";
        let (iw, ih, format) = {
            let img = self.image(FN, image)?;
            (img.w, img.h, img.format)
        };
        let dst = image_rect.unwrap_or(Rect::from_size(iw as f32, ih as f32));
        let Some((x, y, w, h)) = clamp_region(dst, iw, ih) else {
            return Ok(());
        };
        let rgba = to_rgba8(format, bytes, w as usize, h as usize, bytes_per_row)
            .map_err(|e| GpuError::data(FN, e.to_string()))?;

        self.flush_for_image_write(image)?;
        let texture = self.image(FN, image)?.texture;
        self.backend
            .update_texture(texture, PixelRect::new(x, y, w, h), &rgba)
            .map_err(|e| GpuError::backend(FN, e))
    }

    pub(crate) fn save_image(&mut self, image: ImageId, path: &Path, format: Option<FileFormat>) -> GpuResult<()> {
        const FN: &str = "save_image";
        let mut bitmap = self.copy_surface_from_image(image)?;
        if !matches!(
            bitmap.format,
            Format::Luminance | Format::LuminanceAlpha | Format::Rgb | Format::Rgba
        ) {
            let rgba = to_rgba8(
                bitmap.format,
                &bitmap.pixels,
                bitmap.width as usize,
                bitmap.height as usize,
                bitmap.pitch(),
            )
            .map_err(|e| GpuError::data(FN, e.to_string()))?;
            bitmap = Bitmap::new(bitmap.width, bitmap.height, Format::Rgba, rgba);
        }
        codec::save_file(
            path,
            &bitmap.pixels,
            bitmap.width,
            bitmap.height,
            bitmap.format.channels(),
            format,
        )
        .map_err(|e| codec_error(FN, e))
    }

    /// Frees `image` and every target drawing into it, aliases included.
    /// Unknown handles are ignored.
    pub(crate) fn free_image(&mut self, image: ImageId) {
        const FN: &str = "free_image";
        if !self.images.contains_key(&image) {
            return;
        }
        if let Err(e) = self.flush_if(FlushTrigger::ImageUpdate(image)) {
            log::warn!("{FN}: flush failed: {e}");
        }
        let bound: Vec<TargetId> = self
            .targets
            .iter()
            .filter(|(_, t)| t.image() == Some(image))
            .map(|(id, _)| *id)
            .collect();
        for target in bound {
            self.free_target(target);
        }
        self.batch.discard_if(None, Some(image));
        let Some(img) = self.images.remove(&image) else {
            return;
        };
        let refs = self.texture_refs.entry(img.texture).or_insert(1);
        *refs = refs.saturating_sub(1);
        if *refs == 0 {
            self.texture_refs.remove(&img.texture);
            self.backend.free_texture(img.texture);
        }
        if self.settings.debug_level.traces() {
            log::debug!("{FN}: {image:?}");
        }
    }

    // ── sampling ──────────────────────────────────────────────────────────

    pub(crate) fn generate_mipmaps(&mut self, image: ImageId) -> GpuResult<()> {
        const FN: &str = "generate_mipmaps";
        self.image(FN, image)?;
        self.require(FN, Features::MIPMAPS)?;
        self.flush_for_image_write(image)?;
        let texture = self.image(FN, image)?.texture;
        self.backend
            .generate_mipmaps(texture)
            .map_err(|e| GpuError::backend(FN, e))?;
        self.image_mut(FN, image)?.has_mipmaps = true;
        Ok(())
    }

    fn apply_sampling(&mut self, function: &'static str, image: ImageId, sampling: Sampling) -> GpuResult<()> {
        self.flush_if(FlushTrigger::ImageUpdate(image))?;
        let img = self.image_mut(function, image)?;
        img.sampling = sampling;
        let texture = img.texture;
        self.backend
            .set_texture_sampling(texture, sampling)
            .map_err(|e| GpuError::backend(function, e))
    }

    pub(crate) fn set_image_filter(&mut self, image: ImageId, filter: FilterMode) -> GpuResult<()> {
        const FN: &str = "set_image_filter";
        let mut sampling = self.image(FN, image)?.sampling;
        sampling.filter = filter;
        self.apply_sampling(FN, image, sampling)
    }

    pub(crate) fn set_wrap_mode(&mut self, image: ImageId, wrap_x: WrapMode, wrap_y: WrapMode) -> GpuResult<()> {
        const FN: &str = "set_wrap_mode";
        let mut sampling = self.image(FN, image)?.sampling;
        if wrap_x != WrapMode::None || wrap_y != WrapMode::None {
            self.require(FN, Features::WRAP_REPEAT_MIRRORED)?;
        }
        sampling.wrap_x = wrap_x;
        sampling.wrap_y = wrap_y;
        self.apply_sampling(FN, image, sampling)
    }

    // ── per-image state ───────────────────────────────────────────────────

    pub(crate) fn set_image_color(&mut self, image: ImageId, color: Color) -> GpuResult<()> {
        self.image_mut("set_color", image)?.color = color;
        Ok(())
    }

    pub(crate) fn set_anchor(&mut self, image: ImageId, anchor: Vec2) -> GpuResult<()> {
        self.image_mut("set_anchor", image)?.anchor = anchor;
        Ok(())
    }

    fn update_blend(
        &mut self,
        function: &'static str,
        image: ImageId,
        f: impl FnOnce(&mut Image),
    ) -> GpuResult<()> {
        self.image(function, image)?;
        self.flush_if(FlushTrigger::Blend)?;
        f(self.image_mut(function, image)?);
        Ok(())
    }

    pub(crate) fn set_blending(&mut self, image: ImageId, enable: bool) -> GpuResult<()> {
        self.update_blend("set_blending", image, |img| img.use_blending = enable)
    }

    pub(crate) fn set_blend_mode(&mut self, image: ImageId, preset: BlendPreset) -> GpuResult<()> {
        self.update_blend("set_blend_mode", image, |img| {
            img.blend_mode = BlendMode::from_preset(preset)
        })
    }

    pub(crate) fn set_blend_function(
        &mut self,
        image: ImageId,
        source_color: BlendFunc,
        dest_color: BlendFunc,
        source_alpha: BlendFunc,
        dest_alpha: BlendFunc,
    ) -> GpuResult<()> {
        self.update_blend("set_blend_function", image, |img| {
            img.blend_mode = img
                .blend_mode
                .with_function(source_color, dest_color, source_alpha, dest_alpha)
        })
    }

    pub(crate) fn set_blend_equation(
        &mut self,
        image: ImageId,
        color_equation: BlendEq,
        alpha_equation: BlendEq,
    ) -> GpuResult<()> {
        self.update_blend("set_blend_equation", image, |img| {
            img.blend_mode = img.blend_mode.with_equation(color_equation, alpha_equation)
        })
    }

    pub(crate) fn image_info(&self, image: ImageId) -> GpuResult<ImageInfo> {
        Ok(ImageInfo::from(self.image("image_info", image)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_picks_rows_and_columns() {
        // 3x2 image, pixel value = index.
        let src: Vec<u8> = (0..6u8).flat_map(|i| [i; 4]).collect();
        let out = crop_rgba(&src, 3, 1, 1, 2, 1);
        assert_eq!(out, vec![4, 4, 4, 4, 5, 5, 5, 5]);
    }

    #[test]
    fn regions_are_clipped() {
        assert_eq!(clamp_region(Rect::new(-2.0, 1.0, 5.0, 10.0), 4, 4), Some((0, 1, 3, 3)));
        assert_eq!(clamp_region(Rect::new(5.0, 5.0, 1.0, 1.0), 4, 4), None);
    }

    #[test]
    fn missing_files_map_to_file_not_found() {
        let err = codec::load_file("/nonexistent/glint.png").unwrap_err();
        assert_eq!(codec_error("load_image", err).code, ErrorCode::FileNotFound);
        let err = codec::decode(b"nope").unwrap_err();
        assert_eq!(codec_error("load_image", err).code, ErrorCode::DataError);
    }
}
