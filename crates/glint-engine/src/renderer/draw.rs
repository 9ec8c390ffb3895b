use bitflags::bitflags;

use crate::batch::{BatchFlags, BatchKey, FlushTrigger, Vertex, VertexLayout};
use crate::coords::{Rect, Vec2};
use crate::error::{GpuError, GpuResult};
use crate::handle::{ImageId, TargetId};
use crate::paint::{BlendEq, BlendFunc, BlendMode, BlendPreset, Color};
use crate::shapes::Tessellation;
use crate::target::coords;

use super::Renderer;

bitflags! {
    /// Mirroring applied by `blit_rect_x`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FlipFlags: u32 {
        const HORIZONTAL = 1 << 0;
        const VERTICAL = 1 << 1;
    }
}

/// Placement of a source rectangle on a target.
#[derive(Debug, Copy, Clone)]
struct QuadTransform {
    /// Destination of the pivot.
    x: f32,
    y: f32,
    /// Pivot in source pixels, relative to the source rect's top-left.
    pivot: Vec2,
    degrees: f32,
    scale: Vec2,
}

impl QuadTransform {
    fn apply(&self, local: Vec2) -> Vec2 {
        let p = local - self.pivot;
        let scaled = Vec2::new(p.x * self.scale.x, p.y * self.scale.y);
        let r = if self.degrees == 0.0 {
            scaled
        } else {
            scaled.rotated(self.degrees)
        };
        Vec2::new(r.x + self.x, r.y + self.y)
    }
}

/// Applies a column-major 3×3 matrix to a point.
fn apply_mat3(m: &[f32; 9], p: Vec2) -> Vec2 {
    let x = m[0] * p.x + m[3] * p.y + m[6];
    let y = m[1] * p.x + m[4] * p.y + m[7];
    let w = m[2] * p.x + m[5] * p.y + m[8];
    if w != 0.0 && w != 1.0 {
        Vec2::new(x / w, y / w)
    } else {
        Vec2::new(x, y)
    }
}

impl Renderer {
    // ── emission ──────────────────────────────────────────────────────────

    fn emit(&mut self, key: BatchKey, vertices: &[Vertex], indices: &[u32]) -> GpuResult<()> {
        self.prepare_append(key, vertices.len(), indices.len())?;
        self.batch.append(vertices, indices);
        Ok(())
    }

    /// Appends indexed triangles, splitting requests larger than the
    /// batch into whole triangles drawn over several flushes.
    fn emit_triangles(&mut self, key: BatchKey, vertices: &[Vertex], indices: &[u32]) -> GpuResult<()> {
        if self.batch.fits(vertices.len(), indices.len()) {
            return self.emit(key, vertices, indices);
        }
        let per_chunk = self.batch.max_vertices().min(self.batch.max_indices()) / 3 * 3;
        let mut chunk = Vec::with_capacity(per_chunk);
        let sequential: Vec<u32> = (0..per_chunk as u32).collect();
        for triangles in indices.chunks(per_chunk) {
            chunk.clear();
            chunk.extend(triangles.iter().map(|&i| vertices[i as usize]));
            self.emit(key, &chunk, &sequential[..chunk.len()])?;
        }
        Ok(())
    }

    /// Validates the (image, target) pair of a textured draw.
    fn prepare_textured(&mut self, function: &'static str, image: ImageId, target: TargetId) -> GpuResult<()> {
        self.prepare_target(function, target)?;
        self.image(function, image)?;
        if self.target(function, target)?.image() == Some(image) {
            return Err(GpuError::user(function, "cannot draw an image onto its own target"));
        }
        Ok(())
    }

    /// Emits one textured quad for `src` of `image`, its corners placed by `place`.
    fn blit_quad(
        &mut self,
        function: &'static str,
        image: ImageId,
        src: Option<Rect>,
        target: TargetId,
        place: impl Fn(Vec2) -> Vec2,
    ) -> GpuResult<()> {
        self.prepare_textured(function, image, target)?;
        let img = self.image(function, image)?;
        let src = src.unwrap_or(Rect::from_size(img.w as f32, img.h as f32));
        let [s0, t0, s1, t1] = img.texcoords(src.x, src.y, src.w, src.h);
        let modulation = self.target(function, target)?.modulation();
        let color = img.color.modulate(modulation).to_f32();

        let corner = |lx: f32, ly: f32, s: f32, t: f32| {
            let p = place(Vec2::new(lx, ly));
            Vertex::new(p.x, p.y, s, t, color)
        };
        let quad = [
            corner(0.0, 0.0, s0, t0),
            corner(src.w, 0.0, s1, t0),
            corner(src.w, src.h, s1, t1),
            corner(0.0, src.h, s0, t1),
        ];
        let key = BatchKey {
            target,
            image: Some(image),
        };
        self.prepare_append(key, 4, 6)?;
        self.batch.append_quad(quad);
        Ok(())
    }

    fn anchor_pivot(&self, function: &'static str, image: ImageId, src: Option<Rect>) -> GpuResult<Vec2> {
        let img = self.image(function, image)?;
        let (w, h) = src.map_or((img.w as f32, img.h as f32), |r| (r.w, r.h));
        Ok(Vec2::new(img.anchor.x * w, img.anchor.y * h))
    }

    fn blit_transformed(
        &mut self,
        function: &'static str,
        image: ImageId,
        src: Option<Rect>,
        target: TargetId,
        transform: QuadTransform,
    ) -> GpuResult<()> {
        self.blit_quad(function, image, src, target, |p| transform.apply(p))
    }

    // ── blit family ───────────────────────────────────────────────────────

    /// Draws `src` of `image` with its anchor at (x, y).
    pub(crate) fn blit(&mut self, image: ImageId, src: Option<Rect>, target: TargetId, x: f32, y: f32) -> GpuResult<()> {
        self.blit_transform("blit", image, src, target, x, y, 0.0, 1.0, 1.0)
    }

    pub(crate) fn blit_rotate(
        &mut self,
        image: ImageId,
        src: Option<Rect>,
        target: TargetId,
        x: f32,
        y: f32,
        degrees: f32,
    ) -> GpuResult<()> {
        self.blit_transform("blit_rotate", image, src, target, x, y, degrees, 1.0, 1.0)
    }

    pub(crate) fn blit_scale(
        &mut self,
        image: ImageId,
        src: Option<Rect>,
        target: TargetId,
        x: f32,
        y: f32,
        scale_x: f32,
        scale_y: f32,
    ) -> GpuResult<()> {
        self.blit_transform("blit_scale", image, src, target, x, y, 0.0, scale_x, scale_y)
    }

    /// Rotation and scale about the image's anchor.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn blit_transform(
        &mut self,
        function: &'static str,
        image: ImageId,
        src: Option<Rect>,
        target: TargetId,
        x: f32,
        y: f32,
        degrees: f32,
        scale_x: f32,
        scale_y: f32,
    ) -> GpuResult<()> {
        let pivot = self.anchor_pivot(function, image, src)?;
        self.blit_transformed(
            function,
            image,
            src,
            target,
            QuadTransform {
                x,
                y,
                pivot,
                degrees,
                scale: Vec2::new(scale_x, scale_y),
            },
        )
    }

    /// Rotation and scale about an explicit pivot (source pixels), which
    /// lands at (x, y).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn blit_transform_x(
        &mut self,
        image: ImageId,
        src: Option<Rect>,
        target: TargetId,
        x: f32,
        y: f32,
        pivot_x: f32,
        pivot_y: f32,
        degrees: f32,
        scale_x: f32,
        scale_y: f32,
    ) -> GpuResult<()> {
        self.blit_transformed(
            "blit_transform_x",
            image,
            src,
            target,
            QuadTransform {
                x,
                y,
                pivot: Vec2::new(pivot_x, pivot_y),
                degrees,
                scale: Vec2::new(scale_x, scale_y),
            },
        )
    }

    /// Corners relative to the anchor go through a column-major 3×3 matrix,
    /// then are offset by (x, y).
    pub(crate) fn blit_transform_matrix(
        &mut self,
        image: ImageId,
        src: Option<Rect>,
        target: TargetId,
        x: f32,
        y: f32,
        matrix: &[f32; 9],
    ) -> GpuResult<()> {
        const FN: &str = "blit_transform_matrix";
        let pivot = self.anchor_pivot(FN, image, src)?;
        let m = *matrix;
        self.blit_quad(FN, image, src, target, |p| {
            let q = apply_mat3(&m, p - pivot);
            Vec2::new(q.x + x, q.y + y)
        })
    }

    /// Stretches `src` over `dest` (the whole target when `None`).
    pub(crate) fn blit_rect(
        &mut self,
        image: ImageId,
        src: Option<Rect>,
        target: TargetId,
        dest: Option<Rect>,
    ) -> GpuResult<()> {
        self.blit_rect_x_named("blit_rect", image, src, target, dest, 0.0, None, FlipFlags::empty())
    }

    /// `blit_rect` with rotation about a pivot (source pixels, `None` for
    /// the center) and mirroring.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn blit_rect_x(
        &mut self,
        image: ImageId,
        src: Option<Rect>,
        target: TargetId,
        dest: Option<Rect>,
        degrees: f32,
        pivot: Option<Vec2>,
        flip: FlipFlags,
    ) -> GpuResult<()> {
        self.blit_rect_x_named("blit_rect_x", image, src, target, dest, degrees, pivot, flip)
    }

    #[allow(clippy::too_many_arguments)]
    fn blit_rect_x_named(
        &mut self,
        function: &'static str,
        image: ImageId,
        src: Option<Rect>,
        target: TargetId,
        dest: Option<Rect>,
        degrees: f32,
        pivot: Option<Vec2>,
        flip: FlipFlags,
    ) -> GpuResult<()> {
        self.prepare_textured(function, image, target)?;
        let img = self.image(function, image)?;
        let src_rect = src.unwrap_or(Rect::from_size(img.w as f32, img.h as f32));
        let dest = match dest {
            Some(d) => d,
            None => self.target(function, target)?.full_rect(),
        };
        if src_rect.w == 0.0 || src_rect.h == 0.0 {
            return Ok(());
        }

        let mut pivot = pivot.unwrap_or(Vec2::new(src_rect.w * 0.5, src_rect.h * 0.5));
        let mut scale = Vec2::new(dest.w / src_rect.w, dest.h / src_rect.h);
        let (mut dx, mut dy) = (dest.x, dest.y);
        if flip.contains(FlipFlags::HORIZONTAL) {
            scale.x = -scale.x;
            dx += dest.w;
            pivot.x = src_rect.w - pivot.x;
        }
        if flip.contains(FlipFlags::VERTICAL) {
            scale.y = -scale.y;
            dy += dest.h;
            pivot.y = src_rect.h - pivot.y;
        }
        self.blit_transformed(
            function,
            image,
            src,
            target,
            QuadTransform {
                x: dx + pivot.x * scale.x,
                y: dy + pivot.y * scale.y,
                pivot,
                degrees,
                scale,
            },
        )
    }

    // ── triangle batches ──────────────────────────────────────────────────

    /// Draws interleaved vertices described by `flags`.
    ///
    /// Without `indices` every three vertices form a triangle. Texture
    /// coordinates are normalized to the texture.
    pub(crate) fn triangle_batch(
        &mut self,
        image: Option<ImageId>,
        target: TargetId,
        values: &[f32],
        indices: Option<&[u32]>,
        flags: BatchFlags,
    ) -> GpuResult<()> {
        const FN: &str = "triangle_batch";
        match image {
            Some(img) => self.prepare_textured(FN, img, target)?,
            None => self.prepare_target(FN, target)?,
        }
        let layout = VertexLayout::from_flags(flags).map_err(|e| GpuError::user(FN, e.to_string()))?;
        let stride = layout.stride();
        if values.len() % stride != 0 {
            return Err(GpuError::user(
                FN,
                format!("{} values do not divide into vertices of {stride}", values.len()),
            ));
        }
        let count = values.len() / stride;
        if count == 0 {
            return Ok(());
        }

        let sequential: Vec<u32>;
        let indices = match indices {
            Some(i) => i,
            None => {
                sequential = (0..(count / 3 * 3) as u32).collect();
                &sequential
            }
        };
        if indices.len() % 3 != 0 {
            return Err(GpuError::user(FN, "index count must be a multiple of 3"));
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= count) {
            return Err(GpuError::user(FN, format!("index {bad} out of range for {count} vertices")));
        }
        if indices.is_empty() {
            return Ok(());
        }

        let modulation = self.target(FN, target)?.modulation();
        let tint = match image {
            Some(img) => self.image(FN, img)?.color.modulate(modulation),
            None => modulation,
        }
        .to_f32();
        let vertices: Vec<Vertex> = values
            .chunks_exact(stride)
            .map(|v| layout.read(v, tint))
            .collect();
        self.emit_triangles(BatchKey { target, image }, &vertices, indices)
    }

    // ── shapes ────────────────────────────────────────────────────────────

    /// Tessellates with the current line thickness and queues the result.
    pub(crate) fn shape(
        &mut self,
        function: &'static str,
        target: TargetId,
        color: Color,
        build: impl FnOnce(f32) -> Tessellation,
    ) -> GpuResult<()> {
        self.prepare_target(function, target)?;
        let tess = build(self.line_thickness);
        if tess.is_empty() {
            return Ok(());
        }
        let modulation = self.target(function, target)?.modulation();
        let c = color.modulate(modulation).to_f32();
        let vertices: Vec<Vertex> = tess
            .vertices
            .iter()
            .map(|p| Vertex::new(p.x, p.y, 0.0, 0.0, c))
            .collect();
        self.emit_triangles(BatchKey { target, image: None }, &vertices, &tess.indices)
    }

    /// Sets the outline width; returns the previous one.
    pub(crate) fn set_line_thickness(&mut self, thickness: f32) -> f32 {
        std::mem::replace(&mut self.line_thickness, thickness.max(0.0))
    }

    pub(crate) fn line_thickness(&self) -> f32 {
        self.line_thickness
    }

    fn update_shape_blend(&mut self, f: impl FnOnce(&mut Self)) -> GpuResult<()> {
        self.flush_if(FlushTrigger::Blend)?;
        f(self);
        Ok(())
    }

    pub(crate) fn set_shape_blending(&mut self, enable: bool) -> GpuResult<()> {
        self.update_shape_blend(|r| r.shapes_use_blending = enable)
    }

    pub(crate) fn set_shape_blend_mode(&mut self, preset: BlendPreset) -> GpuResult<()> {
        self.update_shape_blend(|r| r.shapes_blend_mode = BlendMode::from_preset(preset))
    }

    pub(crate) fn set_shape_blend_function(
        &mut self,
        source_color: BlendFunc,
        dest_color: BlendFunc,
        source_alpha: BlendFunc,
        dest_alpha: BlendFunc,
    ) -> GpuResult<()> {
        self.update_shape_blend(|r| {
            r.shapes_blend_mode =
                r.shapes_blend_mode
                    .with_function(source_color, dest_color, source_alpha, dest_alpha)
        })
    }

    pub(crate) fn set_shape_blend_equation(&mut self, color_equation: BlendEq, alpha_equation: BlendEq) -> GpuResult<()> {
        self.update_shape_blend(|r| {
            r.shapes_blend_mode = r.shapes_blend_mode.with_equation(color_equation, alpha_equation)
        })
    }

    // ── clear / flip / readback ───────────────────────────────────────────

    /// Fills the target (its clip rect when clipping) with `color`.
    pub(crate) fn clear(&mut self, target: TargetId, color: Color) -> GpuResult<()> {
        const FN: &str = "clear";
        self.prepare_target(FN, target)?;
        self.flush_if(FlushTrigger::ClearOrFlip)?;
        let t = self.target(FN, target)?;
        let (surface, scissor) = (t.surface, coords::surface_scissor(t));
        if scissor.is_some_and(|s| s.w == 0 || s.h == 0) {
            return Ok(());
        }
        self.backend
            .clear(surface, color.to_f32(), scissor)
            .map_err(|e| GpuError::backend(FN, e))
    }

    /// Draws pending geometry and presents window targets.
    pub(crate) fn flip(&mut self, target: TargetId) -> GpuResult<()> {
        const FN: &str = "flip";
        self.prepare_target(FN, target)?;
        self.flush_if(FlushTrigger::ClearOrFlip)?;
        let t = self.target(FN, target)?;
        if t.window_id().is_none() {
            return Ok(());
        }
        let surface = t.surface;
        self.backend
            .present(surface)
            .map_err(|e| GpuError::backend(FN, e))
    }

    pub(crate) fn flush_blit_buffer(&mut self) -> GpuResult<()> {
        self.flush_if(FlushTrigger::Explicit)
    }

    /// Color of the logical pixel at (x, y); transparent outside the target.
    pub(crate) fn get_pixel(&mut self, target: TargetId, x: f32, y: f32) -> GpuResult<Color> {
        const FN: &str = "get_pixel";
        self.target(FN, target)?;
        self.require(FN, super::Features::READBACK)?;
        self.flush_if(FlushTrigger::TargetState(target))?;
        let t = self.target(FN, target)?;
        let Some((px, row)) = coords::surface_pixel(t, x, y) else {
            return Ok(Color::TRANSPARENT);
        };
        let surface = t.surface;
        let rgba = self
            .backend
            .read_pixel(surface, px, row)
            .map_err(|e| GpuError::backend(FN, e))?;
        Ok(Color::from_array(rgba))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quad_transform_pivots_then_offsets() {
        let t = QuadTransform {
            x: 50.0,
            y: 50.0,
            pivot: Vec2::new(5.0, 5.0),
            degrees: 0.0,
            scale: Vec2::new(2.0, 2.0),
        };
        assert_eq!(t.apply(Vec2::new(0.0, 0.0)), Vec2::new(40.0, 40.0));
        assert_eq!(t.apply(Vec2::new(10.0, 10.0)), Vec2::new(60.0, 60.0));
    }

    #[test]
    fn quad_rotation_is_clockwise_on_screen() {
        let t = QuadTransform {
            x: 0.0,
            y: 0.0,
            pivot: Vec2::zero(),
            degrees: 90.0,
            scale: Vec2::new(1.0, 1.0),
        };
        // +x turns towards +y, which points down in client space.
        let p = t.apply(Vec2::new(1.0, 0.0));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn mat3_is_column_major() {
        // Translation by (3, 4) lives in the third column.
        let m = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 3.0, 4.0, 1.0];
        assert_eq!(apply_mat3(&m, Vec2::new(1.0, 1.0)), Vec2::new(4.0, 5.0));
    }
}
