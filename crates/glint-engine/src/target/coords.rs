//! Logical → surface conversions for render targets.
//!
//! Surface space follows the GL convention: NDC y = -1 lands on surface
//! row 0, which is the bottom row of a window and the first memory row of
//! a texture. Client space is top-left origin on every target, so window
//! targets flip rectangles here and image targets flip the projection in
//! [`device_transform`]. No other code adjusts the Y axis.

use crate::coords::Rect;
use crate::matrix::Mat4;
use crate::renderer::{PixelRect, SurfaceViewport};

use super::RenderTarget;

/// Physical pixels per logical pixel, per axis.
#[inline]
pub fn scale_factors(target: &RenderTarget) -> (f32, f32) {
    (
        target.base_w as f32 / target.w.max(1) as f32,
        target.base_h as f32 / target.h.max(1) as f32,
    )
}

/// Final transform handed to the backend for `target`.
///
/// Image-backed targets store their top logical row first in memory, so
/// their NDC y is negated.
pub fn device_transform(target: &RenderTarget, mvp: Mat4) -> Mat4 {
    if target.flips_y() {
        let mut m = mvp;
        m.0[1] = -m.0[1];
        m.0[5] = -m.0[5];
        m.0[9] = -m.0[9];
        m.0[13] = -m.0[13];
        m
    } else {
        mvp
    }
}

/// Converts a logical rectangle to surface space without clamping.
fn to_surface(target: &RenderTarget, rect: Rect) -> Rect {
    let (sx, sy) = scale_factors(target);
    let r = rect.normalized().scaled(sx, sy);
    if target.flips_y() {
        r
    } else {
        Rect::new(r.x, target.base_h as f32 - (r.y + r.h), r.w, r.h)
    }
}

/// Viewport in surface space.
pub fn surface_viewport(target: &RenderTarget) -> SurfaceViewport {
    let r = to_surface(target, target.viewport);
    SurfaceViewport {
        x: r.x,
        y: r.y,
        w: r.w,
        h: r.h,
    }
}

/// Scissor for `logical` clamped to the surface; empty clips stay empty.
pub fn surface_rect(target: &RenderTarget, logical: Rect) -> PixelRect {
    let r = to_surface(target, logical);
    let bw = target.base_w as f32;
    let bh = target.base_h as f32;
    let x0 = r.x.round().clamp(0.0, bw);
    let y0 = r.y.round().clamp(0.0, bh);
    let x1 = (r.x + r.w).round().clamp(0.0, bw);
    let y1 = (r.y + r.h).round().clamp(0.0, bh);
    PixelRect::new(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
}

/// Active scissor of `target`, if clipping is enabled.
pub fn surface_scissor(target: &RenderTarget) -> Option<PixelRect> {
    target.use_clip.then(|| surface_rect(target, target.clip))
}

/// Surface coordinates of the logical pixel at (x, y), or `None` outside.
pub fn surface_pixel(target: &RenderTarget, x: f32, y: f32) -> Option<(u32, u32)> {
    let (sx, sy) = scale_factors(target);
    let px = (x * sx).floor();
    let py = (y * sy).floor();
    if px < 0.0 || py < 0.0 || px >= target.base_w as f32 || py >= target.base_h as f32 {
        return None;
    }
    let (px, py) = (px as u32, py as u32);
    let row = if target.flips_y() {
        py
    } else {
        target.base_h - 1 - py
    };
    Some((px, row))
}

/// Reorders surface rows (row 0 first) into top-row-first order.
pub fn rows_top_first(target: &RenderTarget, mut rgba: Vec<u8>) -> Vec<u8> {
    if !target.flips_y() {
        let row = target.base_w as usize * 4;
        if row > 0 {
            let rows: Vec<&[u8]> = rgba.chunks_exact(row).rev().collect();
            rgba = rows.concat();
        }
    }
    rgba
}

/// Maps a point in physical (display) pixels to logical coordinates.
pub fn virtual_coords(target: &RenderTarget, display_x: f32, display_y: f32) -> (f32, f32) {
    let (sx, sy) = scale_factors(target);
    (display_x / sx, display_y / sy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HandleAllocator;
    use crate::renderer::SurfaceHandle;
    use crate::target::TargetKind;
    use approx::assert_relative_eq;

    fn window(w: u32, h: u32) -> RenderTarget {
        RenderTarget::new(SurfaceHandle(1), TargetKind::Window { window_id: 1 }, w, h, 64)
    }

    fn image_target(w: u32, h: u32) -> RenderTarget {
        let image = HandleAllocator::default().image();
        RenderTarget::new(SurfaceHandle(2), TargetKind::Image(image), w, h, 64)
    }

    // ── scissor ───────────────────────────────────────────────────────────

    #[test]
    fn window_scissor_flips_origin() {
        let t = window(100, 80);
        let r = surface_rect(&t, Rect::new(10.0, 5.0, 20.0, 15.0));
        assert_eq!(r, PixelRect::new(10, 80 - 20, 20, 15));
    }

    #[test]
    fn image_scissor_is_direct() {
        let t = image_target(100, 80);
        let r = surface_rect(&t, Rect::new(10.0, 5.0, 20.0, 15.0));
        assert_eq!(r, PixelRect::new(10, 5, 20, 15));
    }

    #[test]
    fn virtual_resolution_scales_scissor() {
        let mut t = window(200, 100);
        t.set_logical_size(100, 50);
        let r = surface_rect(&t, Rect::new(10.0, 10.0, 10.0, 10.0));
        assert_eq!(r, PixelRect::new(20, 100 - 40, 20, 20));
    }

    #[test]
    fn scissor_is_clamped_to_surface() {
        let t = image_target(10, 10);
        let r = surface_rect(&t, Rect::new(-5.0, 8.0, 20.0, 20.0));
        assert_eq!(r, PixelRect::new(0, 8, 10, 2));
    }

    // ── viewport / pixels ─────────────────────────────────────────────────

    #[test]
    fn default_viewport_covers_surface() {
        let t = window(64, 32);
        let v = surface_viewport(&t);
        assert_eq!((v.x, v.y, v.w, v.h), (0.0, 0.0, 64.0, 32.0));
    }

    #[test]
    fn surface_pixel_rows() {
        let w = window(10, 10);
        assert_eq!(surface_pixel(&w, 0.0, 0.0), Some((0, 9)));
        let i = image_target(10, 10);
        assert_eq!(surface_pixel(&i, 3.0, 2.0), Some((3, 2)));
        assert_eq!(surface_pixel(&i, 10.0, 0.0), None);
    }

    #[test]
    fn rows_top_first_reverses_window_rows() {
        let w = window(1, 2);
        assert_eq!(rows_top_first(&w, vec![1, 1, 1, 1, 2, 2, 2, 2]), vec![2, 2, 2, 2, 1, 1, 1, 1]);
        let i = image_target(1, 2);
        assert_eq!(rows_top_first(&i, vec![1, 1, 1, 1, 2, 2, 2, 2]), vec![1, 1, 1, 1, 2, 2, 2, 2]);
    }

    // ── transforms ────────────────────────────────────────────────────────

    #[test]
    fn device_transform_flips_image_targets_only() {
        let m = Mat4::translation(0.0, 0.5, 0.0);
        assert_eq!(device_transform(&window(4, 4), m), m);
        let flipped = device_transform(&image_target(4, 4), m);
        let p = flipped.transform_point([0.0, 0.0, 0.0]);
        assert_relative_eq!(p[1], -0.5);
    }

    #[test]
    fn virtual_coords_round_trip() {
        let mut t = window(800, 600);
        t.set_logical_size(400, 300);
        let (x, y) = virtual_coords(&t, 200.0, 100.0);
        assert_relative_eq!(x, 100.0);
        assert_relative_eq!(y, 50.0);
        let (sx, sy) = scale_factors(&t);
        assert_relative_eq!(x * sx, 200.0);
        assert_relative_eq!(y * sy, 100.0);
    }
}
