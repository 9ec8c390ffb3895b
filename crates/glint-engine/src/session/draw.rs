use crate::batch::BatchFlags;
use crate::coords::{Rect, Vec2};
use crate::handle::{ImageId, TargetId};
use crate::paint::{BlendEq, BlendFunc, BlendPreset, Color};
use crate::renderer::FlipFlags;
use crate::shapes;

use super::Session;

impl Session {
    // ── blits ─────────────────────────────────────────────────────────────

    /// Draws `src` of `image` (the whole image when `None`) with its anchor
    /// at (x, y).
    pub fn blit(&mut self, image: ImageId, src: Option<Rect>, target: TargetId, x: f32, y: f32) {
        self.dispatch("blit", |r| r.blit(image, src, target, x, y));
    }

    /// Rotated by `degrees` (clockwise on screen) about the anchor.
    pub fn blit_rotate(&mut self, image: ImageId, src: Option<Rect>, target: TargetId, x: f32, y: f32, degrees: f32) {
        self.dispatch("blit_rotate", |r| r.blit_rotate(image, src, target, x, y, degrees));
    }

    pub fn blit_scale(
        &mut self,
        image: ImageId,
        src: Option<Rect>,
        target: TargetId,
        x: f32,
        y: f32,
        scale_x: f32,
        scale_y: f32,
    ) {
        self.dispatch("blit_scale", |r| {
            r.blit_scale(image, src, target, x, y, scale_x, scale_y)
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn blit_transform(
        &mut self,
        image: ImageId,
        src: Option<Rect>,
        target: TargetId,
        x: f32,
        y: f32,
        degrees: f32,
        scale_x: f32,
        scale_y: f32,
    ) {
        self.dispatch("blit_transform", |r| {
            r.blit_transform("blit_transform", image, src, target, x, y, degrees, scale_x, scale_y)
        });
    }

    /// Rotation and scale about (pivot_x, pivot_y), given in source pixels;
    /// the pivot lands on (x, y).
    #[allow(clippy::too_many_arguments)]
    pub fn blit_transform_x(
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
    ) {
        self.dispatch("blit_transform_x", |r| {
            r.blit_transform_x(image, src, target, x, y, pivot_x, pivot_y, degrees, scale_x, scale_y)
        });
    }

    /// `matrix` is a column-major 3×3 transform applied around the anchor.
    pub fn blit_transform_matrix(
        &mut self,
        image: ImageId,
        src: Option<Rect>,
        target: TargetId,
        x: f32,
        y: f32,
        matrix: &[f32; 9],
    ) {
        self.dispatch("blit_transform_matrix", |r| {
            r.blit_transform_matrix(image, src, target, x, y, matrix)
        });
    }

    /// Stretches `src` over `dest` (the whole target when `None`).
    pub fn blit_rect(&mut self, image: ImageId, src: Option<Rect>, target: TargetId, dest: Option<Rect>) {
        self.dispatch("blit_rect", |r| r.blit_rect(image, src, target, dest));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn blit_rect_x(
        &mut self,
        image: ImageId,
        src: Option<Rect>,
        target: TargetId,
        dest: Option<Rect>,
        degrees: f32,
        pivot: Option<Vec2>,
        flip: FlipFlags,
    ) {
        self.dispatch("blit_rect_x", |r| {
            r.blit_rect_x(image, src, target, dest, degrees, pivot, flip)
        });
    }

    /// Interleaved vertices laid out per `flags`; `indices: None` draws
    /// consecutive triples.
    pub fn triangle_batch(
        &mut self,
        image: Option<ImageId>,
        target: TargetId,
        values: &[f32],
        indices: Option<&[u32]>,
        flags: BatchFlags,
    ) {
        self.dispatch("triangle_batch", |r| {
            r.triangle_batch(image, target, values, indices, flags)
        });
    }

    /// Draws everything buffered so far.
    pub fn flush_blit_buffer(&mut self) {
        self.dispatch("flush_blit_buffer", |r| r.flush_blit_buffer());
    }

    // ── clear / flip / readback ───────────────────────────────────────────

    /// Clears to transparent black.
    pub fn clear(&mut self, target: TargetId) {
        self.clear_color(target, Color::TRANSPARENT);
    }

    pub fn clear_color(&mut self, target: TargetId, color: Color) {
        self.dispatch("clear", |r| r.clear(target, color));
    }

    pub fn clear_rgba(&mut self, target: TargetId, r: u8, g: u8, b: u8, a: u8) {
        self.clear_color(target, Color::rgba(r, g, b, a));
    }

    /// Finishes the frame: flushes and presents window targets.
    pub fn flip(&mut self, target: TargetId) {
        self.dispatch("flip", |r| r.flip(target));
    }

    /// Color at a logical pixel; transparent black when outside the target
    /// or on failure.
    pub fn get_pixel(&mut self, target: TargetId, x: i32, y: i32) -> Color {
        self.dispatch("get_pixel", |r| r.get_pixel(target, x as f32, y as f32))
            .unwrap_or(Color::TRANSPARENT)
    }

    // ── shape state ───────────────────────────────────────────────────────

    /// Outline width for shapes; returns the previous width.
    pub fn set_line_thickness(&mut self, thickness: f32) -> f32 {
        self.dispatch_infallible("set_line_thickness", |r| r.set_line_thickness(thickness))
            .unwrap_or(1.0)
    }

    pub fn line_thickness(&self) -> f32 {
        self.current_renderer().map_or(1.0, |r| r.line_thickness())
    }

    pub fn set_shape_blending(&mut self, enable: bool) {
        self.dispatch("set_shape_blending", |r| r.set_shape_blending(enable));
    }

    pub fn set_shape_blend_mode(&mut self, preset: BlendPreset) {
        self.dispatch("set_shape_blend_mode", |r| r.set_shape_blend_mode(preset));
    }

    pub fn set_shape_blend_function(
        &mut self,
        source_color: BlendFunc,
        dest_color: BlendFunc,
        source_alpha: BlendFunc,
        dest_alpha: BlendFunc,
    ) {
        self.dispatch("set_shape_blend_function", |r| {
            r.set_shape_blend_function(source_color, dest_color, source_alpha, dest_alpha)
        });
    }

    pub fn set_shape_blend_equation(&mut self, color_equation: BlendEq, alpha_equation: BlendEq) {
        self.dispatch("set_shape_blend_equation", |r| {
            r.set_shape_blend_equation(color_equation, alpha_equation)
        });
    }

    // ── shapes ────────────────────────────────────────────────────────────

    pub fn pixel(&mut self, target: TargetId, x: f32, y: f32, color: Color) {
        self.dispatch("pixel", |r| r.shape("pixel", target, color, |_| shapes::pixel(x, y)));
    }

    pub fn line(&mut self, target: TargetId, x1: f32, y1: f32, x2: f32, y2: f32, color: Color) {
        self.dispatch("line", |r| {
            r.shape("line", target, color, |t| {
                shapes::line(Vec2::new(x1, y1), Vec2::new(x2, y2), t)
            })
        });
    }

    /// Arc from `start_angle` to `end_angle` (degrees, clockwise from +x).
    #[allow(clippy::too_many_arguments)]
    pub fn arc(&mut self, target: TargetId, x: f32, y: f32, radius: f32, start_angle: f32, end_angle: f32, color: Color) {
        self.dispatch("arc", |r| {
            r.shape("arc", target, color, |t| {
                shapes::arc(Vec2::new(x, y), radius, start_angle, end_angle, t)
            })
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn arc_filled(
        &mut self,
        target: TargetId,
        x: f32,
        y: f32,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        color: Color,
    ) {
        self.dispatch("arc_filled", |r| {
            r.shape("arc_filled", target, color, |_| {
                shapes::arc_filled(Vec2::new(x, y), radius, start_angle, end_angle)
            })
        });
    }

    pub fn circle(&mut self, target: TargetId, x: f32, y: f32, radius: f32, color: Color) {
        self.dispatch("circle", |r| {
            r.shape("circle", target, color, |t| shapes::circle(Vec2::new(x, y), radius, t))
        });
    }

    pub fn circle_filled(&mut self, target: TargetId, x: f32, y: f32, radius: f32, color: Color) {
        self.dispatch("circle_filled", |r| {
            r.shape("circle_filled", target, color, |_| {
                shapes::circle_filled(Vec2::new(x, y), radius)
            })
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn ellipse(&mut self, target: TargetId, x: f32, y: f32, rx: f32, ry: f32, degrees: f32, color: Color) {
        self.dispatch("ellipse", |r| {
            r.shape("ellipse", target, color, |t| {
                shapes::ellipse(Vec2::new(x, y), rx, ry, degrees, t)
            })
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn ellipse_filled(&mut self, target: TargetId, x: f32, y: f32, rx: f32, ry: f32, degrees: f32, color: Color) {
        self.dispatch("ellipse_filled", |r| {
            r.shape("ellipse_filled", target, color, |_| {
                shapes::ellipse_filled(Vec2::new(x, y), rx, ry, degrees)
            })
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn sector(
        &mut self,
        target: TargetId,
        x: f32,
        y: f32,
        inner_radius: f32,
        outer_radius: f32,
        start_angle: f32,
        end_angle: f32,
        color: Color,
    ) {
        self.dispatch("sector", |r| {
            r.shape("sector", target, color, |t| {
                shapes::sector(Vec2::new(x, y), inner_radius, outer_radius, start_angle, end_angle, t)
            })
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn sector_filled(
        &mut self,
        target: TargetId,
        x: f32,
        y: f32,
        inner_radius: f32,
        outer_radius: f32,
        start_angle: f32,
        end_angle: f32,
        color: Color,
    ) {
        self.dispatch("sector_filled", |r| {
            r.shape("sector_filled", target, color, |_| {
                shapes::sector_filled(Vec2::new(x, y), inner_radius, outer_radius, start_angle, end_angle)
            })
        });
    }

    pub fn tri(&mut self, target: TargetId, a: Vec2, b: Vec2, c: Vec2, color: Color) {
        self.dispatch("tri", |r| r.shape("tri", target, color, |t| shapes::tri(a, b, c, t)));
    }

    pub fn tri_filled(&mut self, target: TargetId, a: Vec2, b: Vec2, c: Vec2, color: Color) {
        self.dispatch("tri_filled", |r| {
            r.shape("tri_filled", target, color, |_| shapes::tri_filled(a, b, c))
        });
    }

    pub fn rectangle(&mut self, target: TargetId, rect: Rect, color: Color) {
        self.dispatch("rectangle", |r| {
            r.shape("rectangle", target, color, |t| shapes::rectangle(rect, t))
        });
    }

    pub fn rectangle_filled(&mut self, target: TargetId, rect: Rect, color: Color) {
        self.dispatch("rectangle_filled", |r| {
            r.shape("rectangle_filled", target, color, |_| shapes::rectangle_filled(rect))
        });
    }

    pub fn rectangle_round(&mut self, target: TargetId, rect: Rect, radius: f32, color: Color) {
        self.dispatch("rectangle_round", |r| {
            r.shape("rectangle_round", target, color, |t| {
                shapes::rectangle_round(rect, radius, t)
            })
        });
    }

    pub fn rectangle_round_filled(&mut self, target: TargetId, rect: Rect, radius: f32, color: Color) {
        self.dispatch("rectangle_round_filled", |r| {
            r.shape("rectangle_round_filled", target, color, |_| {
                shapes::rectangle_round_filled(rect, radius)
            })
        });
    }

    pub fn polygon(&mut self, target: TargetId, points: &[Vec2], color: Color) {
        self.dispatch("polygon", |r| {
            r.shape("polygon", target, color, |t| shapes::polygon(points, t))
        });
    }

    /// Convex polygons only.
    pub fn polygon_filled(&mut self, target: TargetId, points: &[Vec2], color: Color) {
        self.dispatch("polygon_filled", |r| {
            r.shape("polygon_filled", target, color, |_| shapes::polygon_filled(points))
        });
    }

    pub fn polyline(&mut self, target: TargetId, points: &[Vec2], color: Color, close_loop: bool) {
        self.dispatch("polyline", |r| {
            r.shape("polyline", target, color, |t| shapes::polyline(points, t, close_loop))
        });
    }
}
