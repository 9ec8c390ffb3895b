use std::f32::consts::{FRAC_PI_2, PI};

use crate::coords::{Rect, Vec2};

use super::{Tessellation, angle_step};

/// One logical pixel with its top-left corner at (x, y).
pub fn pixel(x: f32, y: f32) -> Tessellation {
    rectangle_filled(Rect::new(x, y, 1.0, 1.0))
}

/// Segment from `a` to `b`, `thickness` wide, without caps.
pub fn line(a: Vec2, b: Vec2, thickness: f32) -> Tessellation {
    let mut t = Tessellation::new();
    push_segment(&mut t, a, b, thickness);
    t
}

fn push_segment(t: &mut Tessellation, a: Vec2, b: Vec2, thickness: f32) {
    let dir = (b - a).normalized();
    if dir == Vec2::zero() || thickness <= 0.0 {
        return;
    }
    let n = dir.perp() * (thickness * 0.5);
    t.quad(a + n, b + n, b - n, a - n);
}

/// Connected segments; `closed` joins the last point back to the first.
pub fn polyline(points: &[Vec2], thickness: f32, closed: bool) -> Tessellation {
    let mut t = Tessellation::new();
    for pair in points.windows(2) {
        push_segment(&mut t, pair[0], pair[1], thickness);
    }
    if closed && points.len() > 2 {
        push_segment(&mut t, points[points.len() - 1], points[0], thickness);
    }
    t
}

pub fn tri(a: Vec2, b: Vec2, c: Vec2, thickness: f32) -> Tessellation {
    polyline(&[a, b, c], thickness, true)
}

pub fn tri_filled(a: Vec2, b: Vec2, c: Vec2) -> Tessellation {
    let mut t = Tessellation::new();
    let i = t.push(a);
    t.push(b);
    t.push(c);
    t.indices.extend_from_slice(&[i, i + 1, i + 2]);
    t
}

fn corners(r: Rect) -> [Vec2; 4] {
    [
        Vec2::new(r.x, r.y),
        Vec2::new(r.x + r.w, r.y),
        Vec2::new(r.x + r.w, r.y + r.h),
        Vec2::new(r.x, r.y + r.h),
    ]
}

/// Outline centred on the rectangle's edges.
pub fn rectangle(rect: Rect, thickness: f32) -> Tessellation {
    let rect = rect.normalized();
    let half = thickness * 0.5;
    let outer = Rect::new(rect.x - half, rect.y - half, rect.w + thickness, rect.h + thickness);
    if thickness >= rect.w || thickness >= rect.h {
        return rectangle_filled(outer);
    }
    let inner = Rect::new(rect.x + half, rect.y + half, rect.w - thickness, rect.h - thickness);
    let mut t = Tessellation::new();
    t.band(&corners(outer), &corners(inner), true);
    t
}

pub fn rectangle_filled(rect: Rect) -> Tessellation {
    let rect = rect.normalized();
    let mut t = Tessellation::new();
    if rect.is_empty() {
        return t;
    }
    let [a, b, c, d] = corners(rect);
    t.quad(a, b, c, d);
    t
}

/// Corner-arc centres of a rounded rectangle paired with each arc's start angle.
fn round_corners(rect: Rect, radius: f32) -> [(Vec2, f32); 4] {
    let (l, t) = (rect.x + radius, rect.y + radius);
    let (r, b) = (rect.x + rect.w - radius, rect.y + rect.h - radius);
    [
        (Vec2::new(l, t), PI),
        (Vec2::new(r, t), PI + FRAC_PI_2),
        (Vec2::new(r, b), 0.0),
        (Vec2::new(l, b), FRAC_PI_2),
    ]
}

/// Rim of the rounded rectangle offset outwards by `offset` from the
/// corner radius.
fn round_rim(rect: Rect, radius: f32, offset: f32) -> Vec<Vec2> {
    let steps = ((FRAC_PI_2 / angle_step(radius)).ceil() as usize).max(1);
    let r = (radius + offset).max(0.0);
    let mut rim = Vec::with_capacity(4 * (steps + 1));
    for (center, start) in round_corners(rect, radius) {
        for k in 0..=steps {
            let a = start + FRAC_PI_2 * k as f32 / steps as f32;
            rim.push(Vec2::new(center.x + r * a.cos(), center.y + r * a.sin()));
        }
    }
    rim
}

fn clamp_radius(rect: Rect, radius: f32) -> f32 {
    radius.max(0.0).min(rect.w.min(rect.h) * 0.5)
}

pub fn rectangle_round(rect: Rect, radius: f32, thickness: f32) -> Tessellation {
    let rect = rect.normalized();
    let radius = clamp_radius(rect, radius);
    if radius == 0.0 {
        return rectangle(rect, thickness);
    }
    let half = thickness * 0.5;
    let mut t = Tessellation::new();
    t.band(&round_rim(rect, radius, half), &round_rim(rect, radius, -half), true);
    t
}

pub fn rectangle_round_filled(rect: Rect, radius: f32) -> Tessellation {
    let rect = rect.normalized();
    let radius = clamp_radius(rect, radius);
    if radius == 0.0 {
        return rectangle_filled(rect);
    }
    let mut t = Tessellation::new();
    t.fan(rect.center(), &round_rim(rect, radius, 0.0), true);
    t
}

pub fn polygon(points: &[Vec2], thickness: f32) -> Tessellation {
    polyline(points, thickness, true)
}

/// Fan from the first vertex; exact for convex polygons.
pub fn polygon_filled(points: &[Vec2]) -> Tessellation {
    let mut t = Tessellation::new();
    if points.len() < 3 {
        return t;
    }
    let base = t.push(points[0]);
    for &p in &points[1..] {
        t.push(p);
    }
    for k in 1..points.len() as u32 - 1 {
        t.indices.extend_from_slice(&[base, base + k, base + k + 1]);
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(t: &Tessellation) -> f32 {
        t.indices
            .chunks_exact(3)
            .map(|tri| {
                let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| t.vertices[i as usize]);
                ((b - a).cross(c - a) * 0.5).abs()
            })
            .sum()
    }

    #[test]
    fn line_is_a_quad_of_length_by_thickness() {
        let t = line(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), 2.0);
        assert_eq!(t.triangle_count(), 2);
        assert!((area(&t) - 20.0).abs() < 1e-4);
        assert!(line(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0), 2.0).is_empty());
    }

    #[test]
    fn pixel_covers_one_unit() {
        let t = pixel(3.0, 4.0);
        assert_eq!(t.vertices[0], Vec2::new(3.0, 4.0));
        assert!((area(&t) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rectangle_outline_area() {
        // 10x10 with thickness 2: 12x12 outer minus 8x8 inner.
        let t = rectangle(Rect::new(0.0, 0.0, 10.0, 10.0), 2.0);
        assert!((area(&t) - (144.0 - 64.0)).abs() < 1e-3);
    }

    #[test]
    fn thick_outline_falls_back_to_fill() {
        let t = rectangle(Rect::new(0.0, 0.0, 2.0, 2.0), 4.0);
        assert_eq!(t.triangle_count(), 2);
    }

    #[test]
    fn rounded_rect_fill_is_smaller_than_box() {
        let r = Rect::new(0.0, 0.0, 20.0, 10.0);
        let full = area(&rectangle_filled(r));
        let rounded = area(&rectangle_round_filled(r, 4.0));
        assert!(rounded < full);
        // Lose at most the four corner squares outside the arcs.
        assert!(rounded > full - 4.0 * 16.0 * (1.0 - std::f32::consts::FRAC_PI_4) - 4.0);
    }

    #[test]
    fn polygon_fan_triangle_count() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
            Vec2::new(-2.0, 2.0),
        ];
        let t = polygon_filled(&pts);
        assert_eq!(t.triangle_count(), 3);
        assert!((area(&t) - 20.0).abs() < 1e-4);
        assert!(polygon_filled(&pts[..2]).is_empty());
    }

    #[test]
    fn closed_polyline_adds_a_segment() {
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(4.0, 4.0)];
        assert_eq!(polyline(&pts, 1.0, false).triangle_count(), 4);
        assert_eq!(polyline(&pts, 1.0, true).triangle_count(), 6);
    }
}
