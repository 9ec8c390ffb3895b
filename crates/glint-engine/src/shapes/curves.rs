use std::f32::consts::TAU;

use crate::coords::Vec2;

use super::polygons::line;
use super::{Tessellation, angle_step, ellipse_point};

#[derive(Debug, Copy, Clone, PartialEq)]
enum Sweep {
    Empty,
    Full,
    Partial { start: f32, radians: f32 },
}

/// Arcs always run from the smaller angle to the larger one.
fn sweep(start_deg: f32, end_deg: f32) -> Sweep {
    let (a, b) = if start_deg > end_deg {
        (end_deg, start_deg)
    } else {
        (start_deg, end_deg)
    };
    if a == b {
        Sweep::Empty
    } else if b - a >= 360.0 {
        Sweep::Full
    } else {
        Sweep::Partial {
            start: a.to_radians(),
            radians: (b - a).to_radians(),
        }
    }
}

fn segments(radians: f32, radius: f32, min: usize) -> usize {
    ((radians.abs() / angle_step(radius)).ceil() as usize).max(min)
}

/// `segments + 1` points along an elliptic arc (endpoints included).
fn arc_points(center: Vec2, rx: f32, ry: f32, rotation: f32, start: f32, radians: f32) -> Vec<Vec2> {
    let n = segments(radians, rx.max(ry), 1);
    (0..=n)
        .map(|k| ellipse_point(center, rx, ry, rotation, start + radians * k as f32 / n as f32))
        .collect()
}

/// `segments` points around a full ellipse (no duplicate seam point).
fn ring_points(center: Vec2, rx: f32, ry: f32, rotation: f32) -> Vec<Vec2> {
    let n = segments(TAU, rx.max(ry), 8);
    (0..n)
        .map(|k| ellipse_point(center, rx, ry, rotation, TAU * k as f32 / n as f32))
        .collect()
}

fn ring(center: Vec2, rx: f32, ry: f32, rotation: f32, thickness: f32) -> Tessellation {
    let half = thickness * 0.5;
    let n = segments(TAU, rx.max(ry) + half, 8);
    let mut outer = Vec::with_capacity(n);
    let mut inner = Vec::with_capacity(n);
    for k in 0..n {
        let a = TAU * k as f32 / n as f32;
        outer.push(ellipse_point(center, rx + half, ry + half, rotation, a));
        inner.push(ellipse_point(center, (rx - half).max(0.0), (ry - half).max(0.0), rotation, a));
    }
    let mut t = Tessellation::new();
    t.band(&outer, &inner, true);
    t
}

fn disc(center: Vec2, rx: f32, ry: f32, rotation: f32) -> Tessellation {
    let mut t = Tessellation::new();
    t.fan(center, &ring_points(center, rx, ry, rotation), true);
    t
}

/// Band between two concentric arcs of the same sweep.
fn arc_band(center: Vec2, outer_r: f32, inner_r: f32, start: f32, radians: f32) -> Tessellation {
    let outer = arc_points(center, outer_r, outer_r, 0.0, start, radians);
    let n = outer.len() - 1;
    let inner: Vec<Vec2> = (0..=n)
        .map(|k| ellipse_point(center, inner_r, inner_r, 0.0, start + radians * k as f32 / n as f32))
        .collect();
    let mut t = Tessellation::new();
    t.band(&outer, &inner, false);
    t
}

pub fn arc(center: Vec2, radius: f32, start_deg: f32, end_deg: f32, thickness: f32) -> Tessellation {
    if radius <= 0.0 {
        return Tessellation::new();
    }
    let half = thickness * 0.5;
    match sweep(start_deg, end_deg) {
        Sweep::Empty => Tessellation::new(),
        Sweep::Full => circle(center, radius, thickness),
        Sweep::Partial { start, radians } => {
            arc_band(center, radius + half, (radius - half).max(0.0), start, radians)
        }
    }
}

/// Pie slice between the two angles.
pub fn arc_filled(center: Vec2, radius: f32, start_deg: f32, end_deg: f32) -> Tessellation {
    if radius <= 0.0 {
        return Tessellation::new();
    }
    match sweep(start_deg, end_deg) {
        Sweep::Empty => Tessellation::new(),
        Sweep::Full => circle_filled(center, radius),
        Sweep::Partial { start, radians } => {
            let mut t = Tessellation::new();
            t.fan(center, &arc_points(center, radius, radius, 0.0, start, radians), false);
            t
        }
    }
}

pub fn circle(center: Vec2, radius: f32, thickness: f32) -> Tessellation {
    if radius <= 0.0 {
        return Tessellation::new();
    }
    ring(center, radius, radius, 0.0, thickness)
}

pub fn circle_filled(center: Vec2, radius: f32) -> Tessellation {
    if radius <= 0.0 {
        return Tessellation::new();
    }
    disc(center, radius, radius, 0.0)
}

/// Ellipse with radii (rx, ry), rotated by `degrees` about its center.
pub fn ellipse(center: Vec2, rx: f32, ry: f32, degrees: f32, thickness: f32) -> Tessellation {
    if rx <= 0.0 || ry <= 0.0 {
        return Tessellation::new();
    }
    ring(center, rx, ry, degrees, thickness)
}

pub fn ellipse_filled(center: Vec2, rx: f32, ry: f32, degrees: f32) -> Tessellation {
    if rx <= 0.0 || ry <= 0.0 {
        return Tessellation::new();
    }
    disc(center, rx, ry, degrees)
}

fn ordered_radii(inner: f32, outer: f32) -> (f32, f32) {
    let (a, b) = (inner.max(0.0), outer.max(0.0));
    if a > b { (b, a) } else { (a, b) }
}

/// Outline of an annular sector.
pub fn sector(
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    start_deg: f32,
    end_deg: f32,
    thickness: f32,
) -> Tessellation {
    let (inner_r, outer_r) = ordered_radii(inner_radius, outer_radius);
    if outer_r <= 0.0 {
        return Tessellation::new();
    }
    let mut t = arc(center, outer_r, start_deg, end_deg, thickness);
    if inner_r > 0.0 {
        t.append(arc(center, inner_r, start_deg, end_deg, thickness));
    }
    if let Sweep::Partial { start, radians } = sweep(start_deg, end_deg) {
        for a in [start, start + radians] {
            let dir = Vec2::new(a.cos(), a.sin());
            t.append(line(center + dir * inner_r, center + dir * outer_r, thickness));
        }
    }
    t
}

/// Filled annular sector; an inner radius of zero gives a pie slice.
pub fn sector_filled(
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    start_deg: f32,
    end_deg: f32,
) -> Tessellation {
    let (inner_r, outer_r) = ordered_radii(inner_radius, outer_radius);
    if outer_r <= 0.0 {
        return Tessellation::new();
    }
    match sweep(start_deg, end_deg) {
        Sweep::Empty => Tessellation::new(),
        Sweep::Full => {
            if inner_r == 0.0 {
                return circle_filled(center, outer_r);
            }
            let outer = ring_points(center, outer_r, outer_r, 0.0);
            let n = outer.len();
            let inner: Vec<Vec2> = (0..n)
                .map(|k| ellipse_point(center, inner_r, inner_r, 0.0, TAU * k as f32 / n as f32))
                .collect();
            let mut t = Tessellation::new();
            t.band(&outer, &inner, true);
            t
        }
        Sweep::Partial { start, radians } => arc_band(center, outer_r, inner_r, start, radians),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sweep_orders_and_saturates() {
        assert_eq!(sweep(10.0, 10.0), Sweep::Empty);
        assert_eq!(sweep(0.0, 400.0), Sweep::Full);
        let Sweep::Partial { start, radians } = sweep(90.0, 0.0) else {
            panic!("expected a partial sweep");
        };
        assert_relative_eq!(start, 0.0);
        assert_relative_eq!(radians, std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn filled_circle_stays_inside_radius() {
        let c = Vec2::new(50.0, 50.0);
        let t = circle_filled(c, 10.0);
        assert!(!t.is_empty());
        for p in &t.vertices {
            assert!((*p - c).length() <= 10.0 + 1e-3);
        }
    }

    #[test]
    fn outline_circle_spans_thickness() {
        let c = Vec2::zero();
        let t = circle(c, 10.0, 2.0);
        let (min, max) = t.vertices.iter().fold((f32::MAX, 0.0f32), |(lo, hi), p| {
            let d = p.length();
            (lo.min(d), hi.max(d))
        });
        assert_relative_eq!(min, 9.0, epsilon = 1e-3);
        assert_relative_eq!(max, 11.0, epsilon = 1e-3);
    }

    #[test]
    fn arc_endpoints_follow_angles() {
        let t = arc_filled(Vec2::zero(), 10.0, 0.0, 90.0);
        // Fan center first, then rim from 0° (+x) to 90° (+y, down).
        assert_eq!(t.vertices[0], Vec2::zero());
        let first = t.vertices[1];
        let last = *t.vertices.last().unwrap();
        assert_relative_eq!(first.x, 10.0, epsilon = 1e-4);
        assert_relative_eq!(last.y, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn degenerate_inputs_produce_nothing() {
        assert!(circle(Vec2::zero(), 0.0, 1.0).is_empty());
        assert!(ellipse_filled(Vec2::zero(), 5.0, 0.0, 0.0).is_empty());
        assert!(arc(Vec2::zero(), 5.0, 30.0, 30.0, 1.0).is_empty());
    }

    #[test]
    fn sector_outline_has_radial_edges() {
        let with_edges = sector(Vec2::zero(), 5.0, 10.0, 0.0, 90.0, 1.0);
        let arcs_only = {
            let mut t = arc(Vec2::zero(), 10.0, 0.0, 90.0, 1.0);
            t.append(arc(Vec2::zero(), 5.0, 0.0, 90.0, 1.0));
            t
        };
        assert_eq!(with_edges.triangle_count(), arcs_only.triangle_count() + 4);
    }

    #[test]
    fn ellipse_rotation_swaps_extent() {
        let t = ellipse_filled(Vec2::zero(), 20.0, 5.0, 90.0);
        let max_y = t.vertices.iter().map(|p| p.y.abs()).fold(0.0, f32::max);
        let max_x = t.vertices.iter().map(|p| p.x.abs()).fold(0.0, f32::max);
        assert_relative_eq!(max_y, 20.0, epsilon = 1e-3);
        assert!(max_x <= 5.0 + 1e-3);
    }
}
