//! CPU tessellation of shape primitives into indexed triangles.
//!
//! Coordinates are logical target pixels with the y axis pointing down.
//! Angles are degrees, measured from +x towards +y (clockwise on screen).
//! Outline primitives are centred on their edge and `thickness` wide.

mod curves;
mod polygons;

pub use curves::{arc, arc_filled, circle, circle_filled, ellipse, ellipse_filled, sector, sector_filled};
pub use polygons::{
    line, pixel, polygon, polygon_filled, polyline, rectangle, rectangle_filled, rectangle_round,
    rectangle_round_filled, tri, tri_filled,
};

use crate::coords::Vec2;

/// Indexed triangle list produced by the shape builders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tessellation {
    pub vertices: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Tessellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push(&mut self, p: Vec2) -> u32 {
        self.vertices.push(p);
        (self.vertices.len() - 1) as u32
    }

    fn quad(&mut self, a: Vec2, b: Vec2, c: Vec2, d: Vec2) {
        let i = self.push(a);
        self.push(b);
        self.push(c);
        self.push(d);
        self.indices.extend_from_slice(&[i, i + 1, i + 2, i, i + 2, i + 3]);
    }

    /// Triangle fan around `center`; closes back onto the first rim point
    /// when `closed`.
    fn fan(&mut self, center: Vec2, rim: &[Vec2], closed: bool) {
        if rim.len() < 2 {
            return;
        }
        let c = self.push(center);
        let first = c + 1;
        for &p in rim {
            self.push(p);
        }
        let n = rim.len() as u32;
        for k in 0..n - 1 {
            self.indices.extend_from_slice(&[c, first + k, first + k + 1]);
        }
        if closed {
            self.indices.extend_from_slice(&[c, first + n - 1, first]);
        }
    }

    /// Band between two point rings of equal length.
    fn band(&mut self, outer: &[Vec2], inner: &[Vec2], closed: bool) {
        debug_assert_eq!(outer.len(), inner.len());
        let n = outer.len().min(inner.len()) as u32;
        if n < 2 {
            return;
        }
        let base = self.vertices.len() as u32;
        for (&o, &i) in outer.iter().zip(inner) {
            self.push(o);
            self.push(i);
        }
        let segments = if closed { n } else { n - 1 };
        for k in 0..segments {
            let (o0, i0) = (base + 2 * k, base + 2 * k + 1);
            let next = (k + 1) % n;
            let (o1, i1) = (base + 2 * next, base + 2 * next + 1);
            self.indices.extend_from_slice(&[o0, o1, i1, o0, i1, i0]);
        }
    }

    fn append(&mut self, other: Tessellation) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }
}

/// Angular step (radians) that keeps chords within a pixel-ish error.
pub(crate) fn angle_step(radius: f32) -> f32 {
    if radius <= 1.0 {
        return std::f32::consts::FRAC_PI_2;
    }
    (1.25 / radius.sqrt()).min(std::f32::consts::FRAC_PI_4)
}

/// Point on the ellipse with radii (rx, ry) rotated by `rotation` degrees.
pub(crate) fn ellipse_point(center: Vec2, rx: f32, ry: f32, rotation: f32, radians: f32) -> Vec2 {
    let local = Vec2::new(rx * radians.cos(), ry * radians.sin());
    let p = if rotation == 0.0 { local } else { local.rotated(rotation) };
    Vec2::new(center.x + p.x, center.y + p.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_closes_the_rim() {
        let mut t = Tessellation::new();
        let rim = [
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(0.0, -1.0),
        ];
        t.fan(Vec2::zero(), &rim, true);
        assert_eq!(t.vertices.len(), 5);
        assert_eq!(t.triangle_count(), 4);
        assert_eq!(&t.indices[9..], &[0, 4, 1]);
    }

    #[test]
    fn open_band_has_two_triangles_per_segment() {
        let mut t = Tessellation::new();
        let outer = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)];
        let inner = [Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0), Vec2::new(2.0, 1.0)];
        t.band(&outer, &inner, false);
        assert_eq!(t.triangle_count(), 4);
        t.band(&outer, &inner, true);
        assert_eq!(t.triangle_count(), 10);
    }

    #[test]
    fn append_rebases_indices() {
        let mut a = Tessellation::new();
        a.quad(Vec2::zero(), Vec2::zero(), Vec2::zero(), Vec2::zero());
        let b = a.clone();
        a.append(b);
        assert_eq!(a.indices[6], 4);
        assert!(a.indices.iter().all(|&i| (i as usize) < a.vertices.len()));
    }

    #[test]
    fn small_radii_still_step() {
        assert!(angle_step(0.5) > 0.0);
        assert!(angle_step(100.0) < angle_step(4.0));
    }
}
