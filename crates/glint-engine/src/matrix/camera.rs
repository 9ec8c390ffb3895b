use super::Mat4;

/// 2D camera applied on top of a target's view matrix.
///
/// `angle` is in degrees. With `use_centered_origin`, rotation and zoom
/// pivot around the target's center instead of its top-left corner.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub angle: f32,
    pub zoom_x: f32,
    pub zoom_y: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub use_centered_origin: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            angle: 0.0,
            zoom_x: 1.0,
            zoom_y: 1.0,
            z_near: -100.0,
            z_far: 100.0,
            use_centered_origin: true,
        }
    }
}

impl Camera {
    /// View transform for a target of logical size `w × h`:
    /// `T(c)·R(angle)·T(-c) · T(c)·S(zoom)·T(-c) · T(-pos)`.
    pub fn view_matrix(&self, w: f32, h: f32) -> Mat4 {
        let (cx, cy) = if self.use_centered_origin {
            (w * 0.5, h * 0.5)
        } else {
            (0.0, 0.0)
        };

        let mut m = Mat4::IDENTITY;
        m.translate(cx, cy, 0.0);
        m.rotate(self.angle, 0.0, 0.0, 1.0);
        m.translate(-cx, -cy, 0.0);

        m.translate(cx, cy, 0.0);
        m.scale(self.zoom_x, self.zoom_y, 1.0);
        m.translate(-cx, -cy, 0.0);

        m.translate(-self.x, -self.y, -self.z);
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn apply(m: &Mat4, x: f32, y: f32) -> (f32, f32) {
        let p = m.transform_point([x, y, 0.0]);
        (p[0], p[1])
    }

    #[test]
    fn default_camera_is_identity() {
        assert_eq!(Camera::default().view_matrix(640.0, 480.0), Mat4::IDENTITY);
    }

    #[test]
    fn position_scrolls_the_world() {
        let cam = Camera { x: 10.0, y: 20.0, ..Camera::default() };
        let (x, y) = apply(&cam.view_matrix(100.0, 100.0), 10.0, 20.0);
        assert_relative_eq!(x, 0.0);
        assert_relative_eq!(y, 0.0);
    }

    #[test]
    fn centered_zoom_keeps_center_fixed() {
        let cam = Camera { zoom_x: 2.0, zoom_y: 2.0, ..Camera::default() };
        let m = cam.view_matrix(100.0, 50.0);
        let (x, y) = apply(&m, 50.0, 25.0);
        assert_relative_eq!(x, 50.0);
        assert_relative_eq!(y, 25.0);
        let (x, _) = apply(&m, 60.0, 25.0);
        assert_relative_eq!(x, 70.0);
    }

    #[test]
    fn uncentered_zoom_scales_from_origin() {
        let cam = Camera {
            zoom_x: 2.0,
            zoom_y: 2.0,
            use_centered_origin: false,
            ..Camera::default()
        };
        let (x, y) = apply(&cam.view_matrix(100.0, 50.0), 10.0, 5.0);
        assert_relative_eq!(x, 20.0);
        assert_relative_eq!(y, 10.0);
    }

    #[test]
    fn rotation_pivots_on_center() {
        let cam = Camera { angle: 180.0, ..Camera::default() };
        let (x, y) = apply(&cam.view_matrix(100.0, 100.0), 0.0, 0.0);
        assert_relative_eq!(x, 100.0, epsilon = 1e-4);
        assert_relative_eq!(y, 100.0, epsilon = 1e-4);
    }
}
