use core::ops::Mul;

use bytemuck::{Pod, Zeroable};

/// 4×4 float matrix, column-major: element (row, col) lives at `col * 4 + row`.
///
/// Mutating helpers post-multiply (`M = M × A`), so transforms issued later
/// apply to vertices first.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Mat4(pub [f32; 16]);

impl Default for Mat4 {
    fn default() -> Self {
        Mat4::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.0[col * 4 + row]
    }

    #[inline]
    pub fn as_array(&self) -> &[f32; 16] {
        &self.0
    }

    /// Row-major input (as written on paper), stored column-major.
    pub fn from_rows(rows: [[f32; 4]; 4]) -> Mat4 {
        let mut m = [0.0; 16];
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                m[c * 4 + r] = *v;
            }
        }
        Mat4(m)
    }

    /// Embeds a column-major 3×3 2D affine matrix (x, y, homogeneous).
    pub fn from_mat3(m: &[f32; 9]) -> Mat4 {
        Mat4([
            m[0], m[1], 0.0, m[2], //
            m[3], m[4], 0.0, m[5], //
            0.0, 0.0, 1.0, 0.0, //
            m[6], m[7], 0.0, m[8],
        ])
    }

    pub fn transposed(&self) -> Mat4 {
        let mut out = [0.0; 16];
        for r in 0..4 {
            for c in 0..4 {
                out[r * 4 + c] = self.0[c * 4 + r];
            }
        }
        Mat4(out)
    }

    /// `self = self × a`, computed into a temporary so `a` may alias `self`.
    pub fn multiply_and_assign(&mut self, a: &Mat4) {
        let mut tmp = [0.0f32; 16];
        for c in 0..4 {
            for r in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.0[k * 4 + r] * a.0[c * 4 + k];
                }
                tmp[c * 4 + r] = sum;
            }
        }
        self.0 = tmp;
    }

    pub fn transform_point(&self, p: [f32; 3]) -> [f32; 4] {
        let m = &self.0;
        let mut out = [0.0; 4];
        for (r, o) in out.iter_mut().enumerate() {
            *o = m[r] * p[0] + m[4 + r] * p[1] + m[8 + r] * p[2] + m[12 + r];
        }
        out
    }

    // ── constructors ──────────────────────────────────────────────────────

    pub fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        m.0[12] = x;
        m.0[13] = y;
        m.0[14] = z;
        m
    }

    pub fn scaling(sx: f32, sy: f32, sz: f32) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        m.0[0] = sx;
        m.0[5] = sy;
        m.0[10] = sz;
        m
    }

    /// Rotation of `degrees` about the axis `(x, y, z)`; a zero axis yields identity.
    pub fn rotation(degrees: f32, x: f32, y: f32, z: f32) -> Mat4 {
        let len = (x * x + y * y + z * z).sqrt();
        if len == 0.0 {
            return Mat4::IDENTITY;
        }
        let (x, y, z) = (x / len, y / len, z / len);
        let (s, c) = degrees.to_radians().sin_cos();
        let t = 1.0 - c;
        Mat4([
            x * x * t + c,
            y * x * t + z * s,
            x * z * t - y * s,
            0.0,
            x * y * t - z * s,
            y * y * t + c,
            y * z * t + x * s,
            0.0,
            x * z * t + y * s,
            y * z * t - x * s,
            z * z * t + c,
            0.0,
            0.0,
            0.0,
            0.0,
            1.0,
        ])
    }

    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        m.0[0] = 2.0 / (right - left);
        m.0[5] = 2.0 / (top - bottom);
        m.0[10] = -2.0 / (far - near);
        m.0[12] = -(right + left) / (right - left);
        m.0[13] = -(top + bottom) / (top - bottom);
        m.0[14] = -(far + near) / (far - near);
        m
    }

    pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let mut m = Mat4([0.0; 16]);
        m.0[0] = 2.0 * near / (right - left);
        m.0[5] = 2.0 * near / (top - bottom);
        m.0[8] = (right + left) / (right - left);
        m.0[9] = (top + bottom) / (top - bottom);
        m.0[10] = -(far + near) / (far - near);
        m.0[11] = -1.0;
        m.0[14] = -2.0 * far * near / (far - near);
        m
    }

    /// Symmetric perspective frustum; `fovy` in degrees.
    pub fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let fh = (fovy.to_radians() * 0.5).tan() * near;
        let fw = fh * aspect;
        Mat4::frustum(-fw, fw, -fh, fh, near, far)
    }

    pub fn look_at(eye: [f32; 3], target: [f32; 3], up: [f32; 3]) -> Mat4 {
        let f = normalize(sub(target, eye));
        let s = normalize(cross(f, up));
        let u = cross(s, f);
        let mut m = Mat4([
            s[0], u[0], -f[0], 0.0, //
            s[1], u[1], -f[1], 0.0, //
            s[2], u[2], -f[2], 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]);
        m.translate(-eye[0], -eye[1], -eye[2]);
        m
    }

    // ── in-place post-multiplication ──────────────────────────────────────

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.multiply_and_assign(&Mat4::translation(x, y, z));
    }

    pub fn scale(&mut self, sx: f32, sy: f32, sz: f32) {
        self.multiply_and_assign(&Mat4::scaling(sx, sy, sz));
    }

    pub fn rotate(&mut self, degrees: f32, x: f32, y: f32, z: f32) {
        self.multiply_and_assign(&Mat4::rotation(degrees, x, y, z));
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = self;
        out.multiply_and_assign(&rhs);
        out
    }
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len == 0.0 {
        v
    } else {
        [v[0] / len, v[1] / len, v[2] / len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_point(m: &Mat4, p: [f32; 3], expected: [f32; 3]) {
        let out = m.transform_point(p);
        for i in 0..3 {
            assert_relative_eq!(out[i] / out[3], expected[i], epsilon = 1e-5);
        }
    }

    // ── multiplication ────────────────────────────────────────────────────

    #[test]
    fn identity_is_neutral() {
        let t = Mat4::translation(3.0, 4.0, 5.0);
        assert_eq!(Mat4::IDENTITY * t, t);
        assert_eq!(t * Mat4::IDENTITY, t);
    }

    #[test]
    fn multiply_and_assign_with_self_alias() {
        let mut m = Mat4::translation(1.0, 2.0, 0.0);
        let copy = m;
        m.multiply_and_assign(&copy);
        assert_eq!(m, Mat4::translation(2.0, 4.0, 0.0));
    }

    #[test]
    fn post_multiplication_applies_last_transform_first() {
        let mut m = Mat4::IDENTITY;
        m.translate(10.0, 0.0, 0.0);
        m.scale(2.0, 2.0, 1.0);
        // scale first, then translate
        assert_point(&m, [1.0, 1.0, 0.0], [12.0, 2.0, 0.0]);
    }

    #[test]
    fn column_major_layout() {
        let m = Mat4::translation(7.0, 8.0, 9.0);
        assert_eq!(m.at(0, 3), 7.0);
        assert_eq!(m.at(1, 3), 8.0);
        assert_eq!(m.0[12], 7.0);
        let r = Mat4::from_rows([
            [1.0, 0.0, 0.0, 7.0],
            [0.0, 1.0, 0.0, 8.0],
            [0.0, 0.0, 1.0, 9.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        assert_eq!(r, m);
        assert_eq!(m.transposed().transposed(), m);
    }

    // ── projections ───────────────────────────────────────────────────────

    #[test]
    fn ortho_maps_corners_to_ndc() {
        let p = Mat4::orthographic(0.0, 640.0, 480.0, 0.0, -1.0, 1.0);
        assert_point(&p, [0.0, 0.0, 0.0], [-1.0, 1.0, 0.0]);
        assert_point(&p, [640.0, 480.0, 0.0], [1.0, -1.0, 0.0]);
        assert_point(&p, [320.0, 240.0, 0.0], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn perspective_maps_near_plane_to_minus_one() {
        let p = Mat4::perspective(90.0, 1.0, 1.0, 100.0);
        assert_point(&p, [0.0, 0.0, -1.0], [0.0, 0.0, -1.0]);
        assert_point(&p, [0.0, 0.0, -100.0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn look_at_moves_eye_to_origin() {
        let v = Mat4::look_at([0.0, 0.0, 5.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert_point(&v, [0.0, 0.0, 5.0], [0.0, 0.0, 0.0]);
        assert_point(&v, [0.0, 0.0, 0.0], [0.0, 0.0, -5.0]);
    }

    // ── rotation ──────────────────────────────────────────────────────────

    #[test]
    fn rotation_about_z_turns_x_towards_y() {
        let r = Mat4::rotation(90.0, 0.0, 0.0, 1.0);
        assert_point(&r, [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn rotation_with_zero_axis_is_identity() {
        assert_eq!(Mat4::rotation(45.0, 0.0, 0.0, 0.0), Mat4::IDENTITY);
    }

    #[test]
    fn mat3_embedding_translates() {
        let m = Mat4::from_mat3(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 5.0, 6.0, 1.0]);
        assert_point(&m, [1.0, 1.0, 0.0], [6.0, 7.0, 0.0]);
    }
}
