use crate::handle::TargetId;
use crate::matrix::{Mat4, MatrixMode};

use super::Session;

impl Session {
    /// Selects which of `target`'s stacks the following calls edit and makes
    /// `target` the matrix target.
    pub fn matrix_mode(&mut self, target: TargetId, mode: MatrixMode) {
        self.dispatch("matrix_mode", |r| r.matrix_mode(target, mode));
    }

    pub fn current_matrix_mode(&mut self) -> Option<MatrixMode> {
        self.dispatch("matrix_mode", |r| r.current_matrix_mode())
    }

    pub fn push_matrix(&mut self) {
        self.dispatch("push_matrix", |r| r.push_matrix());
    }

    pub fn pop_matrix(&mut self) {
        self.dispatch("pop_matrix", |r| r.pop_matrix());
    }

    pub fn load_identity(&mut self) {
        self.dispatch("load_identity", |r| r.load_identity());
    }

    pub fn load_matrix(&mut self, m: Mat4) {
        self.dispatch("load_matrix", |r| r.load_matrix(m));
    }

    /// Post-multiplies the top of the current stack by `m`.
    pub fn mult_matrix(&mut self, m: Mat4) {
        self.dispatch("mult_matrix", |r| r.mult_matrix(m));
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.dispatch("translate", |r| r.translate(x, y, z));
    }

    pub fn scale(&mut self, sx: f32, sy: f32, sz: f32) {
        self.dispatch("scale", |r| r.scale(sx, sy, sz));
    }

    /// Rotation by `degrees` about the axis (x, y, z).
    pub fn rotate(&mut self, degrees: f32, x: f32, y: f32, z: f32) {
        self.dispatch("rotate", |r| r.rotate(degrees, x, y, z));
    }

    pub fn ortho(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.dispatch("ortho", |r| r.ortho(left, right, bottom, top, near, far));
    }

    pub fn frustum(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.dispatch("frustum", |r| r.frustum(left, right, bottom, top, near, far));
    }

    pub fn perspective(&mut self, fovy: f32, aspect: f32, near: f32, far: f32) {
        self.dispatch("perspective", |r| r.perspective(fovy, aspect, near, far));
    }

    pub fn look_at(&mut self, eye: [f32; 3], target: [f32; 3], up: [f32; 3]) {
        self.dispatch("look_at", |r| r.look_at(eye, target, up));
    }

    pub fn current_matrix(&mut self) -> Option<Mat4> {
        self.dispatch("current_matrix", |r| r.current_matrix())
    }

    pub fn model(&mut self) -> Option<Mat4> {
        self.dispatch("model_matrix", |r| r.model_matrix())
    }

    pub fn view(&mut self) -> Option<Mat4> {
        self.dispatch("view_matrix", |r| r.view_matrix())
    }

    pub fn projection(&mut self) -> Option<Mat4> {
        self.dispatch("projection_matrix", |r| r.projection_matrix())
    }

    pub fn model_view_projection(&mut self) -> Option<Mat4> {
        self.dispatch("model_view_projection", |r| r.model_view_projection())
    }

    pub fn matrix_depth(&mut self, mode: MatrixMode) -> Option<usize> {
        self.dispatch("matrix_depth", |r| r.matrix_depth(mode))
    }

    /// Reloads the default projection for `target`'s logical size.
    pub fn reset_projection(&mut self, target: TargetId) {
        self.dispatch("reset_projection", |r| r.reset_projection(target));
    }
}
