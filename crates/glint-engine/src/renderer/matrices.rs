use crate::batch::FlushTrigger;
use crate::error::{GpuError, GpuResult};
use crate::handle::TargetId;
use crate::matrix::{Mat4, MatrixMode, MatrixStack, StackError};

use super::Renderer;

impl Renderer {
    /// Target the current context's matrix calls apply to.
    fn matrix_target(&self, function: &'static str) -> GpuResult<TargetId> {
        let target = self
            .active_target()
            .ok_or_else(|| GpuError::user(function, "no active context"))?;
        self.target(function, target)?;
        Ok(target)
    }

    fn with_active_stack(
        &mut self,
        function: &'static str,
        f: impl FnOnce(&mut MatrixStack) -> Result<(), StackError>,
    ) -> GpuResult<()> {
        let target = self.matrix_target(function)?;
        self.flush_if(FlushTrigger::Matrix(target))?;
        let t = self.target_mut(function, target)?;
        f(t.matrices.active_mut()).map_err(|e| GpuError::user(function, e.to_string()))
    }

    fn mult_active(&mut self, function: &'static str, m: Mat4) -> GpuResult<()> {
        self.with_active_stack(function, |s| {
            s.mult(&m);
            Ok(())
        })
    }

    /// Selects the stack for `target` and makes it the matrix target.
    pub(crate) fn matrix_mode(&mut self, target: TargetId, mode: MatrixMode) -> GpuResult<()> {
        const FN: &str = "matrix_mode";
        self.prepare_target(FN, target)?;
        self.target_mut(FN, target)?.matrices.mode = mode;
        if let Some(ctx) = self.context_mut() {
            ctx.active_target = target;
        }
        Ok(())
    }

    pub(crate) fn current_matrix_mode(&self) -> GpuResult<MatrixMode> {
        const FN: &str = "matrix_mode";
        let target = self.matrix_target(FN)?;
        Ok(self.target(FN, target)?.matrices.mode)
    }

    pub(crate) fn push_matrix(&mut self) -> GpuResult<()> {
        self.with_active_stack("push_matrix", MatrixStack::push)
    }

    pub(crate) fn pop_matrix(&mut self) -> GpuResult<()> {
        self.with_active_stack("pop_matrix", MatrixStack::pop)
    }

    pub(crate) fn load_identity(&mut self) -> GpuResult<()> {
        self.with_active_stack("load_identity", |s| {
            s.load_identity();
            Ok(())
        })
    }

    pub(crate) fn load_matrix(&mut self, m: Mat4) -> GpuResult<()> {
        self.with_active_stack("load_matrix", |s| {
            s.load(m);
            Ok(())
        })
    }

    pub(crate) fn mult_matrix(&mut self, m: Mat4) -> GpuResult<()> {
        self.mult_active("mult_matrix", m)
    }

    pub(crate) fn translate(&mut self, x: f32, y: f32, z: f32) -> GpuResult<()> {
        self.mult_active("translate", Mat4::translation(x, y, z))
    }

    pub(crate) fn scale(&mut self, sx: f32, sy: f32, sz: f32) -> GpuResult<()> {
        self.mult_active("scale", Mat4::scaling(sx, sy, sz))
    }

    pub(crate) fn rotate(&mut self, degrees: f32, x: f32, y: f32, z: f32) -> GpuResult<()> {
        self.mult_active("rotate", Mat4::rotation(degrees, x, y, z))
    }

    pub(crate) fn ortho(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> GpuResult<()> {
        self.mult_active("ortho", Mat4::orthographic(left, right, bottom, top, near, far))
    }

    pub(crate) fn frustum(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> GpuResult<()> {
        self.mult_active("frustum", Mat4::frustum(left, right, bottom, top, near, far))
    }

    pub(crate) fn perspective(&mut self, fovy: f32, aspect: f32, near: f32, far: f32) -> GpuResult<()> {
        self.mult_active("perspective", Mat4::perspective(fovy, aspect, near, far))
    }

    pub(crate) fn look_at(&mut self, eye: [f32; 3], target: [f32; 3], up: [f32; 3]) -> GpuResult<()> {
        self.mult_active("look_at", Mat4::look_at(eye, target, up))
    }

    fn top_of(&self, function: &'static str, mode: Option<MatrixMode>) -> GpuResult<Mat4> {
        let target = self.matrix_target(function)?;
        let set = &self.target(function, target)?.matrices;
        Ok(*set.stack(mode.unwrap_or(set.mode)).top())
    }

    pub(crate) fn current_matrix(&self) -> GpuResult<Mat4> {
        self.top_of("current_matrix", None)
    }

    pub(crate) fn model_matrix(&self) -> GpuResult<Mat4> {
        self.top_of("model_matrix", Some(MatrixMode::Model))
    }

    pub(crate) fn view_matrix(&self) -> GpuResult<Mat4> {
        self.top_of("view_matrix", Some(MatrixMode::View))
    }

    pub(crate) fn projection_matrix(&self) -> GpuResult<Mat4> {
        self.top_of("projection_matrix", Some(MatrixMode::Projection))
    }

    /// `P × V × M` of the matrix target, without the camera.
    pub(crate) fn model_view_projection(&self) -> GpuResult<Mat4> {
        const FN: &str = "model_view_projection";
        let target = self.matrix_target(FN)?;
        Ok(self.target(FN, target)?.matrices.model_view_projection(None))
    }

    /// Stack depth of `mode` on the matrix target.
    pub(crate) fn matrix_depth(&self, mode: MatrixMode) -> GpuResult<usize> {
        const FN: &str = "matrix_depth";
        let target = self.matrix_target(FN)?;
        Ok(self.target(FN, target)?.matrices.stack(mode).len())
    }

    /// Reloads `target`'s default projection for its logical size.
    pub(crate) fn reset_projection(&mut self, target: TargetId) -> GpuResult<()> {
        const FN: &str = "reset_projection";
        self.target(FN, target)?;
        self.flush_if(FlushTrigger::Matrix(target))?;
        self.target_mut(FN, target)?.reset_projection();
        Ok(())
    }
}
