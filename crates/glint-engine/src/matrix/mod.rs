//! Matrix math, matrix stacks and the 2D camera.
//!
//! Every render target owns a [`MatrixSet`]: model, view and projection
//! stacks plus the mode selecting which one transform calls modify.

mod camera;
mod mat4;
mod stack;

pub use camera::Camera;
pub use mat4::Mat4;
pub use stack::{DEFAULT_MAX_MATRIX_DEPTH, MatrixStack, StackError};

/// Which stack matrix operations apply to.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum MatrixMode {
    #[default]
    Model,
    View,
    Projection,
}

/// The three stacks of a render target.
#[derive(Debug, Clone)]
pub struct MatrixSet {
    pub model: MatrixStack,
    pub view: MatrixStack,
    pub projection: MatrixStack,
    pub mode: MatrixMode,
}

impl MatrixSet {
    /// Identity model/view; `projection` seeds the projection stack.
    pub fn new(max_depth: usize, projection: Mat4) -> Self {
        let mut set = Self {
            model: MatrixStack::new(max_depth),
            view: MatrixStack::new(max_depth),
            projection: MatrixStack::new(max_depth),
            mode: MatrixMode::Model,
        };
        set.projection.load(projection);
        set
    }

    pub fn stack(&self, mode: MatrixMode) -> &MatrixStack {
        match mode {
            MatrixMode::Model => &self.model,
            MatrixMode::View => &self.view,
            MatrixMode::Projection => &self.projection,
        }
    }

    pub fn stack_mut(&mut self, mode: MatrixMode) -> &mut MatrixStack {
        match mode {
            MatrixMode::Model => &mut self.model,
            MatrixMode::View => &mut self.view,
            MatrixMode::Projection => &mut self.projection,
        }
    }

    #[inline]
    pub fn active(&self) -> &MatrixStack {
        self.stack(self.mode)
    }

    #[inline]
    pub fn active_mut(&mut self) -> &mut MatrixStack {
        self.stack_mut(self.mode)
    }

    /// `P × V × M`; `camera` (when given) is applied in front of the view.
    pub fn model_view_projection(&self, camera: Option<&Mat4>) -> Mat4 {
        let mut mvp = *self.projection.top();
        if let Some(cam) = camera {
            mvp.multiply_and_assign(cam);
        }
        mvp.multiply_and_assign(self.view.top());
        mvp.multiply_and_assign(self.model.top());
        mvp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mvp_of_identities_is_identity() {
        let set = MatrixSet::new(DEFAULT_MAX_MATRIX_DEPTH, Mat4::IDENTITY);
        assert_eq!(set.model_view_projection(None), Mat4::IDENTITY);
    }

    #[test]
    fn mvp_with_model_translation_equals_translation() {
        let mut set = MatrixSet::new(DEFAULT_MAX_MATRIX_DEPTH, Mat4::IDENTITY);
        set.model.top_mut().translate(3.0, -2.0, 1.0);
        assert_eq!(set.model_view_projection(None), Mat4::translation(3.0, -2.0, 1.0));
    }

    #[test]
    fn mode_selects_stack() {
        let mut set = MatrixSet::new(DEFAULT_MAX_MATRIX_DEPTH, Mat4::IDENTITY);
        set.mode = MatrixMode::View;
        set.active_mut().push().unwrap();
        assert_eq!(set.view.len(), 2);
        assert_eq!(set.model.len(), 1);
    }

    #[test]
    fn composition_order_is_projection_view_model() {
        let mut set = MatrixSet::new(DEFAULT_MAX_MATRIX_DEPTH, Mat4::scaling(2.0, 2.0, 1.0));
        set.view.top_mut().translate(1.0, 0.0, 0.0);
        set.model.top_mut().translate(0.0, 1.0, 0.0);
        let p = set.model_view_projection(None).transform_point([0.0, 0.0, 0.0]);
        assert_eq!((p[0], p[1]), (2.0, 2.0));
    }
}
