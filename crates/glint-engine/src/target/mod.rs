//! Render targets, window contexts and their coordinate rules.

pub mod coords;

use std::collections::BTreeMap;

use crate::coords::Rect;
use crate::handle::{ImageId, ProgramId, TargetId};
use crate::matrix::{Camera, Mat4, MatrixSet};
use crate::paint::Color;
use crate::renderer::SurfaceHandle;
use crate::shader::{AttributeSource, ShaderBlock};

/// What a target draws into.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TargetKind {
    Window { window_id: u64 },
    Image(ImageId),
}

/// A drawable surface with its own clip, viewport, camera and matrices.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub surface: SurfaceHandle,
    pub kind: TargetKind,
    /// Physical size.
    pub base_w: u32,
    pub base_h: u32,
    /// Logical size (differs from physical under a virtual resolution).
    pub w: u32,
    pub h: u32,
    pub using_virtual_resolution: bool,
    pub viewport: Rect,
    pub clip: Rect,
    pub use_clip: bool,
    pub camera: Camera,
    pub use_camera: bool,
    pub matrices: MatrixSet,
    pub color: Color,
    pub use_color: bool,
    pub is_alias: bool,
}

impl RenderTarget {
    pub fn new(surface: SurfaceHandle, kind: TargetKind, w: u32, h: u32, max_matrix_depth: usize) -> Self {
        let camera = Camera::default();
        let projection = default_projection(w, h, &camera);
        Self {
            surface,
            kind,
            base_w: w,
            base_h: h,
            w,
            h,
            using_virtual_resolution: false,
            viewport: Rect::from_size(w as f32, h as f32),
            clip: Rect::from_size(w as f32, h as f32),
            use_clip: false,
            camera,
            use_camera: true,
            matrices: MatrixSet::new(max_matrix_depth, projection),
            color: Color::WHITE,
            use_color: false,
            is_alias: false,
        }
    }

    /// Image targets hold their top row first in memory.
    #[inline]
    pub fn flips_y(&self) -> bool {
        matches!(self.kind, TargetKind::Image(_))
    }

    #[inline]
    pub fn image(&self) -> Option<ImageId> {
        match self.kind {
            TargetKind::Image(id) => Some(id),
            TargetKind::Window { .. } => None,
        }
    }

    #[inline]
    pub fn window_id(&self) -> Option<u64> {
        match self.kind {
            TargetKind::Window { window_id } => Some(window_id),
            TargetKind::Image(_) => None,
        }
    }

    #[inline]
    pub fn full_rect(&self) -> Rect {
        Rect::from_size(self.w as f32, self.h as f32)
    }

    /// Color multiplied into everything drawn on this target.
    #[inline]
    pub fn modulation(&self) -> Color {
        if self.use_color { self.color } else { Color::WHITE }
    }

    /// Sets the logical size and regenerates the viewport and projection.
    pub fn set_logical_size(&mut self, w: u32, h: u32) {
        self.w = w;
        self.h = h;
        self.using_virtual_resolution = w != self.base_w || h != self.base_h;
        self.viewport = self.full_rect();
        self.reset_projection();
    }

    /// Sets the physical size; the logical size follows unless virtual.
    pub fn set_physical_size(&mut self, w: u32, h: u32) {
        self.base_w = w;
        self.base_h = h;
        if self.using_virtual_resolution {
            self.using_virtual_resolution = self.w != w || self.h != h;
        } else {
            self.set_logical_size(w, h);
        }
    }

    pub fn reset_projection(&mut self) {
        let p = default_projection(self.w, self.h, &self.camera);
        self.matrices.projection.load(p);
    }

    pub fn camera_matrix(&self) -> Option<Mat4> {
        self.use_camera
            .then(|| self.camera.view_matrix(self.w as f32, self.h as f32))
    }

    /// `P × camera × V × M` for this target.
    pub fn model_view_projection(&self) -> Mat4 {
        self.matrices.model_view_projection(self.camera_matrix().as_ref())
    }
}

/// Top-left origin orthographic projection over the logical size.
pub fn default_projection(w: u32, h: u32, camera: &Camera) -> Mat4 {
    Mat4::orthographic(0.0, w as f32, h as f32, 0.0, camera.z_near, camera.z_far)
}

/// Per-window rendering state owned by a window target.
#[derive(Debug, Clone)]
pub struct Context {
    pub window_id: u64,
    /// Window size as last requested/observed.
    pub window_w: u32,
    pub window_h: u32,
    /// Windowed size restored when leaving fullscreen.
    pub stored_window_w: u32,
    pub stored_window_h: u32,
    pub fullscreen: bool,
    /// Target that matrix operations apply to.
    pub active_target: TargetId,
    pub program: Option<ProgramId>,
    pub block: ShaderBlock,
    pub attribute_sources: BTreeMap<u32, AttributeSource>,
    pub constant_attributes: BTreeMap<u32, Vec<f32>>,
}

impl Context {
    pub fn new(window_id: u64, w: u32, h: u32, target: TargetId) -> Self {
        Self {
            window_id,
            window_w: w,
            window_h: h,
            stored_window_w: w,
            stored_window_h: h,
            fullscreen: false,
            active_target: target,
            program: None,
            block: ShaderBlock::builtin(),
            attribute_sources: BTreeMap::new(),
            constant_attributes: BTreeMap::new(),
        }
    }
}

/// Read-only snapshot of a target's state.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetInfo {
    pub w: u32,
    pub h: u32,
    pub base_w: u32,
    pub base_h: u32,
    pub using_virtual_resolution: bool,
    pub viewport: Rect,
    pub clip: Option<Rect>,
    pub camera: Camera,
    pub use_camera: bool,
    pub color: Option<Color>,
    pub image: Option<ImageId>,
    pub window_id: Option<u64>,
    pub is_alias: bool,
    pub has_context: bool,
}

impl TargetInfo {
    pub(crate) fn new(t: &RenderTarget, has_context: bool) -> Self {
        Self {
            w: t.w,
            h: t.h,
            base_w: t.base_w,
            base_h: t.base_h,
            using_virtual_resolution: t.using_virtual_resolution,
            viewport: t.viewport,
            clip: t.use_clip.then_some(t.clip),
            camera: t.camera,
            use_camera: t.use_camera,
            color: t.use_color.then_some(t.color),
            image: t.image(),
            window_id: t.window_id(),
            is_alias: t.is_alias,
            has_context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::DEFAULT_MAX_MATRIX_DEPTH;

    fn target(w: u32, h: u32) -> RenderTarget {
        RenderTarget::new(
            SurfaceHandle(1),
            TargetKind::Window { window_id: 7 },
            w,
            h,
            DEFAULT_MAX_MATRIX_DEPTH,
        )
    }

    #[test]
    fn new_target_covers_its_surface() {
        let t = target(320, 200);
        assert_eq!(t.viewport, Rect::new(0.0, 0.0, 320.0, 200.0));
        assert!(!t.use_clip);
        assert!(!t.using_virtual_resolution);
        assert_eq!(t.window_id(), Some(7));
    }

    #[test]
    fn logical_size_regenerates_projection() {
        let mut t = target(320, 200);
        t.set_logical_size(160, 100);
        assert!(t.using_virtual_resolution);
        let p = t.matrices.projection.top().transform_point([160.0, 100.0, 0.0]);
        approx::assert_relative_eq!(p[0], 1.0, epsilon = 1e-6);
        approx::assert_relative_eq!(p[1], -1.0, epsilon = 1e-6);
    }

    #[test]
    fn physical_resize_keeps_virtual_resolution() {
        let mut t = target(320, 200);
        t.set_logical_size(160, 100);
        t.set_physical_size(640, 400);
        assert_eq!((t.w, t.h), (160, 100));
        assert!(t.using_virtual_resolution);

        let mut plain = target(320, 200);
        plain.set_physical_size(100, 50);
        assert_eq!((plain.w, plain.h), (100, 50));
        assert_eq!(plain.viewport, Rect::new(0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn modulation_defaults_to_white() {
        let mut t = target(1, 1);
        t.color = Color::RED;
        assert_eq!(t.modulation(), Color::WHITE);
        t.use_color = true;
        assert_eq!(t.modulation(), Color::RED);
    }
}
