use crate::coords::Rect;
use crate::handle::{ImageId, TargetId};
use crate::matrix::Camera;
use crate::paint::Color;
use crate::target::TargetInfo;

use super::Session;

impl Session {
    // ── lifecycle ─────────────────────────────────────────────────────────

    /// Render target drawing into `image`; repeated calls return the same
    /// target.
    pub fn load_target(&mut self, image: ImageId) -> Option<TargetId> {
        self.dispatch("load_target", |r| r.load_target(image))
    }

    /// Second handle to `target`'s surface with independent state.
    pub fn create_alias_target(&mut self, target: TargetId) -> Option<TargetId> {
        self.dispatch("create_alias_target", |r| r.create_alias_target(target))
    }

    /// Stale or unknown targets are ignored.
    pub fn free_target(&mut self, target: TargetId) {
        if let Some(r) = self.current_renderer_mut() {
            r.free_target(target);
        }
    }

    /// Makes `target`'s context the current one.
    pub fn make_current(&mut self, target: TargetId) {
        self.dispatch("make_current", |r| r.make_current(target));
    }

    /// Points matrix operations at `target`.
    pub fn set_active_target(&mut self, target: TargetId) {
        self.dispatch("set_active_target", |r| r.set_active_target(target));
    }

    pub fn active_target(&self) -> Option<TargetId> {
        self.current_renderer().and_then(|r| r.active_target())
    }

    pub fn target_info(&mut self, target: TargetId) -> Option<TargetInfo> {
        self.dispatch("target_info", |r| r.target_info(target))
    }

    // ── resolution ────────────────────────────────────────────────────────

    pub fn set_virtual_resolution(&mut self, target: TargetId, w: u32, h: u32) {
        self.dispatch("set_virtual_resolution", |r| r.set_virtual_resolution(target, w, h));
    }

    /// Restores the physical size, resets the viewport and drops the clip.
    pub fn unset_virtual_resolution(&mut self, target: TargetId) {
        self.dispatch("unset_virtual_resolution", |r| r.unset_virtual_resolution(target));
    }

    /// Maps window (display) coordinates into `target`'s logical space.
    pub fn get_virtual_coords(&mut self, target: TargetId, display_x: f32, display_y: f32) -> Option<(f32, f32)> {
        self.dispatch("get_virtual_coords", |r| r.virtual_coords(target, display_x, display_y))
    }

    pub fn set_window_resolution(&mut self, w: u32, h: u32) -> bool {
        self.dispatch("set_window_resolution", |r| r.set_window_resolution(w, h))
            .is_some()
    }

    /// Returns whether the window is fullscreen afterwards.
    pub fn set_fullscreen(&mut self, enable: bool, use_desktop_resolution: bool) -> bool {
        self.dispatch("set_fullscreen", |r| r.set_fullscreen(enable, use_desktop_resolution))
            .unwrap_or(false)
    }

    pub fn get_fullscreen(&self) -> bool {
        self.current_renderer().is_some_and(|r| r.fullscreen())
    }

    // ── viewport / camera ─────────────────────────────────────────────────

    pub fn set_viewport(&mut self, target: TargetId, viewport: Rect) {
        self.dispatch("set_viewport", |r| r.set_viewport(target, viewport));
    }

    pub fn unset_viewport(&mut self, target: TargetId) {
        self.dispatch("unset_viewport", |r| r.unset_viewport(target));
    }

    pub fn default_camera() -> Camera {
        Camera::default()
    }

    /// Installs `camera` (`None` for the default) and returns the old one.
    pub fn set_camera(&mut self, target: TargetId, camera: Option<Camera>) -> Option<Camera> {
        self.dispatch("set_camera", |r| r.set_camera(target, camera))
    }

    pub fn get_camera(&mut self, target: TargetId) -> Option<Camera> {
        self.dispatch("get_camera", |r| r.camera(target))
    }

    pub fn enable_camera(&mut self, target: TargetId, enable: bool) {
        self.dispatch("enable_camera", |r| r.enable_camera(target, enable));
    }

    pub fn is_camera_enabled(&mut self, target: TargetId) -> bool {
        self.dispatch("is_camera_enabled", |r| r.is_camera_enabled(target))
            .unwrap_or(false)
    }

    // ── clipping ──────────────────────────────────────────────────────────

    /// Enables clipping to a rectangle; returns the rectangle in effect.
    pub fn set_clip(&mut self, target: TargetId, x: f32, y: f32, w: f32, h: f32) -> Option<Rect> {
        self.set_clip_rect(target, Rect::new(x, y, w, h))
    }

    pub fn set_clip_rect(&mut self, target: TargetId, rect: Rect) -> Option<Rect> {
        self.dispatch("set_clip", |r| r.set_clip(target, rect))
    }

    pub fn unset_clip(&mut self, target: TargetId) {
        self.dispatch("unset_clip", |r| r.unset_clip(target));
    }

    /// The clip rectangle, `None` when clipping is off.
    pub fn clip_rect(&mut self, target: TargetId) -> Option<Rect> {
        self.dispatch("clip_rect", |r| r.clip_rect(target)).flatten()
    }

    /// Intersection with the clip rectangle (or the whole target when not
    /// clipping); `None` when they do not overlap.
    pub fn intersect_clip_rect(&mut self, target: TargetId, rect: Rect) -> Option<Rect> {
        self.dispatch("intersect_clip_rect", |r| r.intersect_clip_rect(target, rect))
            .flatten()
    }

    pub fn intersect_target_rect(&mut self, target: TargetId, rect: Rect) -> Option<Rect> {
        self.dispatch("intersect_target_rect", |r| r.intersect_target_rect(target, rect))
            .flatten()
    }

    // ── color ─────────────────────────────────────────────────────────────

    /// Modulates everything drawn to `target` by `color`.
    pub fn set_target_color(&mut self, target: TargetId, color: Color) {
        self.dispatch("set_target_color", |r| r.set_target_color(target, Some(color)));
    }

    pub fn set_target_rgba(&mut self, target: TargetId, r: u8, g: u8, b: u8, a: u8) {
        self.set_target_color(target, Color::rgba(r, g, b, a));
    }

    pub fn unset_target_color(&mut self, target: TargetId) {
        self.dispatch("unset_target_color", |r| r.set_target_color(target, None));
    }
}
