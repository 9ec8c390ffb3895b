use crate::batch::FlushTrigger;
use crate::coords::Rect;
use crate::error::{GpuError, GpuResult};
use crate::handle::{ImageId, TargetId};
use crate::matrix::Camera;
use crate::paint::Color;
use crate::target::{RenderTarget, TargetInfo, TargetKind, coords};

use super::{Features, Renderer};

impl Renderer {
    // ── lifecycle ─────────────────────────────────────────────────────────

    /// The render target of `image`, created on first use.
    pub(crate) fn load_target(&mut self, image: ImageId) -> GpuResult<TargetId> {
        const FN: &str = "load_target";
        let img = self.image(FN, image)?;
        if let Some(existing) = img.target {
            return Ok(existing);
        }
        let (texture, w, h) = (img.texture, img.w, img.h);
        self.require(FN, Features::RENDER_TARGETS)?;
        self.flush_if(FlushTrigger::ImageUpdate(image))?;

        let surface = self
            .backend
            .create_surface(texture)
            .map_err(|e| GpuError::backend(FN, e))?;
        let id = self.handles.target();
        let target = RenderTarget::new(
            surface,
            TargetKind::Image(image),
            w,
            h,
            self.settings.max_matrix_depth,
        );
        *self.surface_refs.entry(surface).or_insert(0) += 1;
        self.targets.insert(id, target);
        self.image_mut(FN, image)?.target = Some(id);
        if self.settings.debug_level.traces() {
            log::debug!("{FN}: {id:?} for {image:?}");
        }
        Ok(id)
    }

    /// A second target drawing into the same surface with its own state.
    pub(crate) fn create_alias_target(&mut self, target: TargetId) -> GpuResult<TargetId> {
        let mut alias = self.target("create_alias_target", target)?.clone();
        alias.is_alias = true;
        *self.surface_refs.entry(alias.surface).or_insert(0) += 1;
        let id = self.handles.target();
        self.targets.insert(id, alias);
        Ok(id)
    }

    /// Frees `target` and its context. Unknown handles are ignored.
    pub(crate) fn free_target(&mut self, target: TargetId) {
        const FN: &str = "free_target";
        if !self.targets.contains_key(&target) {
            return;
        }
        if let Err(e) = self.flush_if(FlushTrigger::TargetState(target)) {
            log::warn!("{FN}: flush failed: {e}");
        }
        self.batch.discard_if(Some(target), None);

        let Some(t) = self.targets.remove(&target) else {
            return;
        };
        if let Some(image) = t.image() {
            if let Some(img) = self.images.get_mut(&image) {
                if img.target == Some(target) {
                    img.target = None;
                }
            }
        }
        self.contexts.remove(&target);
        if self.current_target == Some(target) {
            self.current_target = None;
        }
        for (owner, ctx) in self.contexts.iter_mut() {
            if ctx.active_target == target {
                ctx.active_target = *owner;
            }
        }

        let refs = self.surface_refs.entry(t.surface).or_insert(1);
        *refs = refs.saturating_sub(1);
        if *refs == 0 {
            self.surface_refs.remove(&t.surface);
            self.backend.free_surface(t.surface);
        }
        if self.settings.debug_level.traces() {
            log::debug!("{FN}: {target:?}");
        }
    }

    /// Makes `target`'s context current.
    pub(crate) fn make_current(&mut self, target: TargetId) -> GpuResult<()> {
        const FN: &str = "make_current";
        self.target(FN, target)?;
        if !self.contexts.contains_key(&target) {
            return Err(GpuError::user(FN, "target has no context"));
        }
        if self.current_target != Some(target) {
            self.flush_batch()?;
            self.current_target = Some(target);
        }
        Ok(())
    }

    /// Selects the target that matrix operations apply to.
    pub(crate) fn set_active_target(&mut self, target: TargetId) -> GpuResult<()> {
        const FN: &str = "set_active_target";
        self.prepare_target(FN, target)?;
        let ctx = self
            .context_mut()
            .ok_or_else(|| GpuError::user(FN, "no active context"))?;
        ctx.active_target = target;
        Ok(())
    }

    pub(crate) fn active_target(&self) -> Option<TargetId> {
        self.context().map(|c| c.active_target)
    }

    // ── resolution ────────────────────────────────────────────────────────

    pub(crate) fn set_virtual_resolution(&mut self, target: TargetId, w: u32, h: u32) -> GpuResult<()> {
        const FN: &str = "set_virtual_resolution";
        self.target(FN, target)?;
        if w == 0 || h == 0 {
            return Err(GpuError::user(FN, format!("virtual resolution {w}x{h} must be non-zero")));
        }
        self.flush_if(FlushTrigger::TargetState(target))?;
        self.target_mut(FN, target)?.set_logical_size(w, h);
        Ok(())
    }

    /// Restores the physical size and drops the clip rect, which was
    /// expressed in the old logical space.
    pub(crate) fn unset_virtual_resolution(&mut self, target: TargetId) -> GpuResult<()> {
        const FN: &str = "unset_virtual_resolution";
        self.target(FN, target)?;
        self.flush_if(FlushTrigger::TargetState(target))?;
        let t = self.target_mut(FN, target)?;
        let (w, h) = (t.base_w, t.base_h);
        t.set_logical_size(w, h);
        t.use_clip = false;
        t.clip = t.full_rect();
        Ok(())
    }

    pub(crate) fn virtual_coords(&self, target: TargetId, display_x: f32, display_y: f32) -> GpuResult<(f32, f32)> {
        let t = self.target("get_virtual_coords", target)?;
        Ok(coords::virtual_coords(t, display_x, display_y))
    }

    /// Resizes the window of the current context.
    pub(crate) fn set_window_resolution(&mut self, w: u32, h: u32) -> GpuResult<()> {
        const FN: &str = "set_window_resolution";
        let target = self
            .current_target
            .ok_or_else(|| GpuError::user(FN, "no active context"))?;
        self.resize_window_target(FN, target, w, h)
    }

    /// Applies a new physical size to a window target; the virtual
    /// resolution, if any, is kept.
    pub(crate) fn resize_window_target(
        &mut self,
        function: &'static str,
        target: TargetId,
        w: u32,
        h: u32,
    ) -> GpuResult<()> {
        if w == 0 || h == 0 {
            return Err(GpuError::user(function, format!("window size {w}x{h} must be non-zero")));
        }
        let surface = self.target(function, target)?.surface;
        if !self.contexts.contains_key(&target) {
            return Err(GpuError::user(function, "target is not a window"));
        }
        self.flush_if(FlushTrigger::ClearOrFlip)?;
        self.backend
            .set_window_resolution(surface, w, h)
            .map_err(|e| GpuError::backend(function, e))?;
        let (pw, ph) = self.backend.surface_size(surface).unwrap_or((w, h));
        self.target_mut(function, target)?.set_physical_size(pw, ph);
        if let Some(ctx) = self.contexts.get_mut(&target) {
            ctx.window_w = pw;
            ctx.window_h = ph;
            if !ctx.fullscreen {
                ctx.stored_window_w = pw;
                ctx.stored_window_h = ph;
            }
        }
        Ok(())
    }

    /// Enters or leaves fullscreen; returns the resulting state.
    pub(crate) fn set_fullscreen(&mut self, enable: bool, use_desktop_resolution: bool) -> GpuResult<bool> {
        const FN: &str = "set_fullscreen";
        let target = self
            .current_target
            .ok_or_else(|| GpuError::user(FN, "no active context"))?;
        let surface = self.target(FN, target)?.surface;
        self.flush_if(FlushTrigger::ClearOrFlip)?;
        let state = self
            .backend
            .set_fullscreen(surface, enable, use_desktop_resolution)
            .map_err(|e| GpuError::backend(FN, e))?;
        let size = self.backend.surface_size(surface);
        if let Some(ctx) = self.contexts.get_mut(&target) {
            if state && !ctx.fullscreen {
                ctx.stored_window_w = ctx.window_w;
                ctx.stored_window_h = ctx.window_h;
            }
            ctx.fullscreen = state;
            if let Some((w, h)) = size {
                ctx.window_w = w;
                ctx.window_h = h;
            }
        }
        if let Some((w, h)) = size {
            self.target_mut(FN, target)?.set_physical_size(w, h);
        }
        Ok(state)
    }

    pub(crate) fn fullscreen(&self) -> bool {
        self.context().is_some_and(|c| c.fullscreen)
    }

    // ── viewport / camera ─────────────────────────────────────────────────

    pub(crate) fn set_viewport(&mut self, target: TargetId, viewport: Rect) -> GpuResult<()> {
        const FN: &str = "set_viewport";
        self.target(FN, target)?;
        self.flush_if(FlushTrigger::TargetState(target))?;
        self.target_mut(FN, target)?.viewport = viewport;
        Ok(())
    }

    pub(crate) fn unset_viewport(&mut self, target: TargetId) -> GpuResult<()> {
        const FN: &str = "unset_viewport";
        self.target(FN, target)?;
        self.flush_if(FlushTrigger::TargetState(target))?;
        let t = self.target_mut(FN, target)?;
        t.viewport = t.full_rect();
        Ok(())
    }

    /// Replaces the camera (`None` restores the default); returns the old one.
    pub(crate) fn set_camera(&mut self, target: TargetId, camera: Option<Camera>) -> GpuResult<Camera> {
        const FN: &str = "set_camera";
        self.target(FN, target)?;
        self.flush_if(FlushTrigger::TargetState(target))?;
        let t = self.target_mut(FN, target)?;
        let old = t.camera;
        t.camera = camera.unwrap_or_default();
        // Depth bounds of the default projection come from the camera.
        if (old.z_near, old.z_far) != (t.camera.z_near, t.camera.z_far) {
            t.reset_projection();
        }
        Ok(old)
    }

    pub(crate) fn camera(&self, target: TargetId) -> GpuResult<Camera> {
        Ok(self.target("get_camera", target)?.camera)
    }

    pub(crate) fn enable_camera(&mut self, target: TargetId, enable: bool) -> GpuResult<()> {
        const FN: &str = "enable_camera";
        self.target(FN, target)?;
        self.flush_if(FlushTrigger::TargetState(target))?;
        self.target_mut(FN, target)?.use_camera = enable;
        Ok(())
    }

    pub(crate) fn is_camera_enabled(&self, target: TargetId) -> GpuResult<bool> {
        Ok(self.target("is_camera_enabled", target)?.use_camera)
    }

    // ── clipping ──────────────────────────────────────────────────────────

    /// Enables clipping to `rect`; returns the rect now in use.
    pub(crate) fn set_clip(&mut self, target: TargetId, rect: Rect) -> GpuResult<Rect> {
        const FN: &str = "set_clip";
        self.target(FN, target)?;
        self.flush_if(FlushTrigger::TargetState(target))?;
        let t = self.target_mut(FN, target)?;
        t.use_clip = true;
        t.clip = rect.normalized();
        Ok(t.clip)
    }

    pub(crate) fn unset_clip(&mut self, target: TargetId) -> GpuResult<()> {
        const FN: &str = "unset_clip";
        self.target(FN, target)?;
        self.flush_if(FlushTrigger::TargetState(target))?;
        let t = self.target_mut(FN, target)?;
        t.use_clip = false;
        t.clip = t.full_rect();
        Ok(())
    }

    pub(crate) fn clip_rect(&self, target: TargetId) -> GpuResult<Option<Rect>> {
        let t = self.target("clip_rect", target)?;
        Ok(t.use_clip.then_some(t.clip))
    }

    /// The clip rect (or the whole target when unclipped) intersected with `rect`.
    pub(crate) fn intersect_clip_rect(&self, target: TargetId, rect: Rect) -> GpuResult<Option<Rect>> {
        let t = self.target("intersect_clip_rect", target)?;
        let area = if t.use_clip { t.clip } else { t.full_rect() };
        Ok(area.intersect(rect))
    }

    pub(crate) fn intersect_target_rect(&self, target: TargetId, rect: Rect) -> GpuResult<Option<Rect>> {
        let t = self.target("intersect_target_rect", target)?;
        Ok(t.full_rect().intersect(rect))
    }

    // ── modulation ────────────────────────────────────────────────────────

    pub(crate) fn set_target_color(&mut self, target: TargetId, color: Option<Color>) -> GpuResult<()> {
        let t = self.target_mut("set_target_color", target)?;
        t.use_color = color.is_some();
        t.color = color.unwrap_or(Color::WHITE);
        Ok(())
    }

    pub(crate) fn target_info(&self, target: TargetId) -> GpuResult<TargetInfo> {
        let t = self.target("target_info", target)?;
        Ok(TargetInfo::new(t, self.contexts.contains_key(&target)))
    }
}
