use crate::error::{ErrorCode, GpuError, GpuResult};
use crate::handle::TargetId;
use crate::renderer::registry::{CreateFn, FreeHook, RegistryError};
use crate::renderer::{
    Features, InitFlags, Renderer, RendererId, RendererKind, WindowBinding, WindowRequest,
    default_renderer_order,
};

use super::{Session, WindowMapping};

impl Session {
    // ── registry ──────────────────────────────────────────────────────────

    /// Makes a backend available to `init`. Failures are logged only.
    pub fn register_renderer(&mut self, id: RendererId, create: CreateFn, free: Option<FreeHook>) -> bool {
        match self.registry.register(id, create, free) {
            Ok(()) => {
                log::debug!("registered renderer {id}");
                true
            }
            Err(e) => {
                log::warn!("register_renderer: {e}");
                false
            }
        }
    }

    pub fn registered_renderers(&self) -> Vec<RendererId> {
        self.registry.ids()
    }

    pub fn active_renderers(&self) -> Vec<RendererId> {
        self.active.ids()
    }

    pub fn renderer_order(&self) -> &[RendererId] {
        self.registry.order()
    }

    /// Replaces the order `init` tries renderers in; `None` restores the
    /// platform default.
    pub fn set_renderer_order(&mut self, order: Option<Vec<RendererId>>) {
        let order = order.unwrap_or_else(|| default_renderer_order(self.config.platform));
        self.registry.set_order(order);
    }

    pub fn default_renderer_order(&self) -> Vec<RendererId> {
        default_renderer_order(self.config.platform)
    }

    /// Features a renderer must report for `init` to accept it.
    pub fn set_required_features(&mut self, features: Features) {
        self.required_features = features;
    }

    pub fn required_features(&self) -> Features {
        self.required_features
    }

    fn create_renderer(&mut self, id: RendererId) -> GpuResult<Renderer> {
        const FN: &str = "create_renderer";
        let backend = self.registry.create(id).map_err(|e| match e {
            RegistryError::Create { source, .. } => GpuError::backend(FN, source),
            other => GpuError::data(FN, other.to_string()),
        })?;
        Ok(Renderer::new(
            id,
            id,
            backend,
            self.handles.clone(),
            self.config.renderer_settings(),
        ))
    }

    fn add_renderer_inner(&mut self, id: RendererId) -> GpuResult<RendererKind> {
        const FN: &str = "add_renderer";
        if self.active.get(id.kind).is_some() {
            return Ok(id.kind);
        }
        if self.active.is_full() {
            return Err(GpuError::user(
                FN,
                format!("no free renderer slot for {id} ({} active)", self.active.len()),
            ));
        }
        let renderer = self.create_renderer(id)?;
        if let Err(renderer) = self.active.insert(renderer) {
            self.registry.notify_freed(renderer.id());
            return Err(GpuError::user(FN, "renderer table is full"));
        }
        Ok(id.kind)
    }

    /// Live renderer for `id`'s family, created from the registry when
    /// missing.
    pub fn add_renderer(&mut self, id: RendererId) -> Option<RendererId> {
        let result = self.add_renderer_inner(id);
        let kind = self.check(result)?;
        self.active.get(kind).map(Renderer::id)
    }

    pub fn get_renderer(&self, id: RendererId) -> Option<&Renderer> {
        self.active.get(id.kind)
    }

    pub fn get_renderer_mut(&mut self, id: RendererId) -> Option<&mut Renderer> {
        self.active.get_mut(id.kind)
    }

    pub fn renderer_by_name(&self, name: &str) -> Option<RendererId> {
        self.active.ids().into_iter().find(|id| id.name == name)
    }

    /// Shuts a renderer down and releases everything created through it.
    /// Unknown ids are ignored.
    pub fn free_renderer(&mut self, id: RendererId) {
        self.teardown(id.kind);
    }

    fn teardown(&mut self, kind: RendererKind) {
        self.windows.retain(|m| m.renderer != kind);
        if self.current == Some(kind) {
            self.current = None;
        }
        if let Some(mut renderer) = self.active.remove(kind) {
            renderer.shutdown();
            self.registry.notify_freed(renderer.id());
        }
    }

    pub fn current_renderer_id(&self) -> Option<RendererId> {
        self.current_renderer().map(Renderer::id)
    }

    /// Switches the current renderer; an inactive id leaves none current.
    pub fn set_current_renderer(&mut self, id: RendererId) {
        self.current = self.active.get(id.kind).map(|_| id.kind);
    }

    // ── init ──────────────────────────────────────────────────────────────

    /// Tries every renderer in [`renderer_order`](Self::renderer_order);
    /// returns the window target of the first that initializes.
    pub fn init(&mut self, w: u32, h: u32, flags: InitFlags) -> Option<TargetId> {
        self.init_from_order(WindowRequest {
            width: w,
            height: h,
            flags,
            window: None,
        })
    }

    /// [`init`](Self::init) rendering into a caller-created window.
    pub fn init_with_window(&mut self, window: WindowBinding, flags: InitFlags) -> Option<TargetId> {
        let size = window.window.inner_size();
        self.init_from_order(WindowRequest {
            width: size.width,
            height: size.height,
            flags,
            window: Some(window),
        })
    }

    fn init_from_order(&mut self, request: WindowRequest) -> Option<TargetId> {
        let order = self.registry.order().to_vec();
        for id in &order {
            match self.try_init("init", *id, request.clone()) {
                Ok(target) => return Some(target),
                Err(e) => {
                    if self.debug_level.logs_selection() {
                        log::warn!("renderer {id} failed to initialize: {e}");
                    }
                }
            }
        }
        self.push_error(
            "init",
            ErrorCode::BackendError,
            &format!("No renderer out of {} could be initialized", order.len()),
        );
        None
    }

    /// Initializes the registered renderer of `kind`.
    pub fn init_renderer(&mut self, kind: RendererKind, w: u32, h: u32, flags: InitFlags) -> Option<TargetId> {
        let id = self
            .registry
            .order()
            .iter()
            .copied()
            .find(|id| id.kind == kind)
            .or_else(|| self.registry.find(kind).map(|r| r.id));
        let Some(id) = id else {
            self.push_error(
                "init_renderer",
                ErrorCode::DataError,
                &format!("no {} renderer is registered", kind.name()),
            );
            return None;
        };
        self.init_renderer_by_id(id, w, h, flags)
    }

    pub fn init_renderer_by_id(&mut self, id: RendererId, w: u32, h: u32, flags: InitFlags) -> Option<TargetId> {
        let request = WindowRequest {
            width: w,
            height: h,
            flags,
            window: None,
        };
        let result = self.try_init("init_renderer_by_id", id, request);
        self.check(result)
    }

    pub fn init_renderer_with_window(
        &mut self,
        id: RendererId,
        window: WindowBinding,
        flags: InitFlags,
    ) -> Option<TargetId> {
        let size = window.window.inner_size();
        let request = WindowRequest {
            width: size.width,
            height: size.height,
            flags,
            window: Some(window),
        };
        let result = self.try_init("init_renderer_with_window", id, request);
        self.check(result)
    }

    /// One full attempt; a failure leaves no trace of the renderer.
    fn try_init(&mut self, function: &'static str, id: RendererId, request: WindowRequest) -> GpuResult<TargetId> {
        if self.debug_level.logs_selection() {
            log::warn!("{function}: trying renderer {id}");
        }
        if self.active.get(id.kind).is_some() {
            return Err(GpuError::user(
                function,
                format!("{id} is already initialized; use create_target_from_window"),
            ));
        }
        let kind = self.add_renderer_inner(id)?;
        let required = self.required_features;
        let attempt = match self.active.get_mut(kind) {
            Some(renderer) => renderer.init_window(&request).and_then(|target| {
                if renderer.features().contains(required) {
                    Ok((target, renderer.target(function, target)?.window_id()))
                } else {
                    Err(GpuError::backend(
                        function,
                        crate::error::BackendError::Unsupported("required features"),
                    ))
                }
            }),
            None => Err(GpuError::user(function, "renderer vanished during init")),
        };
        match attempt {
            Ok((target, window_id)) => {
                self.current = Some(kind);
                if let Some(window_id) = window_id {
                    self.map_window(window_id, kind, target);
                }
                Ok(target)
            }
            Err(e) => {
                self.teardown(kind);
                Err(e)
            }
        }
    }

    /// Adds a window to the current renderer.
    pub fn create_target_from_window(&mut self, window: WindowBinding) -> Option<TargetId> {
        const FN: &str = "create_target_from_window";
        if let Some(existing) = self.window_target(window.id()) {
            return Some(existing);
        }
        let size = window.window.inner_size();
        let request = WindowRequest {
            width: size.width,
            height: size.height,
            flags: InitFlags::empty(),
            window: Some(window),
        };
        let kind = self.current;
        let (target, window_id) = self.dispatch(FN, |r| {
            let target = r.add_window(&request)?;
            Ok((target, r.target(FN, target)?.window_id()))
        })?;
        if let (Some(kind), Some(window_id)) = (kind, window_id) {
            self.map_window(window_id, kind, target);
        }
        Some(target)
    }

    /// The current renderer's context target (normally its window).
    pub fn display_target(&self) -> Option<TargetId> {
        self.current_renderer().and_then(Renderer::current_target)
    }

    /// Frees every renderer and clears the error stack. Registrations
    /// survive.
    pub fn quit(&mut self) {
        self.current = None;
        self.windows.clear();
        for mut renderer in self.active.drain() {
            renderer.shutdown();
            self.registry.notify_freed(renderer.id());
        }
        self.errors.clear();
    }

    // ── window table ──────────────────────────────────────────────────────

    fn map_window(&mut self, window_id: u64, renderer: RendererKind, target: TargetId) {
        self.windows.retain(|m| m.window_id != window_id);
        if self.windows.len() >= self.config.max_window_mappings {
            self.push_error(
                "map_window",
                ErrorCode::UserError,
                &format!("window table is full ({} entries)", self.windows.len()),
            );
            return;
        }
        self.windows.push(WindowMapping {
            window_id,
            renderer,
            target,
        });
    }

    /// Target rendering into `window_id`, if mapped.
    pub fn window_target(&self, window_id: u64) -> Option<TargetId> {
        self.windows
            .iter()
            .find(|m| m.window_id == window_id)
            .map(|m| m.target)
    }

    /// Follows a window resize: the window target keeps its logical size
    /// under virtual resolution, otherwise it tracks the window.
    pub fn handle_window_resized(&mut self, window_id: u64, w: u32, h: u32) -> bool {
        const FN: &str = "handle_window_resized";
        let Some(mapping) = self.windows.iter().find(|m| m.window_id == window_id).copied() else {
            return false;
        };
        let result = match self.active.get_mut(mapping.renderer) {
            Some(r) => r.resize_window_target(FN, mapping.target, w, h),
            None => Err(GpuError::user(FN, "window belongs to a freed renderer")),
        };
        self.check(result).is_some()
    }
}
