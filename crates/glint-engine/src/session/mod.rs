//! The public API object.
//!
//! A [`Session`] owns the renderer registry, the live renderers, the window
//! table and the error stack. Every operation resolves the current renderer,
//! forwards to it, and turns failures into error-stack entries plus a
//! sentinel return (`None`, `false` or nothing). Nothing here panics.

mod config;
mod draw;
mod images;
mod init;
mod matrix;
mod shaders;
mod targets;

pub use config::{DEFAULT_MAX_WINDOW_MAPPINGS, SessionConfig};

use crate::error::{ErrorCode, ErrorObject, ErrorStack, GpuError, GpuResult};
use crate::handle::{HandleAllocator, TargetId};
use crate::logging::DebugLevel;
use crate::paint::{BlendMode, BlendPreset, BlendSupport};
use crate::renderer::registry::{ActiveRenderers, Registry};
use crate::renderer::{Features, Renderer, RendererKind, default_renderer_order};

/// A window mapped to the target that renders into it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct WindowMapping {
    window_id: u64,
    renderer: RendererKind,
    target: TargetId,
}

pub struct Session {
    config: SessionConfig,
    errors: ErrorStack,
    debug_level: DebugLevel,

    registry: Registry,
    active: ActiveRenderers,
    current: Option<RendererKind>,
    required_features: Features,

    handles: HandleAllocator,
    windows: Vec<WindowMapping>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let registry = Registry::new(
            config.max_registered_renderers,
            default_renderer_order(config.platform),
        );
        let mut session = Self {
            errors: ErrorStack::with_capacity(config.max_error_queue),
            debug_level: config.debug_level,
            registry,
            active: ActiveRenderers::new(config.max_active_renderers),
            current: None,
            required_features: Features::empty(),
            handles: HandleAllocator::default(),
            windows: Vec::with_capacity(config.max_window_mappings),
            config,
        };
        if session.config.register_builtin_renderers {
            crate::backends::register_builtin(&mut session);
        }
        session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ── error stack ───────────────────────────────────────────────────────

    /// Records an error. Dropped (but still logged) when the stack is full.
    pub fn push_error(&mut self, function: &str, code: ErrorCode, details: &str) {
        if self.debug_level.logs_errors() {
            log::error!("{function}: {code}: {details}");
        }
        if !self.errors.push(function, code, details) && self.debug_level.logs_errors() {
            log::error!("error stack full; dropped the error above");
        }
    }

    /// Most recent error; [`ErrorObject::none`] when there is none.
    pub fn pop_error(&mut self) -> ErrorObject {
        self.errors.pop()
    }

    pub fn error_queue_len(&self) -> usize {
        self.errors.len()
    }

    /// Resizes the error stack, dropping what it holds.
    pub fn set_error_queue_max(&mut self, max: usize) {
        self.config.max_error_queue = max;
        self.errors.set_max(max);
    }

    pub fn error_string(code: ErrorCode) -> &'static str {
        code.as_str()
    }

    pub fn set_debug_level(&mut self, level: DebugLevel) {
        self.debug_level = level;
        self.config.debug_level = level;
        for renderer in self.active.iter_mut() {
            renderer.set_debug_level(level);
        }
    }

    pub fn debug_level(&self) -> DebugLevel {
        self.debug_level
    }

    pub(crate) fn record(&mut self, err: GpuError) {
        self.push_error(err.function, err.code, &err.details);
    }

    pub(crate) fn check<T>(&mut self, result: GpuResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.record(e);
                None
            }
        }
    }

    // ── dispatch ──────────────────────────────────────────────────────────

    pub fn current_renderer(&self) -> Option<&Renderer> {
        self.current.and_then(|kind| self.active.get(kind))
    }

    pub fn current_renderer_mut(&mut self) -> Option<&mut Renderer> {
        self.current.and_then(|kind| self.active.get_mut(kind))
    }

    /// Runs `f` on the current renderer, recording its error.
    pub(crate) fn dispatch<T>(
        &mut self,
        function: &'static str,
        f: impl FnOnce(&mut Renderer) -> GpuResult<T>,
    ) -> Option<T> {
        let result = match self.current_renderer_mut() {
            Some(renderer) => f(renderer),
            None => Err(GpuError::user(function, "no current renderer")),
        };
        self.check(result)
    }

    /// [`dispatch`](Self::dispatch) for operations that cannot fail once a
    /// renderer is current.
    pub(crate) fn dispatch_infallible<T>(
        &mut self,
        function: &'static str,
        f: impl FnOnce(&mut Renderer) -> T,
    ) -> Option<T> {
        self.dispatch(function, |r| Ok(f(r)))
    }

    /// Whether `preset` blends exactly on the current renderer.
    pub fn blend_support(&self, preset: BlendPreset) -> BlendSupport {
        let features = self
            .current_renderer()
            .map_or(Features::empty(), Renderer::features);
        BlendMode::from_preset(preset).support(features)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.active.is_empty() {
            self.quit();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("registered", &self.registry.ids())
            .field("active", &self.active.ids())
            .field("current", &self.current)
            .field("errors", &self.errors.len())
            .finish()
    }
}
