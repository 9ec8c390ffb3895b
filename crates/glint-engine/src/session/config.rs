use crate::batch::{DEFAULT_BLIT_BUFFER_INDICES, DEFAULT_BLIT_BUFFER_VERTICES};
use crate::error::DEFAULT_MAX_ERROR_QUEUE;
use crate::logging::DebugLevel;
use crate::matrix::DEFAULT_MAX_MATRIX_DEPTH;
use crate::renderer::registry::{DEFAULT_MAX_ACTIVE_RENDERERS, DEFAULT_MAX_REGISTERED_RENDERERS};
use crate::renderer::{Platform, RendererSettings};

/// Maximum number of window-to-target mappings unless configured otherwise.
pub const DEFAULT_MAX_WINDOW_MAPPINGS: usize = 10;

/// Limits and defaults of a [`Session`](super::Session).
///
/// Keep the defaults conservative; every limit can be raised per session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of the error stack.
    pub max_error_queue: usize,

    /// Capacity of the renderer registry (and of the init order).
    pub max_registered_renderers: usize,

    /// How many renderers may be live at once.
    pub max_active_renderers: usize,

    /// Depth limit of every matrix stack.
    pub max_matrix_depth: usize,

    /// Vertex capacity of the blit buffer.
    pub blit_buffer_vertices: usize,

    /// Index capacity of the blit buffer.
    pub blit_buffer_indices: usize,

    /// How many windows may be mapped to targets.
    pub max_window_mappings: usize,

    pub debug_level: DebugLevel,

    /// Picks the default renderer order.
    pub platform: Platform,

    /// Register the crate's built-in backends on creation.
    pub register_builtin_renderers: bool,
}

impl SessionConfig {
    pub(crate) fn renderer_settings(&self) -> RendererSettings {
        RendererSettings {
            max_matrix_depth: self.max_matrix_depth,
            blit_buffer_vertices: self.blit_buffer_vertices.max(3),
            blit_buffer_indices: self.blit_buffer_indices.max(3),
            debug_level: self.debug_level,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_error_queue: DEFAULT_MAX_ERROR_QUEUE,
            max_registered_renderers: DEFAULT_MAX_REGISTERED_RENDERERS,
            max_active_renderers: DEFAULT_MAX_ACTIVE_RENDERERS,
            max_matrix_depth: DEFAULT_MAX_MATRIX_DEPTH,
            blit_buffer_vertices: DEFAULT_BLIT_BUFFER_VERTICES,
            blit_buffer_indices: DEFAULT_BLIT_BUFFER_INDICES,
            max_window_mappings: DEFAULT_MAX_WINDOW_MAPPINGS,
            debug_level: DebugLevel::Level0,
            platform: Platform::current(),
            register_builtin_renderers: true,
        }
    }
}
