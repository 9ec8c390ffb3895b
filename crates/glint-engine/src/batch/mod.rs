//! Blit batching: buffered vertices, flush triggers and batch layouts.
//!
//! All flush decisions go through [`PendingBatch::must_flush_before`].

mod flags;
mod pending;
mod vertex;

pub use flags::{BatchFlags, LayoutError, VertexLayout};
pub use pending::{BatchKey, FlushTrigger, PendingBatch};
pub use vertex::Vertex;

/// Default blit buffer capacity in vertices.
pub const DEFAULT_BLIT_BUFFER_VERTICES: usize = 60_000;
/// Default blit buffer capacity in indices.
pub const DEFAULT_BLIT_BUFFER_INDICES: usize = 90_000;
