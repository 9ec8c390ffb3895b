//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window and binds the window to a
//! [`Session`](crate::session::Session) renderer.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
