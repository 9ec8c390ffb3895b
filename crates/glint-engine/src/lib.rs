//! Glint engine crate.
//!
//! A 2D rendering layer over interchangeable GPU backends: images and
//! render targets, batched blits, shapes, a matrix stack and user shaders,
//! all driven through one [`Session`](session::Session).

pub mod backends;
pub mod batch;
pub mod core;
pub mod error;
pub mod handle;
pub mod image;
pub mod matrix;
pub mod renderer;
pub mod session;
pub mod shader;
pub mod shapes;
pub mod target;
pub mod window;

pub mod coords;
pub mod logging;
pub mod paint;

pub use session::{Session, SessionConfig};
