//! The contract between the runtime loop and application code.

mod app;

pub use app::{App, AppControl};
