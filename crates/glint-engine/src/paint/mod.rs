//! Colors and blend state.

pub mod blend;
pub mod color;

pub use blend::{BlendEq, BlendFunc, BlendMode, BlendPreset, BlendSupport};
pub use color::Color;
