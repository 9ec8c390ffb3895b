//! Geometry types shared by the session API and the renderers.
//!
//! Client space:
//! - logical pixels of the target being drawn to
//! - origin top-left
//! - +X right, +Y down
//!
//! Conversion to physical/surface space lives in `target::coords`.

mod rect;
mod vec2;

pub use rect::Rect;
pub use vec2::Vec2;
