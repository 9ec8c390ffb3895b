//! Shader programs, attribute streams and uniform values.
//!
//! The backend compiles and links; the core keeps uniform values and
//! attribute sources and hands them over with each draw call.

mod attribute;
mod uniform;

pub use attribute::{
    Attribute, AttributeError, AttributeFormat, AttributeSource, AttributeType, PreparedAttribute,
    constant_attribute, expand_per_sprite, prepare_for_draw,
};
pub use uniform::UniformValue;

pub const DEFAULT_POSITION_NAME: &str = "gpu_Vertex";
pub const DEFAULT_TEXCOORD_NAME: &str = "gpu_TexCoord";
pub const DEFAULT_COLOR_NAME: &str = "gpu_Color";
pub const DEFAULT_MVP_NAME: &str = "gpu_ModelViewProjectionMatrix";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

/// Source language a backend compiles.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum ShaderLanguage {
    #[default]
    None,
    Glsl,
    Glsles,
    Wgsl,
    Custom,
}

/// Where the built-in vertex stream and matrix bind in a program.
///
/// A `None` location means the program does not consume that input.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct ShaderBlock {
    pub position_loc: Option<u32>,
    pub texcoord_loc: Option<u32>,
    pub color_loc: Option<u32>,
    pub modelviewprojection_loc: Option<u32>,
}

impl ShaderBlock {
    /// Layout of the backends' built-in program.
    pub const fn builtin() -> Self {
        Self {
            position_loc: Some(0),
            texcoord_loc: Some(1),
            color_loc: Some(2),
            modelviewprojection_loc: None,
        }
    }
}
