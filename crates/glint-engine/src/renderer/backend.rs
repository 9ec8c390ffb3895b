use std::sync::Arc;

use winit::window::Window;

use crate::batch::Vertex;
use crate::error::BackendError;
use crate::image::Sampling;
use crate::matrix::Mat4;
use crate::paint::BlendMode;
use crate::shader::{PreparedAttribute, ShaderBlock, ShaderKind, ShaderLanguage};

use super::{Features, InitFlags};

macro_rules! backend_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name(pub u64);
    };
}

backend_handle!(
    /// A backend texture.
    TextureHandle
);
backend_handle!(
    /// Something a backend can draw into: a window or a texture.
    SurfaceHandle
);
backend_handle!(ShaderHandle);
backend_handle!(ProgramHandle);

/// A window created by the caller that the backend should render into.
#[derive(Debug, Clone)]
pub struct WindowBinding {
    pub window: Arc<Window>,
}

impl WindowBinding {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }

    /// Stable numeric id of the window.
    pub fn id(&self) -> u64 {
        u64::from(self.window.id())
    }
}

/// Parameters for creating a window surface.
#[derive(Debug, Clone)]
pub struct WindowRequest {
    pub width: u32,
    pub height: u32,
    pub flags: InitFlags,
    /// `None` asks for a headless window surface.
    pub window: Option<WindowBinding>,
}

/// A window surface as created by a backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WindowSurface {
    pub surface: SurfaceHandle,
    pub window_id: u64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub sampling: Sampling,
}

/// Pixel rectangle in surface space.
///
/// Surface space follows the GL convention: row 0 is the bottom of a
/// window and the first row in memory of a texture.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

/// Viewport in surface space; may extend past the surface.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SurfaceViewport {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// One flushed batch.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub surface: SurfaceHandle,
    pub texture: Option<TextureHandle>,
    pub viewport: SurfaceViewport,
    pub scissor: Option<PixelRect>,
    /// `None` disables blending.
    pub blend: Option<BlendMode>,
    /// Final transform into normalized device coordinates of the surface.
    pub mvp: Mat4,
    /// `None` draws with the backend's built-in program.
    pub program: Option<ProgramHandle>,
    pub block: ShaderBlock,
    pub vertices: &'a [Vertex],
    pub indices: &'a [u32],
    pub attributes: &'a [PreparedAttribute],
    /// Raw uniform words keyed by location.
    pub uniforms: &'a [(u32, Vec<u32>)],
}

/// The device seam every renderer backend implements.
///
/// The core validates handles, batches geometry and applies every
/// coordinate convention before calling in; backends only execute.
/// Optional capabilities default to [`BackendError::Unsupported`].
pub trait Backend {
    fn name(&self) -> &'static str;

    fn features(&self) -> Features;

    // ── lifecycle ─────────────────────────────────────────────────────────

    /// Creates the device and the first window surface.
    fn init(&mut self, request: &WindowRequest) -> Result<WindowSurface, BackendError>;

    /// Releases every resource; the backend is dropped afterwards.
    fn quit(&mut self);

    /// Creates an additional window surface on the same device.
    fn add_window(&mut self, _request: &WindowRequest) -> Result<WindowSurface, BackendError> {
        Err(BackendError::Unsupported("multiple windows"))
    }

    fn set_window_resolution(&mut self, surface: SurfaceHandle, width: u32, height: u32) -> Result<(), BackendError>;

    /// Returns the resulting fullscreen state.
    fn set_fullscreen(&mut self, _surface: SurfaceHandle, _enable: bool, _use_desktop_resolution: bool) -> Result<bool, BackendError> {
        Err(BackendError::Unsupported("fullscreen"))
    }

    // ── textures ──────────────────────────────────────────────────────────

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle, BackendError>;

    /// Writes tightly packed RGBA8 rows into `region` (first row at `region.y`).
    fn update_texture(&mut self, texture: TextureHandle, region: PixelRect, rgba: &[u8]) -> Result<(), BackendError>;

    /// Whole texture as tightly packed RGBA8, in memory row order.
    fn read_texture(&mut self, texture: TextureHandle) -> Result<Vec<u8>, BackendError>;

    fn set_texture_sampling(&mut self, texture: TextureHandle, sampling: Sampling) -> Result<(), BackendError>;

    fn generate_mipmaps(&mut self, _texture: TextureHandle) -> Result<(), BackendError> {
        Err(BackendError::Unsupported("mipmaps"))
    }

    fn free_texture(&mut self, texture: TextureHandle);

    // ── surfaces ──────────────────────────────────────────────────────────

    /// Makes a texture renderable.
    fn create_surface(&mut self, _texture: TextureHandle) -> Result<SurfaceHandle, BackendError> {
        Err(BackendError::Unsupported("render targets"))
    }

    fn free_surface(&mut self, surface: SurfaceHandle);

    /// Size of a surface in physical pixels.
    fn surface_size(&self, surface: SurfaceHandle) -> Option<(u32, u32)>;

    // ── drawing ───────────────────────────────────────────────────────────

    fn clear(&mut self, surface: SurfaceHandle, color: [f32; 4], scissor: Option<PixelRect>) -> Result<(), BackendError>;

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), BackendError>;

    /// RGBA8 of one surface pixel; `row` in surface space.
    fn read_pixel(&mut self, surface: SurfaceHandle, x: u32, row: u32) -> Result<[u8; 4], BackendError>;

    /// Whole surface as tightly packed RGBA8, surface row 0 first.
    fn read_surface(&mut self, surface: SurfaceHandle) -> Result<Vec<u8>, BackendError>;

    /// Shows the window surface's contents.
    fn present(&mut self, surface: SurfaceHandle) -> Result<(), BackendError>;

    // ── shaders ───────────────────────────────────────────────────────────

    fn shader_language(&self) -> (ShaderLanguage, u32) {
        (ShaderLanguage::None, 0)
    }

    fn compile_shader(&mut self, _kind: ShaderKind, _source: &str) -> Result<ShaderHandle, BackendError> {
        Err(BackendError::Unsupported("shaders"))
    }

    fn free_shader(&mut self, _shader: ShaderHandle) {}

    fn create_program(&mut self) -> Result<ProgramHandle, BackendError> {
        Err(BackendError::Unsupported("shaders"))
    }

    fn attach_shader(&mut self, _program: ProgramHandle, _shader: ShaderHandle) -> Result<(), BackendError> {
        Err(BackendError::Unsupported("shaders"))
    }

    fn detach_shader(&mut self, _program: ProgramHandle, _shader: ShaderHandle) -> Result<(), BackendError> {
        Err(BackendError::Unsupported("shaders"))
    }

    fn link_program(&mut self, _program: ProgramHandle) -> Result<(), BackendError> {
        Err(BackendError::Unsupported("shaders"))
    }

    fn free_program(&mut self, _program: ProgramHandle) {}

    fn attribute_location(&self, _program: ProgramHandle, _name: &str) -> Option<u32> {
        None
    }

    fn uniform_location(&self, _program: ProgramHandle, _name: &str) -> Option<u32> {
        None
    }
}
