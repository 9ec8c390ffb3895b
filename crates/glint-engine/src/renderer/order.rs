use super::id::{RendererId, RendererKind};

/// Deployment hint used to pick the default renderer order.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Platform {
    #[default]
    Desktop,
    Mobile,
}

impl Platform {
    /// The platform this crate was compiled for.
    pub fn current() -> Self {
        if cfg!(any(target_os = "android", target_os = "ios")) {
            Platform::Mobile
        } else {
            Platform::Desktop
        }
    }
}

pub const VULKAN: RendererId = RendererId::new("Vulkan", RendererKind::Vulkan, 1, 3);
pub const VULKAN_MOBILE: RendererId = RendererId::new("Vulkan", RendererKind::Vulkan, 1, 1);
pub const METAL: RendererId = RendererId::new("Metal", RendererKind::Metal, 2, 0);
pub const DIRECT3D12: RendererId = RendererId::new("Direct3D 12", RendererKind::Direct3D12, 12, 0);
pub const DIRECT3D11: RendererId = RendererId::new("Direct3D 11", RendererKind::Direct3D11, 11, 0);
pub const OPENGL: RendererId = RendererId::new("OpenGL", RendererKind::OpenGl, 3, 3);
pub const GLES: RendererId = RendererId::new("OpenGLES", RendererKind::Gles, 3, 0);
pub const SOFTWARE: RendererId = RendererId::new("Software", RendererKind::Software, 1, 0);

/// Preferred initialization order, most capable tier first.
pub fn default_renderer_order(platform: Platform) -> Vec<RendererId> {
    match platform {
        Platform::Desktop => vec![VULKAN, METAL, DIRECT3D12, OPENGL, GLES, SOFTWARE],
        Platform::Mobile => vec![GLES, VULKAN_MOBILE, METAL, SOFTWARE],
    }
}
