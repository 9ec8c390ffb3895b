use core::fmt;

/// Backend family.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum RendererKind {
    #[default]
    Unknown,
    Software,
    OpenGl,
    Gles,
    Vulkan,
    Metal,
    Direct3D11,
    Direct3D12,
    /// Caller-defined backend family.
    User(u32),
}

impl RendererKind {
    pub fn name(self) -> &'static str {
        match self {
            RendererKind::Unknown => "unknown",
            RendererKind::Software => "software",
            RendererKind::OpenGl => "opengl",
            RendererKind::Gles => "gles",
            RendererKind::Vulkan => "vulkan",
            RendererKind::Metal => "metal",
            RendererKind::Direct3D11 => "direct3d11",
            RendererKind::Direct3D12 => "direct3d12",
            RendererKind::User(_) => "user",
        }
    }
}

/// Identifies a backend: a display name, its family and a version tier.
///
/// Registry lookups match on `kind` only; the version is informational
/// and orders preferences within a family.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RendererId {
    pub name: &'static str,
    pub kind: RendererKind,
    pub major: u32,
    pub minor: u32,
}

impl RendererId {
    pub const fn new(name: &'static str, kind: RendererKind, major: u32, minor: u32) -> Self {
        Self { name, kind, major, minor }
    }

    pub const fn unknown() -> Self {
        Self::new("unknown", RendererKind::Unknown, 0, 0)
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.kind == RendererKind::Unknown
    }
}

impl Default for RendererId {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}", self.name, self.major, self.minor)
    }
}

/// Free-function constructor mirroring the rest of the registry API.
pub const fn make_renderer_id(name: &'static str, kind: RendererKind, major: u32, minor: u32) -> RendererId {
    RendererId::new(name, kind, major, minor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_version() {
        let id = make_renderer_id("Vulkan", RendererKind::Vulkan, 1, 3);
        assert_eq!(id.to_string(), "Vulkan 1.3");
    }

    #[test]
    fn default_is_unknown() {
        assert!(RendererId::default().is_unknown());
        assert_eq!(RendererKind::User(7).name(), "user");
    }
}
