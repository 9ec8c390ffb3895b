use bitflags::bitflags;

bitflags! {
    /// Capabilities a backend advertises.
    ///
    /// Checked against the session's required features at init and before
    /// feature-dependent operations (render targets, shaders, mipmaps).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Features: u32 {
        const NON_POWER_OF_TWO = 1 << 0;
        const RENDER_TARGETS = 1 << 1;
        const BLEND_EQUATIONS = 1 << 2;
        const BLEND_FUNC_SEPARATE = 1 << 3;
        const BLEND_EQUATIONS_SEPARATE = 1 << 4;
        const WRAP_REPEAT_MIRRORED = 1 << 5;
        const MIPMAPS = 1 << 6;
        const VERTEX_SHADER = 1 << 7;
        const FRAGMENT_SHADER = 1 << 8;
        const READBACK = 1 << 9;
        const MULTIPLE_WINDOWS = 1 << 10;

        const ALL_BLEND_PRESETS = Self::BLEND_EQUATIONS.bits()
            | Self::BLEND_FUNC_SEPARATE.bits()
            | Self::BLEND_EQUATIONS_SEPARATE.bits();
        const BASIC_SHADERS = Self::VERTEX_SHADER.bits() | Self::FRAGMENT_SHADER.bits();
        const ALL_BASE = Self::RENDER_TARGETS.bits() | Self::NON_POWER_OF_TWO.bits();
    }
}

bitflags! {
    /// Window and context options passed to `init`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InitFlags: u32 {
        const DISABLE_VSYNC = 1 << 0;
        const ENABLE_VSYNC = 1 << 1;
        const DISABLE_DOUBLE_BUFFER = 1 << 2;
        const DISABLE_AUTO_VIRTUAL_RESOLUTION = 1 << 3;
        const REQUEST_COMPATIBILITY_PROFILE = 1 << 4;
        const RESIZABLE = 1 << 5;
        const FULLSCREEN = 1 << 6;
        const HIDDEN = 1 << 7;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_flags() {
        assert!(Features::ALL_BLEND_PRESETS.contains(Features::BLEND_EQUATIONS));
        assert!(Features::BASIC_SHADERS.contains(Features::VERTEX_SHADER | Features::FRAGMENT_SHADER));
        assert!(!Features::ALL_BASE.contains(Features::MIPMAPS));
    }
}
