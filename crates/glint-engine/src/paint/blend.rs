use crate::renderer::Features;

/// Blend factor applied to the source or destination term.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendFunc {
    Zero,
    One,
    SrcColor,
    DstColor,
    OneMinusSrc,
    OneMinusDst,
    SrcAlpha,
    DstAlpha,
    OneMinusSrcAlpha,
    OneMinusDstAlpha,
}

/// How the weighted source and destination are combined.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BlendEq {
    #[default]
    Add,
    /// `src - dst`
    Subtract,
    /// `dst - src`
    ReverseSubtract,
}

/// Named blend configurations.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BlendPreset {
    #[default]
    Normal,
    PremultipliedAlpha,
    Multiply,
    Add,
    Subtract,
    ModAlpha,
    SetAlpha,
    Set,
    NormalKeepAlpha,
    NormalAddAlpha,
    NormalFactorAlpha,
}

impl BlendPreset {
    pub const ALL: [BlendPreset; 11] = [
        BlendPreset::Normal,
        BlendPreset::PremultipliedAlpha,
        BlendPreset::Multiply,
        BlendPreset::Add,
        BlendPreset::Subtract,
        BlendPreset::ModAlpha,
        BlendPreset::SetAlpha,
        BlendPreset::Set,
        BlendPreset::NormalKeepAlpha,
        BlendPreset::NormalAddAlpha,
        BlendPreset::NormalFactorAlpha,
    ];
}

/// Full blend state: separate color/alpha factors and equations.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BlendMode {
    pub source_color: BlendFunc,
    pub dest_color: BlendFunc,
    pub source_alpha: BlendFunc,
    pub dest_alpha: BlendFunc,
    pub color_equation: BlendEq,
    pub alpha_equation: BlendEq,
}

impl Default for BlendMode {
    fn default() -> Self {
        BlendMode::from_preset(BlendPreset::Normal)
    }
}

/// Whether a backend can express a blend mode exactly.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendSupport {
    Exact,
    /// Drawn with [`BlendMode::degrade`]d state.
    Degraded,
}

impl BlendMode {
    pub const fn new(
        source_color: BlendFunc,
        dest_color: BlendFunc,
        source_alpha: BlendFunc,
        dest_alpha: BlendFunc,
        color_equation: BlendEq,
        alpha_equation: BlendEq,
    ) -> Self {
        Self {
            source_color,
            dest_color,
            source_alpha,
            dest_alpha,
            color_equation,
            alpha_equation,
        }
    }

    pub const fn from_preset(preset: BlendPreset) -> Self {
        use BlendEq::{Add, Subtract};
        use BlendFunc::*;
        match preset {
            BlendPreset::Normal => Self::new(SrcAlpha, OneMinusSrcAlpha, SrcAlpha, OneMinusSrcAlpha, Add, Add),
            BlendPreset::PremultipliedAlpha => Self::new(One, OneMinusSrcAlpha, One, OneMinusSrcAlpha, Add, Add),
            BlendPreset::Multiply => Self::new(DstColor, Zero, SrcAlpha, OneMinusSrcAlpha, Add, Add),
            BlendPreset::Add => Self::new(SrcAlpha, One, SrcAlpha, One, Add, Add),
            BlendPreset::Subtract => Self::new(One, One, One, One, Subtract, Subtract),
            BlendPreset::ModAlpha => Self::new(Zero, One, Zero, SrcAlpha, Add, Add),
            BlendPreset::SetAlpha => Self::new(Zero, One, One, Zero, Add, Add),
            BlendPreset::Set => Self::new(One, Zero, One, Zero, Add, Add),
            BlendPreset::NormalKeepAlpha => Self::new(SrcAlpha, OneMinusSrcAlpha, Zero, One, Add, Add),
            BlendPreset::NormalAddAlpha => Self::new(SrcAlpha, OneMinusSrcAlpha, One, One, Add, Add),
            BlendPreset::NormalFactorAlpha => {
                Self::new(SrcAlpha, OneMinusSrcAlpha, OneMinusDstAlpha, One, Add, Add)
            }
        }
    }

    #[inline]
    pub fn with_function(mut self, source_color: BlendFunc, dest_color: BlendFunc, source_alpha: BlendFunc, dest_alpha: BlendFunc) -> Self {
        self.source_color = source_color;
        self.dest_color = dest_color;
        self.source_alpha = source_alpha;
        self.dest_alpha = dest_alpha;
        self
    }

    #[inline]
    pub fn with_equation(mut self, color_equation: BlendEq, alpha_equation: BlendEq) -> Self {
        self.color_equation = color_equation;
        self.alpha_equation = alpha_equation;
        self
    }

    /// Backend capabilities this mode needs to be drawn exactly.
    pub fn required_features(&self) -> Features {
        let mut f = Features::empty();
        if self.color_equation != BlendEq::Add || self.alpha_equation != BlendEq::Add {
            f |= Features::BLEND_EQUATIONS;
        }
        if self.color_equation != self.alpha_equation {
            f |= Features::BLEND_EQUATIONS_SEPARATE;
        }
        if self.source_color != self.source_alpha || self.dest_color != self.dest_alpha {
            f |= Features::BLEND_FUNC_SEPARATE;
        }
        f
    }

    pub fn support(&self, available: Features) -> BlendSupport {
        if available.contains(self.required_features()) {
            BlendSupport::Exact
        } else {
            BlendSupport::Degraded
        }
    }

    /// The closest mode expressible with `available`.
    ///
    /// Without separate functions the color factors are used for alpha too;
    /// without separate equations the color equation is used for alpha;
    /// without equations at all everything adds.
    pub fn degrade(self, available: Features) -> BlendMode {
        let mut m = self;
        if !available.contains(Features::BLEND_FUNC_SEPARATE) {
            m.source_alpha = m.source_color;
            m.dest_alpha = m.dest_color;
        }
        if !available.contains(Features::BLEND_EQUATIONS) {
            m.color_equation = BlendEq::Add;
            m.alpha_equation = BlendEq::Add;
        } else if !available.contains(Features::BLEND_EQUATIONS_SEPARATE) {
            m.alpha_equation = m.color_equation;
        }
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_needs_nothing() {
        let m = BlendMode::from_preset(BlendPreset::Normal);
        assert!(m.required_features().is_empty());
        assert_eq!(m.support(Features::empty()), BlendSupport::Exact);
    }

    #[test]
    fn subtract_needs_equations() {
        let m = BlendMode::from_preset(BlendPreset::Subtract);
        assert_eq!(m.required_features(), Features::BLEND_EQUATIONS);
        assert_eq!(m.support(Features::empty()), BlendSupport::Degraded);
        assert_eq!(m.degrade(Features::empty()).color_equation, BlendEq::Add);
    }

    #[test]
    fn keep_alpha_needs_separate_functions() {
        let m = BlendMode::from_preset(BlendPreset::NormalKeepAlpha);
        assert!(m.required_features().contains(Features::BLEND_FUNC_SEPARATE));
        let d = m.degrade(Features::empty());
        assert_eq!(d.source_alpha, BlendFunc::SrcAlpha);
        assert_eq!(d.dest_alpha, BlendFunc::OneMinusSrcAlpha);
    }

    #[test]
    fn degrade_is_identity_when_fully_supported() {
        let all = Features::ALL_BLEND_PRESETS;
        for p in BlendPreset::ALL {
            let m = BlendMode::from_preset(p);
            assert_eq!(m.degrade(all), m);
            assert_eq!(m.support(all), BlendSupport::Exact);
        }
    }

    #[test]
    fn separate_equations_collapse_to_color_equation() {
        let m = BlendMode::default().with_equation(BlendEq::Subtract, BlendEq::Add);
        let d = m.degrade(Features::BLEND_EQUATIONS);
        assert_eq!(d.alpha_equation, BlendEq::Subtract);
    }
}
