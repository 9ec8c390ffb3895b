/// Straight-alpha RGBA color, 8 bits per channel.
///
/// This is the color type of the public API (image and target modulation,
/// shape colors, clears, pixel readback). Renderers work with the
/// normalized form from [`Color::to_f32`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const RED: Color = Color::rgba(255, 0, 0, 255);
    pub const GREEN: Color = Color::rgba(0, 255, 0, 255);
    pub const BLUE: Color = Color::rgba(0, 0, 255, 255);

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub const fn from_array(c: [u8; 4]) -> Self {
        Self::rgba(c[0], c[1], c[2], c[3])
    }

    /// Normalized `[0, 1]` components.
    #[inline]
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    /// Quantizes normalized components, clamping to `[0, 1]`.
    #[inline]
    pub fn from_f32(c: [f32; 4]) -> Self {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgba(q(c[0]), q(c[1]), q(c[2]), q(c[3]))
    }

    /// Component-wise product, as used for color modulation.
    #[inline]
    pub fn modulate(self, other: Color) -> Color {
        let m = |a: u8, b: u8| ((a as u16 * b as u16 + 127) / 255) as u8;
        Color::rgba(m(self.r, other.r), m(self.g, other.g), m(self.b, other.b), m(self.a, other.a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_opaque_white() {
        assert_eq!(Color::default(), Color::WHITE);
    }

    #[test]
    fn f32_conversion_is_exact_for_endpoints() {
        assert_eq!(Color::from_f32(Color::RED.to_f32()), Color::RED);
        assert_eq!(Color::from_f32([2.0, -1.0, 0.5, 1.0]), Color::rgba(255, 0, 128, 255));
    }

    #[test]
    fn modulate_by_white_is_identity() {
        let c = Color::rgba(10, 20, 30, 40);
        assert_eq!(c.modulate(Color::WHITE), c);
        assert_eq!(c.modulate(Color::TRANSPARENT), Color::TRANSPARENT);
    }
}
