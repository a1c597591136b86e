use bytemuck::{Pod, Zeroable};

/// Packed 32-bit tint multiplied into every texel of a stamp.
///
/// Bit layout (`0xAARRGGBB`):
/// - A: bits 24-31
/// - R: bits 16-23
/// - G: bits 8-15
/// - B: bits 0-7
///
/// Texture pixel words use the same layout, see
/// [`StampTexture::from_argb`](crate::render::stamp::StampTexture::from_argb).
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Tint(pub u32);

impl Tint {
    pub const WHITE: Tint = Tint(0xFFFF_FFFF);
    pub const BLACK: Tint = Tint(0xFF00_0000);
    pub const RED: Tint = Tint(0xFFFF_0000);
    pub const GREEN: Tint = Tint(0xFF00_FF00);
    pub const BLUE: Tint = Tint(0xFF00_00FF);
    pub const TRANSPARENT: Tint = Tint(0x0000_0000);

    /// Maximum red and blue; commonly used as a "treat as transparent" key color.
    pub const MAGIC_PINK: Tint = Tint(0xFFFF_00FF);

    #[inline]
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Tint((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// Builds a tint from `[0, 1]` channels.
    ///
    /// Each channel is scaled by 255, truncated, and clamped to `0..=255`.
    pub fn from_rgba_f32(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::from_rgba8(channel_to_u8(r), channel_to_u8(g), channel_to_u8(b), channel_to_u8(a))
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    #[inline]
    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Replaces only the alpha channel.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Tint((self.0 & 0x00FF_FFFF) | (a as u32) << 24)
    }

    /// Replaces only the alpha channel from a `[0, 1]` value.
    pub fn with_alpha_f32(self, a: f32) -> Self {
        self.with_alpha(channel_to_u8(a))
    }

    /// Decodes to normalized `[r, g, b, a]`, each channel divided by 255.
    ///
    /// Matches the fragment shader's decode bit for bit.
    pub fn decode(self) -> [f32; 4] {
        [
            self.r() as f32 / 255.0,
            self.g() as f32 / 255.0,
            self.b() as f32 / 255.0,
            self.a() as f32 / 255.0,
        ]
    }
}

impl Default for Tint {
    fn default() -> Self {
        Tint::WHITE
    }
}

impl From<u32> for Tint {
    #[inline]
    fn from(v: u32) -> Self {
        Tint(v)
    }
}

impl From<Tint> for u32 {
    #[inline]
    fn from(t: Tint) -> Self {
        t.0
    }
}

fn channel_to_u8(v: f32) -> u8 {
    // NaN saturates to 0 through the `as` cast.
    ((v * 255.0) as i32).clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn decode_uses_argb_layout() {
        let [r, g, b, a] = Tint(0xFF80_4020).decode();
        assert!(approx(a, 1.0));
        assert!(approx(r, 0x80 as f32 / 255.0));
        assert!(approx(g, 0x40 as f32 / 255.0));
        assert!(approx(b, 0x20 as f32 / 255.0));
        assert!((r - 0.314).abs() < 1e-3);
        assert!((g - 0.251).abs() < 1e-3);
        assert!((b - 0.125).abs() < 1e-3);
    }

    #[test]
    fn from_rgba8_packs_channels() {
        let t = Tint::from_rgba8(0x12, 0x34, 0x56, 0x78);
        assert_eq!(t, Tint(0x7812_3456));
        assert_eq!((t.r(), t.g(), t.b(), t.a()), (0x12, 0x34, 0x56, 0x78));
    }

    #[test]
    fn from_rgba_f32_truncates_and_clamps() {
        assert_eq!(Tint::from_rgba_f32(1.0, 0.0, 0.5, 1.0), Tint(0xFFFF_007F));
        assert_eq!(Tint::from_rgba_f32(2.0, -1.0, 0.0, 1.5), Tint(0xFFFF_0000));
    }

    #[test]
    fn with_alpha_keeps_color() {
        let t = Tint::MAGIC_PINK.with_alpha(0x40);
        assert_eq!(t, Tint(0x40FF_00FF));
        assert_eq!(Tint::WHITE.with_alpha_f32(0.0), Tint(0x00FF_FFFF));
    }

    #[test]
    fn default_is_opaque_white() {
        assert_eq!(Tint::default().decode(), [1.0, 1.0, 1.0, 1.0]);
    }
}
