//! Surface configuration helpers, kept free of live GPU objects.

use winit::dpi::PhysicalSize;

/// Picks the surface storage format: an sRGB 8-bit format when preferred and
/// available, otherwise the adapter's first choice.
///
/// Either way rendering goes through [`render_view_format`], so the choice
/// only affects how the compositor reads the stored bytes.
pub(crate) fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        if let Some(f) = preferred.into_iter().find(|f| formats.contains(f)) {
            return Some(f);
        }
    }

    formats.first().copied()
}

pub(crate) fn choose_alpha_mode(
    supported: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| supported.contains(m))
        .or_else(|| supported.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Format frames are rendered through: the surface format without its sRGB
/// suffix.
///
/// Stamp colors are texel bytes times tint bytes, blended as stored. An sRGB
/// view would encode that product again on write.
#[inline]
pub(crate) fn render_view_format(surface: wgpu::TextureFormat) -> wgpu::TextureFormat {
    surface.remove_srgb_suffix()
}

/// Extra view formats the surface must be configured with.
pub(crate) fn surface_view_formats(surface: wgpu::TextureFormat) -> Vec<wgpu::TextureFormat> {
    let view = render_view_format(surface);
    if view == surface { Vec::new() } else { vec![view] }
}

/// wgpu cannot configure a 0x0 surface; such sizes defer configuration.
#[inline]
pub(crate) fn is_configurable(size: PhysicalSize<u32>) -> bool {
    size.width > 0 && size.height > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat as F;

    #[test]
    fn prefers_srgb_when_available() {
        let formats = [F::Bgra8Unorm, F::Rgba8UnormSrgb];
        assert_eq!(choose_surface_format(&formats, true), Some(F::Rgba8UnormSrgb));
        assert_eq!(choose_surface_format(&formats, false), Some(F::Bgra8Unorm));
    }

    #[test]
    fn falls_back_to_first_format() {
        assert_eq!(choose_surface_format(&[F::Rgba16Float], true), Some(F::Rgba16Float));
        assert_eq!(choose_surface_format(&[], true), None);
    }

    #[test]
    fn frames_render_through_a_linear_view() {
        assert_eq!(render_view_format(F::Bgra8UnormSrgb), F::Bgra8Unorm);
        assert_eq!(render_view_format(F::Rgba8UnormSrgb), F::Rgba8Unorm);
        assert_eq!(render_view_format(F::Bgra8Unorm), F::Bgra8Unorm);
        assert!(!render_view_format(F::Bgra8UnormSrgb).is_srgb());
    }

    #[test]
    fn srgb_surfaces_declare_their_linear_view() {
        assert_eq!(surface_view_formats(F::Bgra8UnormSrgb), vec![F::Bgra8Unorm]);
        assert!(surface_view_formats(F::Bgra8Unorm).is_empty());
        assert!(surface_view_formats(F::Rgba16Float).is_empty());
    }

    #[test]
    fn alpha_mode_falls_back_to_supported() {
        use wgpu::CompositeAlphaMode as A;
        let supported = [A::Opaque, A::PreMultiplied];
        assert_eq!(choose_alpha_mode(&supported, Some(A::PreMultiplied)), A::PreMultiplied);
        assert_eq!(choose_alpha_mode(&supported, Some(A::PostMultiplied)), A::Opaque);
        assert_eq!(choose_alpha_mode(&[], None), A::Auto);
    }

    #[test]
    fn zero_sizes_are_not_configurable() {
        assert!(!is_configurable(PhysicalSize::new(0, 10)));
        assert!(is_configurable(PhysicalSize::new(1, 1)));
    }
}
