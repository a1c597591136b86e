use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::coords::Vec2;
use crate::paint::Tint;

use super::pixels::{ColorKey, Pixels};
use super::StampError;

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique texture identity, used to dedupe texture units per draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TextureId(u64);

impl TextureId {
    pub fn next() -> Self {
        TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum TextureWrap {
    #[default]
    ClampToEdge,
    Repeat,
    MirrorRepeat,
}

impl TextureWrap {
    fn to_wgpu(self) -> wgpu::AddressMode {
        match self {
            TextureWrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            TextureWrap::Repeat => wgpu::AddressMode::Repeat,
            TextureWrap::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum TextureFilter {
    #[default]
    Nearest,
    Linear,
}

impl TextureFilter {
    fn to_wgpu(self) -> wgpu::FilterMode {
        match self {
            TextureFilter::Nearest => wgpu::FilterMode::Nearest,
            TextureFilter::Linear => wgpu::FilterMode::Linear,
        }
    }
}

/// Per-texture sampling state. Defaults to clamp-to-edge + nearest (pixel art).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SamplerOptions {
    pub wrap_u: TextureWrap,
    pub wrap_v: TextureWrap,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
}

impl SamplerOptions {
    pub fn linear() -> Self {
        Self {
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            ..Self::default()
        }
    }
}

/// GPU texture that stamps sample from.
///
/// Pixels are packed `0xAARRGGBB` words (the [`Tint`] layout). They are
/// uploaded little-endian into an RGBA8 texture, so the shader sees them as
/// `(B, G, R, A)` and swizzles back before tinting.
///
/// Shared between stamps via `Arc`; identity (not contents) decides which
/// texture unit a stamp uses within a draw.
#[derive(Debug)]
pub struct StampTexture {
    id: TextureId,
    width: u32,
    height: u32,
    options: SamplerOptions,

    #[allow(dead_code)] // keeps the allocation alive for `view`
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl StampTexture {
    /// Plain UNORM: samples are the stored bytes / 255, with no sRGB decode.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Uploads packed `0xAARRGGBB` pixels, row-major, top row first.
    pub fn from_argb(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        pixels: &[u32],
        options: SamplerOptions,
    ) -> Result<Arc<Self>, StampError> {
        validate_dimensions(
            width,
            height,
            pixels.len(),
            device.limits().max_texture_dimension_2d,
        )?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("stamp texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let bytes: Vec<u8> = pixels.iter().flat_map(|p| p.to_le_bytes()).collect();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("stamp sampler"),
            address_mode_u: options.wrap_u.to_wgpu(),
            address_mode_v: options.wrap_v.to_wgpu(),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: options.mag_filter.to_wgpu(),
            min_filter: options.min_filter.to_wgpu(),
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let id = TextureId::next();
        log::debug!("stamp texture {id:?} uploaded ({width}x{height})");

        Ok(Arc::new(Self {
            id,
            width,
            height,
            options,
            texture,
            view,
            sampler,
        }))
    }

    /// Uploads straight RGBA8 bytes (`[r, g, b, a, r, g, b, a, ...]`).
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        rgba: &[u8],
        options: SamplerOptions,
    ) -> Result<Arc<Self>, StampError> {
        if rgba.len() % 4 != 0 {
            return Err(StampError::InvalidTexture {
                width,
                height,
                reason: "RGBA byte length is not a multiple of 4",
            });
        }
        Self::from_argb(device, queue, width, height, &rgba8_to_argb(rgba), options)
    }

    pub fn from_pixels(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &Pixels,
        options: SamplerOptions,
    ) -> Result<Arc<Self>, StampError> {
        Self::from_argb(device, queue, pixels.width(), pixels.height(), pixels.data(), options)
    }

    /// Decodes an encoded image (PNG, JPEG, BMP, GIF), applies `key` if
    /// given, and uploads it.
    pub fn from_image_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        options: SamplerOptions,
        key: Option<ColorKey>,
    ) -> Result<Arc<Self>, StampError> {
        let mut pixels = Pixels::decode(bytes)?;
        if let Some(key) = key {
            pixels.replace_color(key);
        }
        Self::from_pixels(device, queue, &pixels, options)
    }

    /// Loads an image file; see [`from_image_bytes`](Self::from_image_bytes).
    pub fn from_path(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<Path>,
        options: SamplerOptions,
        key: Option<ColorKey>,
    ) -> Result<Arc<Self>, StampError> {
        let mut pixels = Pixels::open(path)?;
        if let Some(key) = key {
            pixels.replace_color(key);
        }
        Self::from_pixels(device, queue, &pixels, options)
    }

    /// 1x1 texture of a single color.
    pub fn solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color: Tint,
    ) -> Result<Arc<Self>, StampError> {
        Self::from_argb(device, queue, 1, 1, &[color.0], SamplerOptions::default())
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    #[inline]
    pub fn options(&self) -> SamplerOptions {
        self.options
    }

    #[inline]
    pub(super) fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    pub(super) fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

/// Checks texture dimensions against pixel data and the device limit.
pub fn validate_dimensions(
    width: u32,
    height: u32,
    pixel_count: usize,
    max_dimension: u32,
) -> Result<(), StampError> {
    if width == 0 || height == 0 {
        return Err(StampError::InvalidTexture {
            width,
            height,
            reason: "zero-sized texture",
        });
    }

    let largest = width.max(height);
    if largest > max_dimension {
        return Err(StampError::ResourceExhaustion {
            what: "texture",
            requested: largest as u64,
            limit: max_dimension as u64,
        });
    }

    if pixel_count as u64 != width as u64 * height as u64 {
        return Err(StampError::InvalidTexture {
            width,
            height,
            reason: "pixel count does not match dimensions",
        });
    }

    Ok(())
}

/// Packs straight RGBA8 bytes into `0xAARRGGBB` words. Trailing bytes that do
/// not form a whole pixel are ignored.
pub fn rgba8_to_argb(rgba: &[u8]) -> Vec<u32> {
    rgba.chunks_exact(4)
        .map(|p| Tint::from_rgba8(p[0], p[1], p[2], p[3]).0)
        .collect()
}
