use std::path::Path;

use crate::paint::Tint;

use super::texture::rgba8_to_argb;
use super::StampError;

/// Color substitution applied to pixels on load.
///
/// Sprite sheets without an alpha channel mark the background with a key
/// color; [`ColorKey::MAGIC_PINK`] turns the usual one transparent.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ColorKey {
    pub from: Tint,
    pub to: Tint,
}

impl ColorKey {
    pub const MAGIC_PINK: ColorKey = ColorKey {
        from: Tint::MAGIC_PINK,
        to: Tint::TRANSPARENT,
    };

    pub const fn new(from: Tint, to: Tint) -> Self {
        Self { from, to }
    }
}

/// Host-side image: packed `0xAARRGGBB` words, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixels {
    width: u32,
    height: u32,
    data: Vec<u32>,
}

impl Pixels {
    /// Wraps existing words; fails if the count does not match the size.
    pub fn new(width: u32, height: u32, data: Vec<u32>) -> Result<Self, StampError> {
        if data.len() as u64 != width as u64 * height as u64 {
            return Err(StampError::InvalidTexture {
                width,
                height,
                reason: "pixel count does not match dimensions",
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Image of one color.
    pub fn filled(width: u32, height: u32, color: Tint) -> Self {
        Self {
            width,
            height,
            data: vec![color.0; width as usize * height as usize],
        }
    }

    /// Decodes PNG, JPEG, BMP or GIF data. The format is sniffed from the
    /// header, not a file name.
    pub fn decode(bytes: &[u8]) -> Result<Self, StampError> {
        let img = image::load_from_memory(bytes).map_err(|e| StampError::Image {
            reason: e.to_string(),
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new(width, height, rgba8_to_argb(rgba.as_raw()))
    }

    /// Reads and decodes an image file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StampError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| StampError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let pixels = Self::decode(&bytes)?;
        log::debug!("decoded {} ({}x{})", path.display(), pixels.width, pixels.height);
        Ok(pixels)
    }

    /// Replaces every pixel exactly equal to `key.from` with `key.to`.
    /// Returns how many pixels changed.
    pub fn replace_color(&mut self, key: ColorKey) -> usize {
        if key.from == key.to {
            return 0;
        }
        let mut replaced = 0;
        for p in self.data.iter_mut().filter(|p| **p == key.from.0) {
            *p = key.to.0;
            replaced += 1;
        }
        replaced
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
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u32] {
        &mut self.data
    }

    /// Pixel at `(x, y)`, or `None` outside the image.
    pub fn get(&self, x: u32, y: u32) -> Option<Tint> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(Tint(self.data[(y * self.width + x) as usize]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(width: u32, height: u32, rgba: Vec<u8>) -> Vec<u8> {
        let img = image::RgbaImage::from_raw(width, height, rgba).unwrap();
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn decodes_png_into_argb_words() {
        let png = encode_png(
            2,
            1,
            vec![0xFF, 0x00, 0xFF, 0xFF, 0x10, 0x20, 0x30, 0x80],
        );
        let px = Pixels::decode(&png).unwrap();
        assert_eq!((px.width(), px.height()), (2, 1));
        assert_eq!(px.data(), &[0xFFFF_00FF, 0x8010_2030]);
        assert_eq!(px.get(0, 0), Some(Tint::MAGIC_PINK));
        assert_eq!(px.get(2, 0), None);
    }

    #[test]
    fn magic_pink_key_becomes_transparent() {
        let png = encode_png(
            2,
            1,
            vec![0xFF, 0x00, 0xFF, 0xFF, 0x10, 0x20, 0x30, 0xFF],
        );
        let mut px = Pixels::decode(&png).unwrap();
        assert_eq!(px.replace_color(ColorKey::MAGIC_PINK), 1);
        assert_eq!(px.data(), &[0x0000_0000, 0xFF10_2030]);
    }

    #[test]
    fn identical_key_changes_nothing() {
        let mut px = Pixels::filled(2, 2, Tint::RED);
        assert_eq!(px.replace_color(ColorKey::new(Tint::RED, Tint::RED)), 0);
        assert_eq!(px.replace_color(ColorKey::new(Tint::RED, Tint::BLUE)), 4);
        assert!(px.data().iter().all(|&p| p == Tint::BLUE.0));
    }

    #[test]
    fn garbage_is_an_image_error() {
        assert!(matches!(
            Pixels::decode(b"not an image"),
            Err(StampError::Image { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Pixels::open("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, StampError::Io { .. }));
    }

    #[test]
    fn mismatched_length_is_rejected() {
        assert!(Pixels::new(2, 2, vec![0; 3]).is_err());
        assert!(Pixels::new(2, 2, vec![0; 4]).is_ok());
    }
}
