use std::f32::consts::{PI, TAU};
use std::sync::Arc;

use crate::coords::Vec2;
use crate::paint::Tint;

use super::instance::{StampInstance, StampTransform, TexRect};
use super::texture::StampTexture;

/// Placement and appearance of one sprite, independent of its texture.
///
/// The pin is where the image is tacked onto the canvas: `pos` places the pin
/// and rotation turns the image around it. It is stored as a fraction of the
/// current size (0.5 = center), so resizing keeps it at the same relative
/// spot.
///
/// All setters return `&mut Self` so calls chain:
///
/// ```ignore
/// stamp.params.center_pin().rescale(2.0, 2.0).move_to(pos).rotate(0.3);
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StampParams {
    tex_rect: TexRect,
    flipped_x: bool,
    flipped_y: bool,

    /// Pin as a fraction of `size`.
    pub pin: Vec2,
    /// Size the stamp was created with, in pixels. `rescale` is relative to it.
    pub orig_size: Vec2,
    pub size: Vec2,
    pub pos: Vec2,
    /// Radians.
    pub angle: f32,
    pub tint: Tint,
}

impl StampParams {
    /// Unrotated, untinted, pinned at the top-left corner, placed at the origin.
    pub fn new(tex_rect: TexRect, size: Vec2) -> Self {
        Self {
            tex_rect,
            flipped_x: false,
            flipped_y: false,
            pin: Vec2::zero(),
            orig_size: size,
            size,
            pos: Vec2::zero(),
            angle: 0.0,
            tint: Tint::WHITE,
        }
    }

    /// Texture sub-rectangle with flips applied.
    #[inline]
    pub fn tex_rect(&self) -> TexRect {
        self.tex_rect
    }

    #[inline]
    pub fn is_flipped_x(&self) -> bool {
        self.flipped_x
    }

    #[inline]
    pub fn is_flipped_y(&self) -> bool {
        self.flipped_y
    }

    /// Sets the size relative to `orig_size`.
    pub fn rescale(&mut self, sx: f32, sy: f32) -> &mut Self {
        self.size = self.orig_size * Vec2::new(sx, sy);
        self
    }

    /// Sets the size in pixels.
    pub fn resize(&mut self, width: f32, height: f32) -> &mut Self {
        self.size = Vec2::new(width, height);
        self
    }

    pub fn recolor(&mut self, tint: Tint) -> &mut Self {
        self.tint = tint;
        self
    }

    /// Replaces the tint's alpha, `0.0` transparent to `1.0` opaque.
    pub fn with_alpha(&mut self, alpha: f32) -> &mut Self {
        self.tint = self.tint.with_alpha_f32(alpha);
        self
    }

    pub fn move_to(&mut self, pos: Vec2) -> &mut Self {
        self.pos = pos;
        self
    }

    pub fn move_by(&mut self, delta: Vec2) -> &mut Self {
        self.pos = self.pos + delta;
        self
    }

    pub fn rotate(&mut self, angle: f32) -> &mut Self {
        self.angle = angle;
        self
    }

    pub fn rotate_by(&mut self, delta: f32) -> &mut Self {
        self.angle += delta;
        self
    }

    /// Wraps the angle into `[0, 2π)`.
    pub fn fix_angle(&mut self) -> &mut Self {
        self.angle = wrap(self.angle, 0.0, TAU);
        self
    }

    /// Wraps the angle into `[-π, π)`.
    pub fn fix_angle_signed(&mut self) -> &mut Self {
        self.angle = wrap(self.angle, -PI, PI);
        self
    }

    pub fn center_pin(&mut self) -> &mut Self {
        self.pin = Vec2::splat(0.5);
        self
    }

    /// Places the pin at a pixel offset from the top-left of the current size.
    ///
    /// A zero-sized axis pins at 0.
    pub fn move_pin_to(&mut self, px: Vec2) -> &mut Self {
        let frac = |p: f32, s: f32| if s == 0.0 { 0.0 } else { p / s };
        self.pin = Vec2::new(frac(px.x, self.size.x), frac(px.y, self.size.y));
        self
    }

    /// Pin in pixels from the top-left of the current size.
    #[inline]
    pub fn pin_px(&self) -> Vec2 {
        self.pin * self.size
    }

    /// Mirrors horizontally (swaps `u0` and `u1`).
    pub fn flip_x(&mut self) -> &mut Self {
        self.tex_rect = self.tex_rect.flipped_x();
        self.flipped_x = !self.flipped_x;
        self
    }

    /// Mirrors vertically (swaps `v0` and `v1`).
    pub fn flip_y(&mut self) -> &mut Self {
        self.tex_rect = self.tex_rect.flipped_y();
        self.flipped_y = !self.flipped_y;
        self
    }

    /// Sets absolute flip state; flips only the axes that differ.
    pub fn set_flip(&mut self, x: bool, y: bool) -> &mut Self {
        if self.flipped_x != x {
            self.flip_x();
        }
        if self.flipped_y != y {
            self.flip_y();
        }
        self
    }

    pub fn transform(&self) -> StampTransform {
        StampTransform::new(self.pin_px(), self.size, self.pos, self.angle)
    }

    pub fn to_instance(&self, unit: u8) -> StampInstance {
        StampInstance {
            transform: self.transform(),
            tex_rect: self.tex_rect,
            unit,
            tint: self.tint,
        }
    }
}

/// Wraps `v` into `[lo, hi)`.
fn wrap(v: f32, lo: f32, hi: f32) -> f32 {
    let span = hi - lo;
    let r = (v - lo).rem_euclid(span);
    // rem_euclid may round up to exactly `span` for tiny negative inputs
    if r >= span { lo } else { lo + r }
}

/// A texture plus where and how to draw it.
#[derive(Debug, Clone)]
pub struct Stamp {
    texture: Arc<StampTexture>,
    pub params: StampParams,
}

impl Stamp {
    /// Covers the whole texture at its natural pixel size.
    pub fn new(texture: Arc<StampTexture>) -> Self {
        let size = texture.size();
        Self {
            texture,
            params: StampParams::new(TexRect::FULL, size),
        }
    }

    /// Covers `tex_rect` of `texture`, initially `size` pixels large.
    pub fn from_region(texture: Arc<StampTexture>, tex_rect: TexRect, size: Vec2) -> Self {
        Self {
            texture,
            params: StampParams::new(tex_rect, size),
        }
    }

    #[inline]
    pub fn texture(&self) -> &Arc<StampTexture> {
        &self.texture
    }

    /// One stamp per `tile_w` x `tile_h` tile, row-major. See [`tile_rects`].
    pub fn tiles(texture: &Arc<StampTexture>, tile_w: u32, tile_h: u32, padding: Padding) -> Vec<Stamp> {
        let size = Vec2::new(tile_w as f32, tile_h as f32);
        tile_rects(texture.width(), texture.height(), tile_w, tile_h, padding)
            .into_iter()
            .map(|r| Stamp::from_region(Arc::clone(texture), r, size))
            .collect()
    }

    /// Splits the texture into an `nx` x `ny` grid of stamps, row-major.
    pub fn split_into_tiles(texture: &Arc<StampTexture>, nx: u32, ny: u32, padding: Padding) -> Vec<Stamp> {
        let Some((tile_w, tile_h)) = grid_tile_size(texture.width(), texture.height(), nx, ny, padding) else {
            return Vec::new();
        };
        Self::tiles(texture, tile_w, tile_h, padding)
    }

    #[inline]
    pub fn to_instance(&self, unit: u8) -> StampInstance {
        self.params.to_instance(unit)
    }
}

/// Pixels excluded from tiling at each edge of a texture.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Padding {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Padding {
    pub const ZERO: Padding = Padding::new(0, 0, 0, 0);

    #[inline]
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self { left, top, right, bottom }
    }

    #[inline]
    pub const fn uniform(p: u32) -> Self {
        Self::new(p, p, p, p)
    }
}

/// Normalized rects of every whole `tile_w` x `tile_h` tile that fits inside
/// the padded area of a `width` x `height` texture, row-major.
///
/// Partial tiles at the right/bottom edge are dropped.
pub fn tile_rects(width: u32, height: u32, tile_w: u32, tile_h: u32, padding: Padding) -> Vec<TexRect> {
    if tile_w == 0 || tile_h == 0 {
        return Vec::new();
    }

    let inner_w = width.saturating_sub(padding.left + padding.right);
    let inner_h = height.saturating_sub(padding.top + padding.bottom);
    let (nx, ny) = (inner_w / tile_w, inner_h / tile_h);

    let mut out = Vec::with_capacity((nx * ny) as usize);
    for y in 0..ny {
        for x in 0..nx {
            out.push(TexRect::from_pixels(
                padding.left + x * tile_w,
                padding.top + y * tile_h,
                tile_w,
                tile_h,
                width,
                height,
            ));
        }
    }
    out
}

/// Tile size for an `nx` x `ny` grid over the padded area, or `None` if no
/// whole pixel fits per tile.
pub fn grid_tile_size(width: u32, height: u32, nx: u32, ny: u32, padding: Padding) -> Option<(u32, u32)> {
    if nx == 0 || ny == 0 {
        return None;
    }
    let tile_w = width.saturating_sub(padding.left + padding.right) / nx;
    let tile_h = height.saturating_sub(padding.top + padding.bottom) / ny;
    (tile_w > 0 && tile_h > 0).then_some((tile_w, tile_h))
}

/// Normalized rects of an `nx` x `ny` grid over the padded area, row-major.
pub fn grid_tile_rects(width: u32, height: u32, nx: u32, ny: u32, padding: Padding) -> Vec<TexRect> {
    match grid_tile_size(width, height, nx, ny, padding) {
        Some((tw, th)) => tile_rects(width, height, tw, th, padding),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StampParams {
        StampParams::new(TexRect::new(0.0, 0.0, 0.5, 0.25), Vec2::new(16.0, 8.0))
    }

    #[test]
    fn rescale_is_relative_to_original_size() {
        let mut p = params();
        p.resize(100.0, 100.0).rescale(2.0, 0.5);
        assert_eq!(p.size, Vec2::new(32.0, 4.0));
    }

    #[test]
    fn pin_fraction_scales_with_size() {
        let mut p = params();
        p.center_pin();
        assert_eq!(p.pin_px(), Vec2::new(8.0, 4.0));
        p.rescale(2.0, 2.0);
        assert_eq!(p.pin_px(), Vec2::new(16.0, 8.0));

        p.move_pin_to(Vec2::new(8.0, 0.0));
        assert_eq!(p.pin, Vec2::new(0.25, 0.0));
    }

    #[test]
    fn move_pin_to_on_zero_size_pins_at_origin() {
        let mut p = params();
        p.resize(0.0, 10.0).move_pin_to(Vec2::new(3.0, 5.0));
        assert_eq!(p.pin, Vec2::new(0.0, 0.5));
    }

    #[test]
    fn flips_swap_tex_coords_and_toggle() {
        let mut p = params();
        p.flip_x();
        assert!(p.is_flipped_x());
        assert_eq!(p.tex_rect(), TexRect::new(0.5, 0.0, 0.0, 0.25));

        p.set_flip(false, true);
        assert!(!p.is_flipped_x());
        assert!(p.is_flipped_y());
        assert_eq!(p.tex_rect(), TexRect::new(0.0, 0.25, 0.5, 0.0));

        // no-op when already in the requested state
        p.set_flip(false, true);
        assert_eq!(p.tex_rect(), TexRect::new(0.0, 0.25, 0.5, 0.0));
    }

    #[test]
    fn fix_angle_wraps_into_range() {
        let mut p = params();
        p.rotate(5.0 * PI).fix_angle();
        assert!((p.angle - PI).abs() < 1e-4);

        p.rotate(-0.5).fix_angle();
        assert!((p.angle - (TAU - 0.5)).abs() < 1e-5);

        p.rotate(3.0 * PI / 2.0).fix_angle_signed();
        assert!((p.angle + PI / 2.0).abs() < 1e-5);

        p.rotate(PI).fix_angle_signed();
        assert!((p.angle + PI).abs() < 1e-6);
    }

    #[test]
    fn wrap_never_returns_upper_bound() {
        let r = wrap(-1e-9, 0.0, TAU);
        assert!((0.0..TAU).contains(&r));
    }

    #[test]
    fn movement_and_tint_chain() {
        let mut p = params();
        p.move_to(Vec2::new(10.0, 10.0))
            .move_by(Vec2::new(-2.0, 3.0))
            .rotate_by(0.25)
            .rotate_by(0.25)
            .recolor(Tint::RED)
            .with_alpha(0.5);
        assert_eq!(p.pos, Vec2::new(8.0, 13.0));
        assert_eq!(p.angle, 0.5);
        assert_eq!(p.tint, Tint(0x7FFF_0000));
    }

    #[test]
    fn instance_carries_pixel_pin_and_rotation() {
        let mut p = params();
        p.center_pin().move_to(Vec2::new(40.0, 30.0));

        let inst = p.to_instance(3);
        assert_eq!(inst.unit, 3);
        assert_eq!(inst.transform.pin, [8.0, 4.0]);
        assert_eq!(inst.transform.size, [16.0, 8.0]);
        assert_eq!(inst.transform.pos, [40.0, 30.0]);
        assert_eq!(inst.transform.rotation, StampTransform::NO_ROTATION);
        assert_eq!(inst.tex_rect, p.tex_rect());

        p.rotate(1.0);
        let [sin, cos] = p.to_instance(0).transform.rotation;
        assert!((sin - 1.0f32.sin()).abs() < 1e-6);
        assert!((cos - 1.0f32.cos()).abs() < 1e-6);
    }

    #[test]
    fn tiles_are_row_major_and_skip_partials() {
        let rects = tile_rects(64, 32, 16, 16, Padding::ZERO);
        assert_eq!(rects.len(), 8);
        assert_eq!(rects[0], TexRect::new(0.0, 0.0, 0.25, 0.5));
        assert_eq!(rects[1], TexRect::new(0.25, 0.0, 0.5, 0.5));
        assert_eq!(rects[4], TexRect::new(0.0, 0.5, 0.25, 1.0));

        assert_eq!(tile_rects(40, 16, 16, 16, Padding::ZERO).len(), 2);
        assert!(tile_rects(40, 16, 0, 16, Padding::ZERO).is_empty());
    }

    #[test]
    fn padding_offsets_tiles() {
        let rects = tile_rects(20, 20, 8, 8, Padding::new(2, 2, 2, 2));
        assert_eq!(rects.len(), 4);
        assert_eq!(rects[0], TexRect::from_pixels(2, 2, 8, 8, 20, 20));
        assert_eq!(rects[3], TexRect::from_pixels(10, 10, 8, 8, 20, 20));
    }

    #[test]
    fn grid_split_divides_padded_area() {
        assert_eq!(grid_tile_size(64, 32, 4, 2, Padding::ZERO), Some((16, 16)));
        assert_eq!(grid_tile_size(66, 34, 4, 2, Padding::uniform(1)), Some((16, 16)));
        assert_eq!(grid_tile_size(64, 32, 0, 2, Padding::ZERO), None);
        assert_eq!(grid_tile_size(2, 2, 4, 4, Padding::ZERO), None);

        let rects = grid_tile_rects(64, 32, 4, 2, Padding::ZERO);
        assert_eq!(rects, tile_rects(64, 32, 16, 16, Padding::ZERO));
    }
}
