//! CPU reference of the per-vertex stamp math in `stamp.wgsl`.
//!
//! The shader is the source of truth at draw time; these functions compute the
//! same values on the host for hit testing, culling and tests. Keep the two in
//! lockstep: operand order is chosen to match the shader's float rounding.
//!
//! Pipeline for corner `c` of an instance (pin `p`, size `s`, position `pos`,
//! rotation `(sin, cos)`):
//!
//! ```text
//! local     = c * s
//! rotated.x = p.x + (local.x - p.x) * cos + (local.y - p.y) * sin
//! rotated.y = p.y + (local.y - p.y) * cos - (local.x - p.x) * sin
//! world     = rotated + pos - p
//! ndc       = 2 * world / canvas - 1
//! clip      = (ndc.x, -ndc.y)
//! ```
//!
//! With Y pointing down in canvas space, a positive `sin` turns the quad's
//! +X edge toward the top of the screen.

use crate::coords::{Vec2, Viewport};
use crate::paint::Tint;

use super::quad::QUAD_STRIP;
use super::{StampTransform, TexRect};

/// Unit-quad corner for a vertex index (`vertex_index % 4`).
#[inline]
pub fn quad_corner(vertex_index: u32) -> Vec2 {
    Vec2::from_array(QUAD_STRIP[(vertex_index % 4) as usize].pos)
}

/// Maps a unit-quad corner to canvas pixels.
pub fn corner_to_canvas(corner: Vec2, t: &StampTransform) -> Vec2 {
    let pin = Vec2::from_array(t.pin);
    let [sin, cos] = t.rotation;

    let local = corner * Vec2::from_array(t.size);
    let d = local - pin;
    let rotated = Vec2::new(
        pin.x + d.x * cos + d.y * sin,
        pin.y + d.y * cos - d.x * sin,
    );

    rotated + Vec2::from_array(t.pos) - pin
}

/// Maps canvas pixels (Y down) to clip space (Y up).
pub fn canvas_to_clip(p: Vec2, canvas: Viewport) -> Vec2 {
    let size = Vec2::from_array(canvas.clamped_size());
    let ndc = (p / size) * 2.0 - Vec2::splat(1.0);
    Vec2::new(ndc.x, -ndc.y)
}

/// Clip-space position of one vertex of one instance.
#[inline]
pub fn vertex_to_clip(vertex_index: u32, t: &StampTransform, canvas: Viewport) -> Vec2 {
    canvas_to_clip(corner_to_canvas(quad_corner(vertex_index), t), canvas)
}

/// All four corners of an instance in canvas pixels, strip order.
pub fn canvas_corners(t: &StampTransform) -> [Vec2; 4] {
    [0, 1, 2, 3].map(|i| corner_to_canvas(quad_corner(i), t))
}

/// Texture coordinate for a vertex index, strip order:
/// 0 → (u0,v0), 1 → (u1,v0), 2 → (u0,v1), 3 → (u1,v1).
pub fn corner_tex_coord(vertex_index: u32, r: &TexRect) -> Vec2 {
    match vertex_index % 4 {
        0 => Vec2::new(r.u0, r.v0),
        1 => Vec2::new(r.u1, r.v0),
        2 => Vec2::new(r.u0, r.v1),
        _ => Vec2::new(r.u1, r.v1),
    }
}

/// Fragment color for a texel as sampled from a stamp texture.
///
/// Stamp textures hold packed `0xAARRGGBB` words uploaded little-endian, so
/// `sampled` arrives as `(B, G, R, A)` and is swizzled before the tint
/// multiply.
pub fn shade(sampled: [f32; 4], tint: Tint) -> [f32; 4] {
    let [b, g, r, a] = sampled;
    let [tr, tg, tb, ta] = tint.decode();
    [r * tr, g * tg, b * tb, a * ta]
}
