//! Procedural sprite atlas: a 4x4 grid of 16px shapes on a magic-pink
//! background, the way keyed sprite sheets ship.

use stamp_engine::paint::Tint;
use stamp_engine::render::stamp::Pixels;

pub const TILE: u32 = 16;
pub const GRID: u32 = 4;
pub const SIZE: u32 = TILE * GRID;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Shape {
    Disc,
    Diamond,
    Ring,
    Square,
}

const SHAPES: [Shape; 4] = [Shape::Disc, Shape::Diamond, Shape::Ring, Shape::Square];

/// Row `r` uses `SHAPES[r]`; columns vary the color.
const PALETTE: [Tint; 4] = [
    Tint(0xFFFF_6B6B),
    Tint(0xFFFF_D93D),
    Tint(0xFF6B_CB77),
    Tint(0xFF4D_96FF),
];

/// `SIZE` x `SIZE` sheet, magic pink outside the shapes.
pub fn sheet() -> Pixels {
    let mut sheet = Pixels::filled(SIZE, SIZE, Tint::MAGIC_PINK);
    let out = sheet.data_mut();
    for ty in 0..GRID {
        for tx in 0..GRID {
            let shape = SHAPES[ty as usize];
            let color = PALETTE[tx as usize];
            for y in 0..TILE {
                for x in 0..TILE {
                    if covers(shape, x, y) {
                        let px = tx * TILE + x;
                        let py = ty * TILE + y;
                        out[(py * SIZE + px) as usize] = shade(color, x, y).0;
                    }
                }
            }
        }
    }
    sheet
}

fn covers(shape: Shape, x: u32, y: u32) -> bool {
    // pixel centers relative to the tile center, in half-pixels
    let dx = (2 * x as i32 + 1) - TILE as i32;
    let dy = (2 * y as i32 + 1) - TILE as i32;
    let r = TILE as i32 - 2;
    match shape {
        Shape::Disc => dx * dx + dy * dy <= r * r,
        Shape::Diamond => dx.abs() + dy.abs() <= r,
        Shape::Ring => {
            let d2 = dx * dx + dy * dy;
            d2 <= r * r && d2 >= (r / 2) * (r / 2)
        }
        Shape::Square => dx.abs() <= r - 2 && dy.abs() <= r - 2,
    }
}

/// Darkens toward the bottom-right so rotation is visible.
fn shade(color: Tint, x: u32, y: u32) -> Tint {
    let k = 255 - ((x + y) * 4).min(96);
    let scale = |c: u8| (c as u32 * k / 255) as u8;
    Tint::from_rgba8(scale(color.r()), scale(color.g()), scale(color.b()), 255)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stamp_engine::render::stamp::ColorKey;

    fn keyed() -> Pixels {
        let mut px = sheet();
        px.replace_color(ColorKey::MAGIC_PINK);
        px
    }

    #[test]
    fn sheet_is_square_and_sized() {
        let px = sheet();
        assert_eq!((px.width(), px.height()), (SIZE, SIZE));
        assert_eq!(px.data().len(), (SIZE * SIZE) as usize);
    }

    #[test]
    fn tile_centers_are_opaque_except_ring() {
        let px = keyed();
        let center = |tx: u32, ty: u32| px.get(tx * TILE + TILE / 2, ty * TILE + TILE / 2).unwrap();
        assert_eq!(center(0, 0).a(), 255);
        assert_eq!(center(0, 1).a(), 255);
        assert_eq!(center(0, 2).a(), 0);
        assert_eq!(center(0, 3).a(), 255);
    }

    #[test]
    fn background_is_keyed_out() {
        assert_eq!(sheet().get(0, 0), Some(Tint::MAGIC_PINK));
        let px = keyed();
        assert_eq!(px.get(0, 0), Some(Tint::TRANSPARENT));
        assert_eq!(px.get(SIZE - 1, SIZE - 1), Some(Tint::TRANSPARENT));
    }
}
