//! Bouncing, spinning sprites.

use rand::Rng;
use stamp_engine::coords::{Vec2, Viewport};
use stamp_engine::render::stamp::Stamp;

/// How a sprite moves, in pixels and radians per second.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Motion {
    pub velocity: Vec2,
    pub spin: f32,
}

pub struct Sprite {
    pub stamp: Stamp,
    pub motion: Motion,
}

impl Sprite {
    /// Copies `template`, centers its pin and scatters it over `canvas`.
    pub fn spawn<R: Rng>(template: &Stamp, canvas: Viewport, rng: &mut R) -> Self {
        let mut stamp = template.clone();
        let scale = rng.gen_range(0.75..2.5);
        let pos = Vec2::new(
            rng.gen_range(0.0..canvas.width.max(1.0)),
            rng.gen_range(0.0..canvas.height.max(1.0)),
        );
        stamp
            .params
            .center_pin()
            .rescale(scale, scale)
            .move_to(pos)
            .rotate(rng.gen_range(0.0..std::f32::consts::TAU))
            .with_alpha(rng.gen_range(0.6..1.0));
        if rng.gen_bool(0.5) {
            stamp.params.flip_x();
        }

        let speed: f32 = rng.gen_range(40.0..220.0);
        let heading: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
        Self {
            stamp,
            motion: Motion {
                velocity: Vec2::new(heading.cos(), heading.sin()) * speed,
                spin: rng.gen_range(-3.0..3.0),
            },
        }
    }

    pub fn update(&mut self, dt: f32, canvas: Viewport) {
        step(&mut self.stamp, &mut self.motion, dt, canvas);
    }
}

/// Advances one sprite by `dt` seconds, reflecting its pin off the canvas
/// edges.
pub fn step(stamp: &mut Stamp, motion: &mut Motion, dt: f32, canvas: Viewport) {
    let params = &mut stamp.params;
    params.move_by(motion.velocity * dt).rotate_by(motion.spin * dt).fix_angle();

    let (x, vx) = bounce(params.pos.x, motion.velocity.x, canvas.width);
    let (y, vy) = bounce(params.pos.y, motion.velocity.y, canvas.height);
    params.move_to(Vec2::new(x, y));
    motion.velocity = Vec2::new(vx, vy);
}

/// Folds `p` back into `[0, extent]` and turns `v` away from the wall it hit.
fn bounce(p: f32, v: f32, extent: f32) -> (f32, f32) {
    if p < 0.0 {
        ((-p).min(extent), v.abs())
    } else if p > extent {
        ((2.0 * extent - p).max(0.0), -v.abs())
    } else {
        (p, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_is_unchanged() {
        assert_eq!(bounce(5.0, 3.0, 10.0), (5.0, 3.0));
    }

    #[test]
    fn reflects_off_near_wall() {
        assert_eq!(bounce(-2.0, -4.0, 10.0), (2.0, 4.0));
    }

    #[test]
    fn reflects_off_far_wall() {
        assert_eq!(bounce(12.0, 4.0, 10.0), (8.0, -4.0));
    }

    #[test]
    fn overshoot_stays_on_canvas() {
        assert_eq!(bounce(-30.0, -1.0, 10.0), (10.0, 1.0));
        assert_eq!(bounce(40.0, 1.0, 10.0), (0.0, -1.0));
    }
}
