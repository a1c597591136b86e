use bytemuck::{Pod, Zeroable};

use crate::coords::Vec2;
use crate::paint::Tint;

use super::{StampError, MAX_TEXTURES};

/// Per-instance placement, 8 floats (32 bytes) per stamp.
///
/// Layout matches the transform vertex stream:
/// `pin.xy, size.xy, pos.xy, rotation.(sin, cos)`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct StampTransform {
    /// Rotation/anchor origin in scaled local space (pixels).
    pub pin: [f32; 2],
    /// Scale applied to the unit quad.
    pub size: [f32; 2],
    /// Placement of the pin in canvas pixels.
    pub pos: [f32; 2],
    /// `(sin θ, cos θ)`.
    pub rotation: [f32; 2],
}

impl StampTransform {
    /// `(sin, cos)` for an unrotated stamp.
    pub const NO_ROTATION: [f32; 2] = [0.0, 1.0];

    /// Builds a transform from an angle in radians.
    ///
    /// An angle of exactly zero skips the trigonometry and yields
    /// [`NO_ROTATION`](Self::NO_ROTATION).
    pub fn new(pin: Vec2, size: Vec2, pos: Vec2, angle: f32) -> Self {
        let rotation = if angle == 0.0 {
            Self::NO_ROTATION
        } else {
            let (sin, cos) = angle.sin_cos();
            [sin, cos]
        };
        Self {
            pin: pin.to_array(),
            size: size.to_array(),
            pos: pos.to_array(),
            rotation,
        }
    }

    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        1 => Float32x2, // pin
        2 => Float32x2, // size
        3 => Float32x2, // pos
        4 => Float32x2  // rotation (sin, cos)
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<StampTransform>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// Texture sub-rectangle in normalized coordinates, 4 floats per stamp.
///
/// `(u0, v0)` lands on quad corner 0 and `(u1, v1)` on corner 3. Swapping
/// `u0`/`u1` mirrors the stamp horizontally.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TexRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl TexRect {
    /// The whole texture.
    pub const FULL: TexRect = TexRect::new(0.0, 0.0, 1.0, 1.0);

    #[inline]
    pub const fn new(u0: f32, v0: f32, u1: f32, v1: f32) -> Self {
        Self { u0, v0, u1, v1 }
    }

    /// Normalizes a pixel-space region of a `tex_w` x `tex_h` texture.
    pub fn from_pixels(x: u32, y: u32, w: u32, h: u32, tex_w: u32, tex_h: u32) -> Self {
        let tw = tex_w.max(1) as f32;
        let th = tex_h.max(1) as f32;
        let u0 = x as f32 / tw;
        let v0 = y as f32 / th;
        Self::new(u0, v0, u0 + w as f32 / tw, v0 + h as f32 / th)
    }

    #[inline]
    pub fn flipped_x(self) -> Self {
        Self::new(self.u1, self.v0, self.u0, self.v1)
    }

    #[inline]
    pub fn flipped_y(self) -> Self {
        Self::new(self.u0, self.v1, self.u1, self.v0)
    }

    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        5 => Float32x2, // (u0, v0)
        6 => Float32x2  // (u1, v1)
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TexRect>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

impl Default for TexRect {
    fn default() -> Self {
        TexRect::FULL
    }
}

const TINT_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![7 => Uint32];

/// Vertex layout of the tint stream (one packed `u32` per stamp).
pub(super) fn tint_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<u32>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &TINT_ATTRS,
    }
}

/// One stamp's worth of draw data.
///
/// Transient: built fresh each frame and pushed into an [`InstanceBatch`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StampInstance {
    pub transform: StampTransform,
    pub tex_rect: TexRect,
    /// Index into the textures bound for the draw, `0..texture_count`.
    pub unit: u8,
    pub tint: Tint,
}

/// Host-side instance data for one draw, stored as four co-indexed streams.
///
/// Invariants:
/// - all four streams have the same length
/// - length never exceeds `max_stamps`
/// - `max_textures <= MAX_TEXTURES`
///
/// Every texture unit must also be below the texture count passed to the
/// draw; that is checked (debug builds) when the batch is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceBatch {
    max_stamps: usize,
    max_textures: usize,

    transforms: Vec<StampTransform>,
    tex_rects: Vec<TexRect>,
    tex_units: Vec<u8>,
    tints: Vec<u32>,
}

impl InstanceBatch {
    /// Empty batch with room for `max_stamps` instances and all texture units.
    pub fn new(max_stamps: usize) -> Self {
        Self {
            max_stamps,
            max_textures: MAX_TEXTURES,
            transforms: Vec::with_capacity(max_stamps),
            tex_rects: Vec::with_capacity(max_stamps),
            tex_units: Vec::with_capacity(max_stamps),
            tints: Vec::with_capacity(max_stamps),
        }
    }

    /// Adopts four pre-filled, zero-based streams without copying them.
    pub fn from_streams(
        max_stamps: usize,
        max_textures: usize,
        transforms: Vec<StampTransform>,
        tex_rects: Vec<TexRect>,
        tex_units: Vec<u8>,
        tints: Vec<u32>,
    ) -> Result<Self, StampError> {
        if max_textures > MAX_TEXTURES {
            return Err(StampError::TextureUnitLimit {
                requested: max_textures,
                max: MAX_TEXTURES,
            });
        }

        let len = transforms.len();
        if tex_rects.len() != len || tex_units.len() != len || tints.len() != len {
            return Err(StampError::MismatchedStreams {
                transforms: len,
                tex_rects: tex_rects.len(),
                tex_units: tex_units.len(),
                tints: tints.len(),
            });
        }

        if len > max_stamps {
            return Err(StampError::BatchOverflow { len, max_stamps });
        }

        Ok(Self {
            max_stamps,
            max_textures,
            transforms,
            tex_rects,
            tex_units,
            tints,
        })
    }

    #[inline]
    pub fn max_stamps(&self) -> usize {
        self.max_stamps
    }

    #[inline]
    pub fn max_textures(&self) -> usize {
        self.max_textures
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.max_stamps
    }

    /// Appends one instance.
    ///
    /// # Panics
    /// If the batch is already full. Callers flush before that happens.
    pub fn push(&mut self, instance: StampInstance) {
        assert!(
            !self.is_full(),
            "InstanceBatch::push: batch is full ({} stamps)",
            self.max_stamps
        );
        self.transforms.push(instance.transform);
        self.tex_rects.push(instance.tex_rect);
        self.tex_units.push(instance.unit);
        self.tints.push(instance.tint.0);
    }

    /// Appends one instance, or returns `BatchOverflow` when full.
    pub fn try_push(&mut self, instance: StampInstance) -> Result<(), StampError> {
        if self.is_full() {
            return Err(StampError::BatchOverflow {
                len: self.len() + 1,
                max_stamps: self.max_stamps,
            });
        }
        self.push(instance);
        Ok(())
    }

    /// Drops all instances; keeps allocated capacity.
    pub fn clear(&mut self) {
        self.transforms.clear();
        self.tex_rects.clear();
        self.tex_units.clear();
        self.tints.clear();
    }

    pub fn get(&self, index: usize) -> Option<StampInstance> {
        Some(StampInstance {
            transform: *self.transforms.get(index)?,
            tex_rect: *self.tex_rects.get(index)?,
            unit: *self.tex_units.get(index)?,
            tint: Tint(*self.tints.get(index)?),
        })
    }

    #[inline]
    pub fn transforms(&self) -> &[StampTransform] {
        &self.transforms
    }

    #[inline]
    pub fn tex_rects(&self) -> &[TexRect] {
        &self.tex_rects
    }

    #[inline]
    pub fn tex_units(&self) -> &[u8] {
        &self.tex_units
    }

    #[inline]
    pub fn tints(&self) -> &[u32] {
        &self.tints
    }

    /// Index of the first of the leading `count` instances whose texture unit
    /// is not below `texture_count`.
    pub fn first_unbound_unit(&self, count: usize, texture_count: usize) -> Option<usize> {
        self.tex_units
            .iter()
            .take(count)
            .position(|&unit| unit as usize >= texture_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(unit: u8, x: f32) -> StampInstance {
        StampInstance {
            transform: StampTransform::new(Vec2::zero(), Vec2::splat(4.0), Vec2::new(x, 0.0), 0.0),
            tex_rect: TexRect::FULL,
            unit,
            tint: Tint::WHITE,
        }
    }

    #[test]
    fn gpu_strides_match_stream_layout() {
        assert_eq!(std::mem::size_of::<StampTransform>(), 8 * 4);
        assert_eq!(std::mem::size_of::<TexRect>(), 4 * 4);
    }

    #[test]
    fn zero_angle_skips_trig() {
        let t = StampTransform::new(Vec2::zero(), Vec2::splat(1.0), Vec2::zero(), 0.0);
        assert_eq!(t.rotation, [0.0, 1.0]);

        let t = StampTransform::new(Vec2::zero(), Vec2::splat(1.0), Vec2::zero(), std::f32::consts::FRAC_PI_2);
        assert!((t.rotation[0] - 1.0).abs() < 1e-6);
        assert!(t.rotation[1].abs() < 1e-6);
    }

    #[test]
    fn push_keeps_streams_co_indexed() {
        let mut batch = InstanceBatch::new(4);
        batch.push(instance(0, 1.0));
        batch.push(instance(2, 2.0));

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.tex_units(), &[0, 2]);
        assert_eq!(batch.transforms()[1].pos, [2.0, 0.0]);
        assert_eq!(batch.get(1), Some(instance(2, 2.0)));
        assert_eq!(batch.get(2), None);
    }

    #[test]
    fn try_push_reports_overflow() {
        let mut batch = InstanceBatch::new(1);
        assert!(batch.try_push(instance(0, 0.0)).is_ok());
        assert!(batch.is_full());
        assert_eq!(
            batch.try_push(instance(0, 0.0)),
            Err(StampError::BatchOverflow { len: 2, max_stamps: 1 })
        );
    }

    #[test]
    #[should_panic(expected = "batch is full")]
    fn push_past_capacity_panics() {
        let mut batch = InstanceBatch::new(0);
        batch.push(instance(0, 0.0));
    }

    #[test]
    fn clear_keeps_capacity_and_limits() {
        let mut batch = InstanceBatch::new(8);
        batch.push(instance(1, 0.0));
        batch.clear();
        assert!(batch.is_empty());
        assert_eq!(batch.max_stamps(), 8);
        assert_eq!(batch.max_textures(), MAX_TEXTURES);
    }

    #[test]
    fn from_streams_rejects_mismatched_lengths() {
        let err = InstanceBatch::from_streams(
            4,
            MAX_TEXTURES,
            vec![StampTransform::default(); 2],
            vec![TexRect::FULL; 2],
            vec![0; 1],
            vec![0; 2],
        )
        .unwrap_err();
        assert_eq!(
            err,
            StampError::MismatchedStreams { transforms: 2, tex_rects: 2, tex_units: 1, tints: 2 }
        );
    }

    #[test]
    fn from_streams_rejects_overflow_and_unit_limit() {
        let err = InstanceBatch::from_streams(
            1,
            MAX_TEXTURES,
            vec![StampTransform::default(); 2],
            vec![TexRect::FULL; 2],
            vec![0; 2],
            vec![0; 2],
        )
        .unwrap_err();
        assert_eq!(err, StampError::BatchOverflow { len: 2, max_stamps: 1 });

        let err = InstanceBatch::from_streams(1, 7, vec![], vec![], vec![], vec![]).unwrap_err();
        assert_eq!(err, StampError::TextureUnitLimit { requested: 7, max: MAX_TEXTURES });
    }

    #[test]
    fn first_unbound_unit_only_checks_drawn_prefix() {
        let batch = InstanceBatch::from_streams(
            4,
            MAX_TEXTURES,
            vec![StampTransform::default(); 3],
            vec![TexRect::FULL; 3],
            vec![0, 1, 5],
            vec![0; 3],
        )
        .unwrap();
        assert_eq!(batch.first_unbound_unit(2, 2), None);
        assert_eq!(batch.first_unbound_unit(3, 2), Some(2));
        assert_eq!(batch.first_unbound_unit(3, 1), Some(1));
    }

    #[test]
    fn tex_rect_flips_swap_edges() {
        let r = TexRect::new(0.25, 0.5, 0.75, 1.0);
        assert_eq!(r.flipped_x(), TexRect::new(0.75, 0.5, 0.25, 1.0));
        assert_eq!(r.flipped_y(), TexRect::new(0.25, 1.0, 0.75, 0.5));
        assert_eq!(r.flipped_x().flipped_x(), r);
    }

    #[test]
    fn tex_rect_from_pixels_normalizes() {
        let r = TexRect::from_pixels(16, 0, 16, 32, 64, 32);
        assert_eq!(r, TexRect::new(0.25, 0.0, 0.5, 1.0));
    }
}
