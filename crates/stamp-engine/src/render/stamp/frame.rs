use std::sync::Arc;

use crate::render::{RenderCtx, RenderTarget};

use super::instance::StampInstance;
use super::renderer::StampRenderer;
use super::stamp::{Stamp, StampParams};
use super::texture::{StampTexture, TextureId};
use super::units::UnitTable;
use super::MAX_TEXTURES;

/// Counters for one [`StampFrame`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Instanced draw calls issued.
    pub draws: u32,
    /// Stamps drawn across all calls.
    pub stamps: u32,
}

/// Decides when pending stamps must be drawn.
///
/// Tracks how many stamps are queued and which texture owns each unit. A
/// stamp is admitted after a flush when the batch is full, or when its
/// texture has no unit and all [`MAX_TEXTURES`] are taken. Textures already
/// in the table keep their unit.
#[derive(Debug)]
pub(super) struct StampPacker<T> {
    capacity: usize,
    pending: usize,
    units: UnitTable<T>,
}

impl<T> StampPacker<T> {
    pub(super) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pending: 0,
            units: UnitTable::new(),
        }
    }

    #[inline]
    pub(super) fn pending(&self) -> usize {
        self.pending
    }

    /// Queues one stamp drawn from `id`, flushing first if needed.
    ///
    /// `flush` receives the pending count and the textures in unit order.
    /// Returns the stamp's texture unit, or `None` when there is no capacity
    /// at all (the stamp is dropped).
    pub(super) fn admit<F>(&mut self, id: TextureId, entry: T, flush: F) -> Option<u8>
    where
        F: FnOnce(usize, &[T]),
    {
        if self.capacity == 0 {
            return None;
        }

        let existing = self.units.find(id);
        if self.pending >= self.capacity || (existing.is_none() && self.units.is_full()) {
            self.flush(flush);
        }

        let unit = match self.units.find(id) {
            Some(unit) => unit,
            None => self.units.insert(id, entry),
        };
        self.pending += 1;
        Some(unit)
    }

    /// Hands pending stamps to `draw` (if any) and starts over.
    pub(super) fn flush<F>(&mut self, draw: F)
    where
        F: FnOnce(usize, &[T]),
    {
        if self.pending > 0 {
            draw(self.pending, self.units.entries());
        }
        self.pending = 0;
        self.units.clear();
    }
}

/// Fills a renderer's batch for one frame and draws it in as few calls as
/// possible.
///
/// Each distinct texture gets the next free unit. The pending stamps are
/// drawn (one call) when the batch is full or a texture arrives that would
/// need a seventh unit; the unit table then starts over. Whatever is pending
/// at [`finish`](Self::finish), or when the frame is dropped, is drawn too.
///
/// Stamps are drawn in the order they were added.
pub struct StampFrame<'f, 't> {
    renderer: &'f mut StampRenderer,
    ctx: &'f RenderCtx<'f>,
    target: &'f mut RenderTarget<'t>,

    packer: StampPacker<Arc<StampTexture>>,
    stats: FrameStats,
    warned_zero_capacity: bool,
}

impl<'f, 't> StampFrame<'f, 't> {
    pub(super) fn new(
        renderer: &'f mut StampRenderer,
        ctx: &'f RenderCtx<'f>,
        target: &'f mut RenderTarget<'t>,
    ) -> Self {
        let max_stamps = renderer.max_stamps();
        let reusable = renderer
            .batch()
            .is_some_and(|b| b.max_stamps() <= max_stamps && b.max_textures() == MAX_TEXTURES);
        if !reusable {
            let batch = renderer.new_batch();
            renderer.set_batch(batch);
        } else if let Some(batch) = renderer.batch_mut() {
            if !batch.is_empty() {
                log::warn!(
                    "stamp frame: discarding {} instances left from an unfinished frame",
                    batch.len()
                );
                batch.clear();
            }
        }

        let capacity = renderer.batch().map_or(0, |b| b.max_stamps());
        Self {
            renderer,
            ctx,
            target,
            packer: StampPacker::new(capacity),
            stats: FrameStats::default(),
            warned_zero_capacity: false,
        }
    }

    /// Queues one stamp.
    pub fn stamp(&mut self, stamp: &Stamp) {
        self.stamp_params(stamp.texture(), &stamp.params);
    }

    /// Queues `params` drawn from `texture`.
    pub fn stamp_params(&mut self, texture: &Arc<StampTexture>, params: &StampParams) {
        let Self {
            renderer,
            ctx,
            target,
            packer,
            stats,
            ..
        } = self;
        let unit = packer.admit(texture.id(), Arc::clone(texture), |count, textures| {
            draw_pending(renderer, ctx, target, stats, count, textures)
        });

        match unit {
            Some(unit) => self.push(params.to_instance(unit)),
            None if !self.warned_zero_capacity => {
                log::warn!("stamp frame: renderer has no instance capacity; stamps dropped");
                self.warned_zero_capacity = true;
            }
            None => {}
        }
    }

    /// Draws everything queued so far.
    pub fn flush(&mut self) {
        let Self {
            renderer,
            ctx,
            target,
            packer,
            stats,
            ..
        } = self;
        packer.flush(|count, textures| draw_pending(renderer, ctx, target, stats, count, textures));
    }

    /// Draws the remainder and returns the frame's counters.
    pub fn finish(mut self) -> FrameStats {
        self.flush();
        self.stats
    }

    #[inline]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    fn push(&mut self, instance: StampInstance) {
        if let Some(batch) = self.renderer.batch_mut() {
            batch.push(instance);
        }
    }
}

/// Draws the first `count` batch instances with `textures` bound, then
/// empties the batch.
fn draw_pending(
    renderer: &mut StampRenderer,
    ctx: &RenderCtx<'_>,
    target: &mut RenderTarget<'_>,
    stats: &mut FrameStats,
    count: usize,
    textures: &[Arc<StampTexture>],
) {
    if renderer.draw(ctx, target, count, textures).is_some() {
        stats.draws += 1;
        stats.stamps += count as u32;
    }
    if let Some(batch) = renderer.batch_mut() {
        batch.clear();
    }
}

impl Drop for StampFrame<'_, '_> {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Runs `ids` through a packer; returns `(stamps, units)` per draw and
    /// the unit each stamp got.
    fn pack(capacity: usize, ids: &[TextureId]) -> (Vec<(usize, usize)>, Vec<Option<u8>>) {
        let mut packer = StampPacker::new(capacity);
        let mut draws = Vec::new();
        let mut units = Vec::new();
        for &id in ids {
            units.push(packer.admit(id, id, |n, t| draws.push((n, t.len()))));
        }
        packer.flush(|n, t| draws.push((n, t.len())));
        (draws, units)
    }

    fn textures(n: usize) -> Vec<TextureId> {
        (0..n).map(|_| TextureId::next()).collect()
    }

    #[test]
    fn round_robin_over_nine_textures_flushes_on_the_seventh() {
        let tex = textures(9);
        let ids: Vec<_> = (0..2000).map(|i| tex[i % 9]).collect();
        let (draws, units) = pack(1024, &ids);

        assert_eq!(draws.len(), 334);
        assert!(draws[..333].iter().all(|&d| d == (6, 6)));
        assert_eq!(draws[333], (2, 2));
        assert_eq!(draws.iter().map(|d| d.0).sum::<usize>(), 2000);

        // The unit table restarts after every flush.
        assert_eq!(&units[..8], &[Some(0), Some(1), Some(2), Some(3), Some(4), Some(5), Some(0), Some(1)]);
    }

    #[test]
    fn full_batch_flushes_and_keeps_the_current_texture() {
        let tex = textures(9);
        let ids: Vec<_> = tex.iter().flat_map(|&t| std::iter::repeat_n(t, 200)).collect();
        let (draws, units) = pack(1024, &ids);

        // Capacity runs out inside the sixth texture's run; its remaining
        // stamps start the second draw at unit 0.
        assert_eq!(draws, vec![(1024, 6), (776, 4)]);
        assert_eq!(units[1023], Some(5));
        assert_eq!(units[1024], Some(0));
        assert_eq!(units[1199], Some(0));
        assert_eq!(units[1200], Some(1));
    }

    #[test]
    fn single_texture_splits_only_on_capacity() {
        let tex = textures(1);
        let (draws, units) = pack(1024, &vec![tex[0]; 2000]);
        assert_eq!(draws, vec![(1024, 1), (976, 1)]);
        assert!(units.iter().all(|&u| u == Some(0)));
    }

    #[test]
    fn known_textures_reuse_their_unit() {
        let tex = textures(2);
        let (draws, units) = pack(16, &[tex[0], tex[1], tex[0], tex[1], tex[1]]);
        assert_eq!(draws, vec![(5, 2)]);
        assert_eq!(units, vec![Some(0), Some(1), Some(0), Some(1), Some(1)]);
    }

    #[test]
    fn six_textures_share_one_draw() {
        let tex = textures(MAX_TEXTURES);
        let (draws, _) = pack(64, &tex);
        assert_eq!(draws, vec![(MAX_TEXTURES, MAX_TEXTURES)]);
    }

    #[test]
    fn zero_capacity_drops_everything() {
        let tex = textures(3);
        let (draws, units) = pack(0, &tex);
        assert!(draws.is_empty());
        assert_eq!(units, vec![None, None, None]);
    }

    #[test]
    fn empty_frame_draws_nothing() {
        let (draws, units) = pack(8, &[]);
        assert!(draws.is_empty());
        assert!(units.is_empty());
    }

    #[test]
    fn pending_resets_after_flush() {
        let tex = textures(1);
        let mut packer = StampPacker::new(4);
        packer.admit(tex[0], (), |_, _| {});
        packer.admit(tex[0], (), |_, _| {});
        assert_eq!(packer.pending(), 2);

        let mut drawn = None;
        packer.flush(|n, t| drawn = Some((n, t.len())));
        assert_eq!(drawn, Some((2, 1)));
        assert_eq!(packer.pending(), 0);
    }
}
