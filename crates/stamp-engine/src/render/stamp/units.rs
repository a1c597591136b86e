use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::coords::Viewport;

use super::texture::{StampTexture, TextureId};
use super::MAX_TEXTURES;

/// Per-draw uniform block (`Globals` in `stamp.wgsl`).
///
/// `sampler_slots[unit / 4][unit % 4]` is the texture slot sampled for a
/// logical texture unit. Only the first `active_textures` entries are read.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct StampUniform {
    pub canvas_size: [f32; 2],
    pub active_textures: u32,
    pub _pad: u32,
    pub sampler_slots: [[u32; 4]; 2],
}

impl StampUniform {
    pub(super) fn new(canvas: Viewport, texture_count: usize) -> Self {
        let mut sampler_slots = [[0u32; 4]; 2];
        for unit in 0..texture_count.min(MAX_TEXTURES) {
            sampler_slots[unit / 4][unit % 4] = unit as u32;
        }
        Self {
            canvas_size: canvas.clamped_size(),
            active_textures: texture_count.min(MAX_TEXTURES) as u32,
            _pad: 0,
            sampler_slots,
        }
    }
}

/// Texture slots of the stamp bind group.
///
/// Slot `i` holds the texture bound for unit `i` by the most recent draw that
/// used at least `i + 1` textures. Slots a draw does not use keep whatever
/// they held; before first use they hold a 1x1 white placeholder so the bind
/// group is always complete.
pub(super) struct TextureUnits {
    slots: [Arc<StampTexture>; MAX_TEXTURES],
    bind_group: Option<wgpu::BindGroup>,
}

impl TextureUnits {
    pub(super) fn new(placeholder: Arc<StampTexture>) -> Self {
        Self {
            slots: std::array::from_fn(|_| Arc::clone(&placeholder)),
            bind_group: None,
        }
    }

    /// Binds `textures[i]` to slot `i`.
    ///
    /// # Panics
    /// If more than [`MAX_TEXTURES`] textures are given.
    pub(super) fn bind(&mut self, textures: &[Arc<StampTexture>]) {
        assert!(
            textures.len() <= MAX_TEXTURES,
            "TextureUnits::bind: {} textures exceed the {MAX_TEXTURES} available units",
            textures.len()
        );

        for (slot, tex) in self.slots.iter_mut().zip(textures) {
            if slot.id() != tex.id() {
                *slot = Arc::clone(tex);
                self.bind_group = None;
            }
        }
    }

    /// Drops the bind group; the next draw rebuilds it against a new layout.
    #[inline]
    pub(super) fn invalidate(&mut self) {
        self.bind_group = None;
    }

    pub(super) fn ensure_bind_group(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform: &wgpu::Buffer,
        tex_units: &wgpu::Buffer,
    ) -> &wgpu::BindGroup {
        self.bind_group.get_or_insert_with(|| {
            log::debug!("stamp bind group rebuilt: slots={:?}", self.slots.each_ref().map(|t| t.id()));

            let mut entries = Vec::with_capacity(2 + 2 * MAX_TEXTURES);
            entries.push(wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 1,
                resource: tex_units.as_entire_binding(),
            });
            for (i, tex) in self.slots.iter().enumerate() {
                entries.push(wgpu::BindGroupEntry {
                    binding: texture_binding(i),
                    resource: wgpu::BindingResource::TextureView(tex.view()),
                });
            }
            for (i, tex) in self.slots.iter().enumerate() {
                entries.push(wgpu::BindGroupEntry {
                    binding: sampler_binding(i),
                    resource: wgpu::BindingResource::Sampler(tex.sampler()),
                });
            }

            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("stamp bind group"),
                layout,
                entries: &entries,
            })
        })
    }
}

/// Bind group index of the texture in slot `i`.
#[inline]
pub(super) const fn texture_binding(slot: usize) -> u32 {
    2 + slot as u32
}

/// Bind group index of the sampler in slot `i`.
#[inline]
pub(super) const fn sampler_binding(slot: usize) -> u32 {
    2 + (MAX_TEXTURES + slot) as u32
}

/// Assigns texture units to distinct textures in order of first use.
///
/// The frame-level producer keeps one of these per draw: a texture already in
/// the table reuses its unit, a new one takes the next free unit, and a full
/// table means the pending stamps must be drawn before continuing.
#[derive(Debug, Clone)]
pub struct UnitTable<T> {
    ids: Vec<TextureId>,
    entries: Vec<T>,
}

impl<T> Default for UnitTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> UnitTable<T> {
    pub fn new() -> Self {
        Self {
            ids: Vec::with_capacity(MAX_TEXTURES),
            entries: Vec::with_capacity(MAX_TEXTURES),
        }
    }

    /// Unit already assigned to `id`, if any.
    pub fn find(&self, id: TextureId) -> Option<u8> {
        self.ids.iter().position(|&x| x == id).map(|i| i as u8)
    }

    /// Assigns the next free unit to `id`.
    ///
    /// # Panics
    /// If the table is full or `id` is already present.
    pub fn insert(&mut self, id: TextureId, entry: T) -> u8 {
        assert!(!self.is_full(), "UnitTable::insert: all {MAX_TEXTURES} units in use");
        assert!(self.find(id).is_none(), "UnitTable::insert: {id:?} already has a unit");
        self.ids.push(id);
        self.entries.push(entry);
        (self.ids.len() - 1) as u8
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.ids.len() >= MAX_TEXTURES
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.entries.clear();
    }

    /// Entries in unit order.
    #[inline]
    pub fn entries(&self) -> &[T] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_48_bytes() {
        assert_eq!(std::mem::size_of::<StampUniform>(), 48);
    }

    #[test]
    fn uniform_maps_active_units_to_slots() {
        let u = StampUniform::new(Viewport::new(640.0, 0.0), 5);
        assert_eq!(u.canvas_size, [640.0, 1.0]);
        assert_eq!(u.active_textures, 5);
        assert_eq!(u.sampler_slots, [[0, 1, 2, 3], [4, 0, 0, 0]]);
    }

    #[test]
    fn bindings_do_not_overlap() {
        assert_eq!(texture_binding(0), 2);
        assert_eq!(texture_binding(MAX_TEXTURES - 1), 7);
        assert_eq!(sampler_binding(0), 8);
        assert_eq!(sampler_binding(MAX_TEXTURES - 1), 13);
    }

    #[test]
    fn table_reuses_units_by_identity() {
        let a = TextureId::next();
        let b = TextureId::next();
        let mut table = UnitTable::new();

        assert_eq!(table.find(a), None);
        assert_eq!(table.insert(a, "a"), 0);
        assert_eq!(table.insert(b, "b"), 1);
        assert_eq!(table.find(a), Some(0));
        assert_eq!(table.find(b), Some(1));
        assert_eq!(table.entries(), &["a", "b"]);
    }

    #[test]
    fn table_fills_at_max_textures_and_clears() {
        let mut table = UnitTable::new();
        for i in 0..MAX_TEXTURES {
            assert!(!table.is_full());
            assert_eq!(table.insert(TextureId::next(), i), i as u8);
        }
        assert!(table.is_full());

        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.insert(TextureId::next(), 99), 0);
    }

    #[test]
    #[should_panic(expected = "units in use")]
    fn inserting_into_full_table_panics() {
        let mut table = UnitTable::new();
        for _ in 0..=MAX_TEXTURES {
            table.insert(TextureId::next(), ());
        }
    }
}
