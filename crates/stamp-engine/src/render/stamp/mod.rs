//! Instanced textured-quad ("stamp") renderer.
//!
//! Every stamp is the same unit quad, placed by per-instance data:
//! - transform: pin, size, position, rotation as `(sin, cos)`
//! - texture sub-rectangle
//! - texture unit (which of the draw's textures to sample)
//! - packed `0xAARRGGBB` tint
//!
//! One [`StampRenderer::draw`] call issues exactly one instanced draw of the
//! first `instance_count` instances of the current [`InstanceBatch`], sampling
//! from up to [`MAX_TEXTURES`] textures. Instances are painted in batch order
//! with straight-alpha blending, so later instances land on top.
//!
//! Textures come from packed pixels, encoded images ([`Pixels`], with an
//! optional [`ColorKey`]) or a [`TextureAtlas`] description naming regions of
//! one or more pages.
//!
//! [`StampFrame`] sits on top for the common case: it assigns texture units,
//! fills the batch from [`Stamp`]s and flushes whenever the batch or the
//! texture units run out.

mod atlas;
mod buffers;
mod error;
mod frame;
mod instance;
mod pipeline;
mod pixels;
mod quad;
mod renderer;
mod stamp;
mod texture;
mod units;

pub mod transform;

/// Texture units a single draw can sample from.
pub const MAX_TEXTURES: usize = 6;

pub use atlas::{
    parse_atlas, AtlasDesc, AtlasEntry, AtlasPage, AtlasRegion, TextureAtlas,
};
pub use error::StampError;
pub use frame::{FrameStats, StampFrame};
pub use instance::{InstanceBatch, StampInstance, StampTransform, TexRect};
pub use pixels::{ColorKey, Pixels};
pub use quad::{QuadVertex, QUAD_STRIP};
pub use renderer::{plan_draw, DrawPlan, StampConfig, StampRenderer};
pub use stamp::{grid_tile_rects, tile_rects, Padding, Stamp, StampParams};
pub use texture::{
    rgba8_to_argb, validate_dimensions, SamplerOptions, StampTexture, TextureFilter, TextureId,
    TextureWrap,
};
pub use units::UnitTable;
