//! GPU rendering subsystem.
//!
//! Renderers own their GPU resources (pipelines, buffers, bind groups) and
//! record into a [`RenderTarget`] handed out by the frame loop.
//!
//! Convention:
//! - canvas space is physical pixels, top-left origin, +Y down
//! - vertex shaders convert to clip space from the target size

mod ctx;
pub mod stamp;

pub use ctx::{RenderCtx, RenderTarget};
