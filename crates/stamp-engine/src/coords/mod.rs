//! Coordinate types shared by the stamp renderer and the host.
//!
//! Canonical CPU space:
//! - Canvas pixels (physical framebuffer pixels)
//! - Origin top-left
//! - +X right, +Y down
//!
//! The stamp vertex shader converts to clip space using the canvas size uniform.

mod vec2;
mod viewport;

pub use vec2::Vec2;
pub use viewport::Viewport;
