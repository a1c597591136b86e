//! Stamp engine crate.
//!
//! A small 2D game runtime built around one renderer: instanced, textured,
//! tinted quads ("stamps") drawn in a single call per batch.
//!
//! - `window` / `core`: winit loop, the `App` callbacks, per-frame context
//! - `device`: wgpu adapter, device and surface
//! - `render::stamp`: the stamp renderer and its host-side batching

pub mod core;
pub mod device;
pub mod time;
pub mod window;

pub mod coords;
pub mod logging;
pub mod paint;
pub mod render;
