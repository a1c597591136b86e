//! Core engine-facing contracts.
//!
//! The stable interface between the runtime (platform loop) and games built
//! on it: the callbacks an app implements and the per-frame context it gets.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
