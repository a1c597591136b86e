use anyhow::Result;
use winit::event::WindowEvent;

use super::ctx::FrameCtx;
use crate::device::Gpu;
use crate::window::RuntimeCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by games and demos.
///
/// The runtime calls these in order: `on_start` once the window and GPU
/// exist, then `on_window_event` / `on_frame` until something returns
/// [`AppControl::Exit`] or the window closes.
pub trait App {
    /// Called once before the first frame. Create renderers and textures here.
    ///
    /// An error aborts the runtime.
    fn on_start(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        let _ = gpu;
        Ok(())
    }

    /// Called for every window event, before the runtime's own handling.
    fn on_window_event(&mut self, event: &WindowEvent, runtime: &mut RuntimeCtx) -> AppControl {
        let _ = (event, runtime);
        AppControl::Continue
    }

    /// Called once per rendered frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
