/// Initialization parameters for the GPU layer.
///
/// Defaults suit a 2D sprite game: vsync, no optional features.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface storage format when available.
    ///
    /// Frames are always drawn through a non-sRGB view of the surface, so
    /// this does not change the bytes written.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    ///
    /// The stamp shader reads texture units from a storage buffer in the
    /// vertex stage, so at least one storage buffer per stage is needed.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface (a hint).
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}

impl GpuInit {
    /// Uncapped frame rate where the platform supports it (falls back to FIFO).
    pub fn uncapped() -> Self {
        Self {
            present_mode: wgpu::PresentMode::AutoNoVsync,
            ..Self::default()
        }
    }
}
