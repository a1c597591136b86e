use winit::dpi::PhysicalSize;

/// A single acquired surface frame.
///
/// Short-lived: holding the surface texture blocks acquisition of the next
/// one. Presented by [`Gpu::submit`](super::Gpu::submit).
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl GpuFrame {
    /// Size of the acquired texture in physical pixels.
    ///
    /// This is the canvas size renderers must map to, even if the window has
    /// been resized since the surface was last configured.
    pub fn size(&self) -> PhysicalSize<u32> {
        let size = self.surface_texture.texture.size();
        PhysicalSize::new(size.width, size.height)
    }
}
