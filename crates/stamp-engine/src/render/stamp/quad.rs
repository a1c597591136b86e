use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Unit-quad corner, shared by every stamp instance.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub pos: [f32; 2], // 0..1
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Unit square in triangle-strip order: (0,0) (1,0) (0,1) (1,1).
///
/// The vertex shader picks texture coordinates by `vertex_index % 4`, so this
/// order must stay in sync with the tex-coord switch in `stamp.wgsl`.
pub const QUAD_STRIP: [QuadVertex; 4] = [
    QuadVertex { pos: [0.0, 0.0] },
    QuadVertex { pos: [1.0, 0.0] },
    QuadVertex { pos: [0.0, 1.0] },
    QuadVertex { pos: [1.0, 1.0] },
];

/// Static vertex buffer holding [`QUAD_STRIP`].
///
/// Created once per renderer and never rewritten.
pub(super) struct QuadGeometry {
    vbo: wgpu::Buffer,
}

impl QuadGeometry {
    pub(super) fn new(device: &wgpu::Device) -> Self {
        let vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("stamp quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_STRIP),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self { vbo }
    }

    #[inline]
    pub(super) const fn vertex_count() -> u32 {
        QUAD_STRIP.len() as u32
    }

    pub(super) fn bind(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_vertex_buffer(0, self.vbo.slice(..));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_is_unit_square_in_z_order() {
        let corners: Vec<[f32; 2]> = QUAD_STRIP.iter().map(|v| v.pos).collect();
        assert_eq!(corners, vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
        assert_eq!(QuadGeometry::vertex_count(), 4);
    }

    #[test]
    fn vertex_is_two_floats() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 8);
    }
}
