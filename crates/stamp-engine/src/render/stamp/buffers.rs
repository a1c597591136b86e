use wgpu::util::DeviceExt;

use super::instance::{InstanceBatch, StampTransform, TexRect};
use super::StampError;

const TRANSFORM_STRIDE: u64 = std::mem::size_of::<StampTransform>() as u64;
const TEX_RECT_STRIDE: u64 = std::mem::size_of::<TexRect>() as u64;
const TINT_STRIDE: u64 = std::mem::size_of::<u32>() as u64;

/// GPU-side copies of the four instance streams, sized once for the
/// renderer's capacity.
///
/// Vertex slots: 1 = transforms, 2 = tex rects, 3 = tints. Texture units are
/// one byte per stamp, which is not a legal vertex stride, so they live in a
/// storage buffer read by `instance_index` instead.
pub(super) struct InstanceBuffers {
    capacity: usize,
    transforms: wgpu::Buffer,
    tex_rects: wgpu::Buffer,
    tex_units: wgpu::Buffer,
    tints: wgpu::Buffer,
}

impl InstanceBuffers {
    /// Allocates room for `capacity` stamps (at least one, so a zero-capacity
    /// renderer still has valid bindings).
    pub(super) fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let slots = capacity.max(1) as u64;

        let vertex = |label: &str, stride: u64| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: stride * slots,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        let transforms = vertex("stamp transform vbo", TRANSFORM_STRIDE);
        let tex_rects = vertex("stamp tex rect vbo", TEX_RECT_STRIDE);
        let tints = vertex("stamp tint vbo", TINT_STRIDE);
        let tex_units = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("stamp tex unit ssbo"),
            size: packed_unit_len(slots as usize),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::debug!("stamp instance buffers allocated for {capacity} stamps");

        Self {
            capacity,
            transforms,
            tex_rects,
            tex_units,
            tints,
        }
    }

    #[inline]
    pub(super) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(super) fn tex_units(&self) -> &wgpu::Buffer {
        &self.tex_units
    }

    /// Records copies of the first `count` instances of every stream.
    ///
    /// Callers guarantee `count <= batch.len()` and `count <= capacity`.
    pub(super) fn upload(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        batch: &InstanceBatch,
        count: usize,
    ) {
        debug_assert!(count <= self.capacity && count <= batch.len());

        stage_copy(
            device,
            encoder,
            &self.transforms,
            bytemuck::cast_slice(&batch.transforms()[..count]),
        );
        stage_copy(
            device,
            encoder,
            &self.tex_rects,
            bytemuck::cast_slice(&batch.tex_rects()[..count]),
        );
        stage_copy(
            device,
            encoder,
            &self.tex_units,
            &packed_unit_bytes(&batch.tex_units()[..count]),
        );
        stage_copy(
            device,
            encoder,
            &self.tints,
            bytemuck::cast_slice(&batch.tints()[..count]),
        );
    }

    pub(super) fn bind(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_vertex_buffer(1, self.transforms.slice(..));
        rpass.set_vertex_buffer(2, self.tex_rects.slice(..));
        rpass.set_vertex_buffer(3, self.tints.slice(..));
    }
}

/// Records a copy of `bytes` into the start of `dst`.
///
/// The data goes through a fresh staging buffer so that several draws recorded
/// into one encoder each read their own contents; `Queue::write_buffer` would
/// land every write before the whole submission.
pub(super) fn stage_copy(
    device: &wgpu::Device,
    encoder: &mut wgpu::CommandEncoder,
    dst: &wgpu::Buffer,
    bytes: &[u8],
) {
    if bytes.is_empty() {
        return;
    }
    let staging = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("stamp staging"),
        contents: bytes,
        usage: wgpu::BufferUsages::COPY_SRC,
    });
    encoder.copy_buffer_to_buffer(&staging, 0, dst, 0, bytes.len() as u64);
}

/// Byte length of the texture-unit buffer for `count` stamps (4-byte aligned).
#[inline]
pub(super) fn packed_unit_len(count: usize) -> u64 {
    (count as u64).next_multiple_of(4)
}

/// Texture units as uploaded: one byte per stamp, zero-padded to a multiple
/// of 4 so the shader can read them as `array<u32>`.
pub(super) fn packed_unit_bytes(units: &[u8]) -> Vec<u8> {
    let mut bytes = units.to_vec();
    bytes.resize(packed_unit_len(units.len()) as usize, 0);
    bytes
}

/// Checks that buffers for `capacity` stamps fit within the device limits.
pub(super) fn check_capacity(capacity: usize, limits: &wgpu::Limits) -> Result<(), StampError> {
    let slots = capacity.max(1) as u64;

    let largest_vertex = TRANSFORM_STRIDE * slots;
    if largest_vertex > limits.max_buffer_size {
        return Err(StampError::ResourceExhaustion {
            what: "transform buffer",
            requested: largest_vertex,
            limit: limits.max_buffer_size,
        });
    }

    let units = packed_unit_len(slots as usize);
    let storage_limit = u64::from(limits.max_storage_buffer_binding_size);
    if units > storage_limit {
        return Err(StampError::ResourceExhaustion {
            what: "texture unit buffer",
            requested: units,
            limit: storage_limit,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_bytes_pad_to_words() {
        assert_eq!(packed_unit_bytes(&[]), Vec::<u8>::new());
        assert_eq!(packed_unit_bytes(&[1, 2, 3]), vec![1, 2, 3, 0]);
        assert_eq!(packed_unit_bytes(&[5, 4, 3, 2, 1]), vec![5, 4, 3, 2, 1, 0, 0, 0]);
    }

    #[test]
    fn unit_words_read_back_little_endian() {
        // Shader unpacks byte i as (word[i / 4] >> (8 * (i % 4))) & 0xff.
        let bytes = packed_unit_bytes(&[0, 1, 2, 3, 4, 5]);
        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let unpacked: Vec<u32> = (0..6).map(|i| (words[i / 4] >> (8 * (i % 4))) & 0xff).collect();
        assert_eq!(unpacked, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn capacity_checks_device_limits() {
        let limits = wgpu::Limits::downlevel_defaults();
        assert!(check_capacity(512, &limits).is_ok());
        assert!(check_capacity(0, &limits).is_ok());

        let huge = (limits.max_buffer_size / TRANSFORM_STRIDE + 1) as usize;
        assert!(matches!(
            check_capacity(huge, &limits),
            Err(StampError::ResourceExhaustion { what: "transform buffer", .. })
        ));
    }
}
