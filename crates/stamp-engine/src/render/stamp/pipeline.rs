use super::instance::{tint_layout, StampTransform, TexRect};
use super::quad::QuadVertex;
use super::units::{sampler_binding, texture_binding, StampUniform};
use super::MAX_TEXTURES;

pub(super) const SHADER_SRC: &str = include_str!("shaders/stamp.wgsl");

/// Compiled stamp program for one color target format.
pub(super) struct StampPipeline {
    format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl StampPipeline {
    pub(super) fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("stamp shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SRC.into()),
        });

        let mut entries = Vec::with_capacity(2 + 2 * MAX_TEXTURES);
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<StampUniform>() as u64),
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });
        for slot in 0..MAX_TEXTURES {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: texture_binding(slot),
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }
        for slot in 0..MAX_TEXTURES {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: sampler_binding(slot),
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("stamp bgl"),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("stamp pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("stamp pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    QuadVertex::layout(),
                    StampTransform::layout(),
                    TexRect::layout(),
                    tint_layout(),
                ],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    // straight alpha: textures and tints are not premultiplied
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("stamp pipeline created for {format:?}");

        Self {
            format,
            pipeline,
            bind_group_layout,
        }
    }

    #[inline]
    pub(super) fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    #[inline]
    pub(super) fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    #[inline]
    pub(super) fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse() -> naga::Module {
        match naga::front::wgsl::parse_str(SHADER_SRC) {
            Ok(module) => module,
            Err(e) => panic!("stamp.wgsl failed to parse:\n{}", e.emit_to_string(SHADER_SRC)),
        }
    }

    #[test]
    fn shader_validates() {
        let module = parse();
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        if let Err(e) = validator.validate(&module) {
            panic!("stamp.wgsl failed validation:\n{}", e.emit_to_string(SHADER_SRC));
        }
    }

    #[test]
    fn shader_exposes_both_entry_points() {
        let module = parse();
        let names: Vec<&str> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"vs_main"));
        assert!(names.contains(&"fs_main"));
    }

    #[test]
    fn shader_binds_one_texture_and_sampler_per_unit() {
        let module = parse();
        let bindings: Vec<u32> = module
            .global_variables
            .iter()
            .filter_map(|(_, var)| var.binding.as_ref().map(|b| b.binding))
            .collect();
        for b in 0..(2 + 2 * MAX_TEXTURES as u32) {
            assert!(bindings.contains(&b), "binding {b} missing from stamp.wgsl");
        }
        assert_eq!(bindings.len(), 2 + 2 * MAX_TEXTURES);
    }
}
