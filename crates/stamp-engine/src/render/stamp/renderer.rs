use std::ops::Range;
use std::sync::Arc;

use crate::paint::Tint;
use crate::render::{RenderCtx, RenderTarget};

use super::buffers::{check_capacity, stage_copy, InstanceBuffers};
use super::frame::StampFrame;
use super::instance::InstanceBatch;
use super::pipeline::StampPipeline;
use super::quad::QuadGeometry;
use super::texture::StampTexture;
use super::units::{StampUniform, TextureUnits};
use super::{StampError, MAX_TEXTURES};

/// Stamp renderer settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampConfig {
    /// Most instances a single draw can cover. Buffers are sized for this once.
    pub max_stamps: usize,
    /// Background the host clears to before stamping.
    pub clear_color: wgpu::Color,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            max_stamps: 512,
            clear_color: wgpu::Color {
                r: 0.25,
                g: 0.25,
                b: 0.25,
                a: 1.0,
            },
        }
    }
}

/// What a single draw call covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawPlan {
    /// Always the four strip corners of the unit quad.
    pub vertices: Range<u32>,
    /// Leading instances of the batch, `0..instance_count`.
    pub instances: Range<u32>,
    pub texture_count: usize,
}

/// Decides whether a draw happens and what it covers.
///
/// Returns `None` (nothing to draw) when no batch is set or `instance_count`
/// is zero.
///
/// # Panics
/// - `instance_count` exceeds `max_stamps` or the batch length
/// - `texture_count` exceeds [`MAX_TEXTURES`] or the batch's declared limit
pub fn plan_draw(
    batch: Option<&InstanceBatch>,
    max_stamps: usize,
    instance_count: usize,
    texture_count: usize,
) -> Option<DrawPlan> {
    let batch = batch?;

    assert!(
        instance_count <= max_stamps,
        "stamp draw: {instance_count} instances exceed max_stamps ({max_stamps})"
    );
    assert!(
        instance_count <= batch.len(),
        "stamp draw: {instance_count} instances requested but batch holds {}",
        batch.len()
    );
    assert!(
        texture_count <= MAX_TEXTURES,
        "stamp draw: {texture_count} textures exceed the {MAX_TEXTURES} available units"
    );
    assert!(
        texture_count <= batch.max_textures(),
        "stamp draw: {texture_count} textures exceed the batch limit ({})",
        batch.max_textures()
    );

    if instance_count == 0 {
        return None;
    }

    Some(DrawPlan {
        vertices: 0..QuadGeometry::vertex_count(),
        instances: 0..instance_count as u32,
        texture_count,
    })
}

/// Draws batches of stamps with one instanced call per [`draw`](Self::draw).
///
/// The renderer does not own the instance data between frames: the host
/// hands it an [`InstanceBatch`] with [`set_batch`](Self::set_batch) and
/// refills it every frame. Until a batch is set, drawing is a no-op.
pub struct StampRenderer {
    config: StampConfig,

    pipeline: StampPipeline,
    quad: QuadGeometry,
    buffers: InstanceBuffers,
    uniform: wgpu::Buffer,
    units: TextureUnits,

    batch: Option<InstanceBatch>,
}

impl StampRenderer {
    /// Compiles the pipeline and allocates buffers for `config.max_stamps`.
    ///
    /// Fails with `ResourceExhaustion` if the buffers would not fit within the
    /// device limits.
    pub fn new(ctx: &RenderCtx<'_>, config: StampConfig) -> Result<Self, StampError> {
        check_capacity(config.max_stamps, &ctx.device.limits())?;

        let placeholder = StampTexture::solid(ctx.device, ctx.queue, Tint::WHITE)?;

        let uniform = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("stamp uniform"),
            size: std::mem::size_of::<StampUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::info!("stamp renderer ready: max_stamps={}", config.max_stamps);

        Ok(Self {
            config,
            pipeline: StampPipeline::new(ctx.device, ctx.surface_format),
            quad: QuadGeometry::new(ctx.device),
            buffers: InstanceBuffers::new(ctx.device, config.max_stamps),
            uniform,
            units: TextureUnits::new(placeholder),
            batch: None,
        })
    }

    #[inline]
    pub fn config(&self) -> &StampConfig {
        &self.config
    }

    #[inline]
    pub fn max_stamps(&self) -> usize {
        self.buffers.capacity()
    }

    /// Empty batch sized for this renderer.
    pub fn new_batch(&self) -> InstanceBatch {
        InstanceBatch::new(self.max_stamps())
    }

    /// Makes `batch` the source of subsequent draws; returns the previous one.
    pub fn set_batch(&mut self, batch: InstanceBatch) -> Option<InstanceBatch> {
        self.batch.replace(batch)
    }

    #[inline]
    pub fn batch(&self) -> Option<&InstanceBatch> {
        self.batch.as_ref()
    }

    #[inline]
    pub fn batch_mut(&mut self) -> Option<&mut InstanceBatch> {
        self.batch.as_mut()
    }

    pub fn take_batch(&mut self) -> Option<InstanceBatch> {
        self.batch.take()
    }

    /// Draws the first `instance_count` instances of the current batch in one
    /// instanced call, with `textures[i]` bound to texture unit `i`.
    ///
    /// The canvas size is taken from `target` on every call, so resizes
    /// between frames need no notification. Each call records its own render
    /// pass (loading, not clearing, the target), so several draws per frame
    /// composite in call order.
    ///
    /// Returns the issued draw, or `None` if nothing was drawn.
    ///
    /// # Panics
    /// On the preconditions listed in [`plan_draw`].
    pub fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        instance_count: usize,
        textures: &[Arc<StampTexture>],
    ) -> Option<DrawPlan> {
        let plan = plan_draw(self.batch.as_ref(), self.max_stamps(), instance_count, textures.len())?;

        // Mutating methods must happen before borrowing pipeline/buffers immutably.
        self.ensure_pipeline(ctx);
        self.units.bind(textures);

        let batch = self.batch.as_ref()?;

        #[cfg(debug_assertions)]
        if let Some(i) = batch.first_unbound_unit(instance_count, plan.texture_count) {
            panic!(
                "stamp draw: instance {i} uses texture unit {} but only {} textures are bound",
                batch.tex_units()[i],
                plan.texture_count
            );
        }

        self.buffers.upload(ctx.device, target.encoder, batch, instance_count);
        let uniform = StampUniform::new(target.size, plan.texture_count);
        stage_copy(ctx.device, target.encoder, &self.uniform, bytemuck::bytes_of(&uniform));

        let bind_group = self.units.ensure_bind_group(
            ctx.device,
            self.pipeline.bind_group_layout(),
            &self.uniform,
            self.buffers.tex_units(),
        );

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("stamp pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(self.pipeline.pipeline());
        rpass.set_bind_group(0, bind_group, &[]);
        self.quad.bind(&mut rpass);
        self.buffers.bind(&mut rpass);
        rpass.draw(plan.vertices.clone(), plan.instances.clone());

        log::trace!(
            "stamp draw: {} instances, {} textures, canvas {}x{}",
            instance_count,
            plan.texture_count,
            target.size.width,
            target.size.height
        );

        Some(plan)
    }

    /// Starts a frame-scoped producer that fills this renderer's batch from
    /// [`Stamp`](super::Stamp)s and draws as needed.
    pub fn begin_frame<'f, 't>(
        &'f mut self,
        ctx: &'f RenderCtx<'f>,
        target: &'f mut RenderTarget<'t>,
    ) -> StampFrame<'f, 't> {
        StampFrame::new(self, ctx, target)
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline.format() == ctx.surface_format {
            return;
        }
        self.pipeline = StampPipeline::new(ctx.device, ctx.surface_format);
        self.units.invalidate();
    }
}
