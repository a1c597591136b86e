mod atlas;
mod sprites;

use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use stamp_engine::coords::Viewport;
use stamp_engine::core::{App, AppControl, FrameCtx};
use stamp_engine::device::{Gpu, GpuInit};
use stamp_engine::logging::{LoggingConfig, init_logging};
use stamp_engine::paint::Tint;
use stamp_engine::render::stamp::{
    ColorKey, FrameStats, Padding, SamplerOptions, Stamp, StampConfig, StampRenderer, StampTexture,
    TextureAtlas,
};
use stamp_engine::window::{Runtime, RuntimeConfig, RuntimeCtx};

use sprites::Sprite;

const SPRITE_COUNT: usize = 2000;
const SOLID_SIZE: f32 = 12.0;
const STATS_EVERY: u64 = 240;

/// Plain colors drawn as squares next to the atlas tiles. With the atlas
/// that makes nine textures, more than one draw can bind.
const SOLIDS: [Tint; 8] = [
    Tint::RED,
    Tint::GREEN,
    Tint::BLUE,
    Tint::WHITE,
    Tint::MAGIC_PINK,
    Tint(0xFFFF_A500),
    Tint(0xFF00_CED1),
    Tint(0xFF9A_CD32),
];

struct Demo {
    config: StampConfig,
    /// `.atlas` file whose regions join the sprite templates.
    atlas_path: Option<PathBuf>,
    renderer: Option<StampRenderer>,
    sprites: Vec<Sprite>,
    rng: StdRng,
}

impl Demo {
    fn new(atlas_path: Option<PathBuf>) -> Self {
        Self {
            config: StampConfig {
                max_stamps: 1024,
                ..StampConfig::default()
            },
            atlas_path,
            renderer: None,
            sprites: Vec::new(),
            rng: StdRng::seed_from_u64(0x57A3_9D),
        }
    }

    fn templates(&self, gpu: &Gpu<'_>) -> Result<Vec<Stamp>> {
        let ctx = gpu.render_ctx();

        let mut sheet = atlas::sheet();
        sheet.replace_color(ColorKey::MAGIC_PINK);
        let atlas = StampTexture::from_pixels(ctx.device, ctx.queue, &sheet, SamplerOptions::linear())?;
        let mut templates = Stamp::split_into_tiles(&atlas, atlas::GRID, atlas::GRID, Padding::ZERO);

        for tint in SOLIDS {
            let texture = StampTexture::solid(ctx.device, ctx.queue, tint)?;
            let mut stamp = Stamp::new(texture);
            stamp.params.resize(SOLID_SIZE, SOLID_SIZE);
            stamp.params.orig_size = stamp.params.size;
            templates.push(stamp);
        }

        if let Some(path) = &self.atlas_path {
            let loaded = TextureAtlas::load(ctx.device, ctx.queue, path, true)
                .with_context(|| format!("loading atlas {}", path.display()))?;
            for name in loaded.names() {
                if let Some(entry) = loaded.get(name) {
                    templates.extend(entry.items().into_iter().cloned());
                }
            }
        }

        Ok(templates)
    }
}

impl App for Demo {
    fn on_start(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        let info = gpu.adapter_info();
        log::info!("running on {} ({:?})", info.name, info.backend);

        let templates = self.templates(gpu)?;
        let size = gpu.size();
        let canvas = Viewport::from_physical(size.width, size.height);

        self.sprites = (0..SPRITE_COUNT)
            .map(|i| Sprite::spawn(&templates[i % templates.len()], canvas, &mut self.rng))
            .collect();
        self.renderer = Some(StampRenderer::new(&gpu.render_ctx(), self.config)?);

        log::info!(
            "{} sprites from {} textures; space or P pauses, escape quits",
            self.sprites.len(),
            templates.len()
        );
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent, runtime: &mut RuntimeCtx) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed || event.repeat {
            return AppControl::Continue;
        }

        match &event.logical_key {
            Key::Named(NamedKey::Escape) => return AppControl::Exit,
            Key::Named(NamedKey::Space) => runtime.toggle_pause(),
            Key::Character(c) if c.eq_ignore_ascii_case("p") => runtime.toggle_pause(),
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(renderer) = self.renderer.as_mut() else {
            return AppControl::Continue;
        };

        let canvas = ctx.canvas_size();
        let dt = ctx.time.dt;
        for sprite in &mut self.sprites {
            sprite.update(dt, canvas);
        }

        let sprites = &self.sprites;
        let mut stats = FrameStats::default();
        let control = ctx.render(self.config.clear_color, |rctx, target| {
            let mut frame = renderer.begin_frame(rctx, target);
            for sprite in sprites {
                frame.stamp(&sprite.stamp);
            }
            stats = frame.finish();
        });

        if ctx.time.frame_index % STATS_EVERY == 0 {
            log::info!(
                "frame {}: {} stamps in {} draws ({:.1} ms)",
                ctx.time.frame_index,
                stats.stamps,
                stats.draws,
                ctx.time.dt * 1000.0
            );
        }

        control
    }
}

/// `stamp-demo [sprites.atlas]`
fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    let atlas_path = std::env::args_os().nth(1).map(PathBuf::from);

    let config = RuntimeConfig {
        title: "stamp demo".to_string(),
        ..RuntimeConfig::default()
    };
    Runtime::run(config, GpuInit::default(), Demo::new(atlas_path))
}
