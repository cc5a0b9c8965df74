use agb_common::frame::{Color, FrameSize};
use agb_config::{AffineInference, ObjAffineSource, ObjTileMapping, RenderConfig};
use agb_core::compositor::DispatchParams;
use agb_core::demo::DemoFrame;
use agb_core::scene::SceneDescriptor;
use agb_core::{FrameRenderer, Hardware};
use anyhow::{Context, anyhow};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum SceneSource {
    /// Built-in scene exercising every layer type, windows, blending, and mosaic
    #[default]
    Demo,
    /// Power-on hardware state; renders the backdrop only
    Empty,
}

#[derive(Parser)]
struct Args {
    /// Scene to render
    #[arg(long, value_enum, default_value_t)]
    scene: SceneSource,

    /// Output image path; format is chosen from the file extension (png / ppm)
    #[arg(short = 'o', long, default_value = "frame.png")]
    output: PathBuf,

    /// Render config TOML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of compositor worker threads
    #[arg(long)]
    threads: Option<usize>,

    /// Compose scanlines on the calling thread only
    #[arg(long, default_value_t)]
    sequential: bool,

    /// Override BG affine inference
    #[arg(long)]
    affine_inference: Option<AffineInference>,

    /// Override where OBJ affine matrices are read from
    #[arg(long)]
    obj_affine_source: Option<ObjAffineSource>,

    /// Override OBJ tile mapping instead of reading it from DISPCNT
    #[arg(long)]
    obj_tile_mapping: Option<ObjTileMapping>,

    /// Write the extracted scene descriptor as JSON to this path
    #[arg(long)]
    dump_scene: Option<PathBuf>,
}

impl Args {
    fn render_config(&self) -> anyhow::Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::from_file(path)?,
            None => RenderConfig::default(),
        };

        if let Some(threads) = self.threads {
            config.worker_threads = Some(threads);
        }
        if self.sequential {
            config.parallel = false;
        }
        if let Some(affine_inference) = self.affine_inference {
            config.affine_inference = affine_inference;
        }
        if let Some(obj_affine_source) = self.obj_affine_source {
            config.obj_affine_source = obj_affine_source;
        }
        if self.obj_tile_mapping.is_some() {
            config.obj_tile_mapping = self.obj_tile_mapping;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.render_config()?;
    log::info!("Render config: {config:?}");

    let mut renderer = FrameRenderer::new(config)?;

    let start = Instant::now();
    let (pixels, frame_size) = match args.scene {
        SceneSource::Demo => {
            let demo = DemoFrame::new();
            dump_scene(args.dump_scene.as_deref(), &demo.scene)?;

            let params = DispatchParams {
                obj_tile_mapping: demo_tile_mapping(&config),
                ..demo.params
            };
            let pixels = renderer.render_scene_to_vec(&demo.scene, demo.frame_memory(), &params)?;
            (pixels, params.frame_size)
        }
        SceneSource::Empty => {
            let hardware = Hardware::new();
            dump_scene(args.dump_scene.as_deref(), &renderer.extract(&hardware))?;

            let frame_size = config.frame_size;
            let mut pixels = vec![0; frame_size.pixel_count()];
            renderer.render_hardware(&hardware, &mut pixels)?;
            (pixels, frame_size)
        }
    };
    log::info!(
        "Rendered {}x{} frame in {:?}",
        frame_size.width,
        frame_size.height,
        start.elapsed()
    );

    let image = to_rgb_image(&pixels, frame_size)?;
    image
        .save(&args.output)
        .with_context(|| format!("Failed to write image to '{}'", args.output.display()))?;
    log::info!("Wrote frame to '{}'", args.output.display());

    Ok(())
}

fn demo_tile_mapping(config: &RenderConfig) -> ObjTileMapping {
    config.obj_tile_mapping.unwrap_or(ObjTileMapping::TwoDimensional)
}

fn dump_scene(path: Option<&Path>, scene: &SceneDescriptor) -> anyhow::Result<()> {
    let Some(path) = path else { return Ok(()) };

    let json = serde_json::to_string_pretty(scene)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write scene to '{}'", path.display()))?;
    log::info!("Wrote scene descriptor to '{}'", path.display());

    Ok(())
}

fn to_rgb_image(pixels: &[u32], frame_size: FrameSize) -> anyhow::Result<RgbImage> {
    let rgb: Vec<u8> = pixels
        .iter()
        .flat_map(|&packed| {
            let Color { r, g, b, .. } = Color::from_packed_rgba(packed);
            [r, g, b]
        })
        .collect();

    RgbImage::from_raw(frame_size.width, frame_size.height, rgb)
        .ok_or_else(|| anyhow!("Pixel buffer does not match frame size {frame_size:?}"))
}
