//! `lumen` - render the demo scene to an image file.

mod scene;

use anyhow::{Context, Result};
use clap::Parser;
use lumen_renderer::{
    Camera, CameraSettings, FrameBuffer, ImageEncoder, PngEncoder, PpmEncoder, RenderConfig,
    Vec3, CHANNELS,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Command line options. Flags override values from `--config`.
#[derive(Parser, Debug)]
#[command(name = "lumen", version, about = "Multithreaded CPU path tracer")]
struct Args {
    /// JSON file with optional `camera` and `render` sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output image; `.ppm` is written as plain PPM, other extensions go
    /// through the image crate
    #[arg(short, long, default_value = "output.png")]
    output: PathBuf,

    /// Image width in pixels
    #[arg(short = 'W', long)]
    width: Option<u32>,

    /// Aspect ratio (width / height)
    #[arg(long)]
    aspect: Option<f64>,

    /// Samples per pixel
    #[arg(short, long)]
    samples: Option<u32>,

    /// Maximum bounces per path
    #[arg(short, long)]
    depth: Option<u32>,

    /// Vertical field of view in degrees
    #[arg(long)]
    vfov: Option<f32>,

    /// Camera position as x,y,z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    look_from: Option<Vec3>,

    /// Camera target as x,y,z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    look_at: Option<Vec3>,

    /// Up vector as x,y,z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    vup: Option<Vec3>,

    /// Worker threads (defaults to hardware parallelism)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Seed for the sampling streams
    #[arg(long)]
    seed: Option<u64>,

    /// Seed for the random sphere layout
    #[arg(long, default_value_t = 0)]
    scene_seed: u64,

    /// Write the gradient test pattern instead of rendering
    #[arg(long)]
    gradient: bool,
}

/// Layout of the `--config` file.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct FileConfig {
    camera: CameraSettings,
    render: RenderConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            // Framing for the demo scene
            camera: CameraSettings::default()
                .with_position(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y)
                .with_vfov(20.0),
            render: RenderConfig::default(),
        }
    }
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Apply command line overrides.
    fn apply(&mut self, args: &Args) {
        let camera = &mut self.camera;
        if let Some(width) = args.width {
            camera.image_width = width;
        }
        if let Some(aspect) = args.aspect {
            camera.aspect_ratio = aspect;
        }
        if let Some(vfov) = args.vfov {
            camera.vfov = vfov;
        }
        if let Some(look_from) = args.look_from {
            camera.look_from = look_from;
        }
        if let Some(look_at) = args.look_at {
            camera.look_at = look_at;
        }
        if let Some(vup) = args.vup {
            camera.vup = vup;
        }

        let render = &mut self.render;
        if let Some(samples) = args.samples {
            render.samples_per_pixel = samples;
        }
        if let Some(depth) = args.depth {
            render.max_depth = depth;
        }
        if let Some(seed) = args.seed {
            render.seed = seed;
        }
        if args.threads.is_some() {
            render.threads = args.threads;
        }
    }
}

/// Parse "x,y,z" into a vector.
fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid component in '{}': {}", s, e))?;

    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z, got '{}'", s)),
    }
}

/// Pick an encoder from the output extension.
fn encoder_for(path: &Path) -> Box<dyn ImageEncoder> {
    let is_ppm = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ppm"));

    if is_ppm {
        Box::new(PpmEncoder::new(path))
    } else {
        Box::new(PngEncoder::new(path))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    config.apply(&args);

    let encoder = encoder_for(&args.output);

    if args.gradient {
        let frame = FrameBuffer::gradient(config.camera.image_width, config.camera.image_height());
        encoder
            .encode(frame.width(), frame.height(), CHANNELS as u8, frame.pixels())
            .context("Failed to write gradient")?;
        return Ok(());
    }

    let start = std::time::Instant::now();
    let world = scene::build_scene(args.scene_seed);
    log::info!("Scene built in {:?}", start.elapsed());

    let mut camera =
        Camera::new(config.camera, config.render).context("Invalid camera configuration")?;
    camera
        .render(&world, encoder.as_ref())
        .with_context(|| format!("Failed to render {}", args.output.display()))?;

    Ok(())
}
