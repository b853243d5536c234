//! Offline Monte-Carlo path tracer over static triangle-mesh scenes.
//!
//! Scene geometry and a companion parameter document are ordinarily read
//! by an external mesh-and-XML loader, which is out of scope for this
//! crate. In its place, `scenes` provides a small set of programmatic
//! scene builders that exercise the same `world`/`lights` BVH handoff a
//! real loader would produce.

mod aabb;
mod bvh;
mod camera;
mod error;
mod hittable;
mod image_io;
mod integrator;
mod interval;
mod material;
mod math;
mod mesh;
mod microfacet;
mod primitive_list;
mod sampling;
mod scenes;
mod texture;
mod triangle;

use clap::{Parser, ValueEnum};
use integrator::RenderConfig;
use log::{error, info};
use std::process::ExitCode;
use std::time::SystemTime;

/// Render a static triangle-mesh scene with a Monte-Carlo path tracer.
#[derive(Parser, Debug)]
#[command(
    name = "pathtracer",
    version,
    about = "Offline Monte Carlo path tracer for static triangle-mesh scenes",
    after_help = "EXAMPLES:\n  \
                  pathtracer --scene cornell --spp 256 --depth 8\n  \
                  pathtracer --scene mirror-echo --spp 64 --out echo.png\n  \
                  pathtracer --scene shadow --width 400 --height 300"
)]
struct Cli {
    /// Built-in scene to render
    #[arg(short, long, value_enum, default_value_t = ScenePreset::Cornell)]
    scene: ScenePreset,

    /// Output image width in pixels
    #[arg(short = 'W', long, default_value_t = 400)]
    width: u32,

    /// Output image height in pixels
    #[arg(short = 'H', long, default_value_t = 400)]
    height: u32,

    /// Samples per pixel
    #[arg(long, default_value_t = 1)]
    spp: u32,

    /// Maximum path depth (remaining-bounce counter passed to the estimator)
    #[arg(long, default_value_t = 10)]
    depth: i32,

    /// Number of OS render threads (scanlines are partitioned across these)
    #[arg(short, long, default_value_t = 16)]
    threads: usize,

    /// Russian-roulette survival probability, in (0, 1]
    #[arg(long, default_value_t = 0.8)]
    russian_roulette: f64,

    /// Disable next-event estimation (direct light sampling)
    #[arg(long)]
    no_light_sampling: bool,

    /// RNG seed for the per-thread seed schedule
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Output file path. Defaults to `{scene}_{timestamp}_spp{N}-depth{D}.png`
    /// in the current directory.
    #[arg(short, long)]
    out: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScenePreset {
    /// Classic Cornell box with a ceiling light and two diffuse blocks
    Cornell,
    /// Mirror floor reflecting an overhead emissive ceiling
    MirrorEcho,
    /// Emissive quad fully occluded from the shade point by a triangle
    Shadow,
    /// One primitive per material variant, for visual inspection
    Gallery,
}

impl ScenePreset {
    fn name(self) -> &'static str {
        match self {
            ScenePreset::Cornell => "cornell",
            ScenePreset::MirrorEcho => "mirror_echo",
            ScenePreset::Shadow => "shadow",
            ScenePreset::Gallery => "gallery",
        }
    }

    fn build(self, width: u32, height: u32) -> scenes::SceneSetup {
        match self {
            ScenePreset::Cornell => scenes::cornell_box(width, height),
            ScenePreset::MirrorEcho => scenes::mirror_echo(width, height),
            ScenePreset::Shadow => scenes::shadow_occlusion(width, height),
            ScenePreset::Gallery => scenes::material_gallery(width, height),
        }
    }
}

fn run(cli: Cli) -> Result<String, error::RenderError> {
    let setup = cli.scene.build(cli.width, cli.height);
    let config = RenderConfig {
        samples_per_pixel: cli.spp,
        max_depth: cli.depth,
        threads: cli.threads,
        russian_roulette: cli.russian_roulette,
        b_sample_lights: !cli.no_light_sampling,
        ..setup.config
    };

    info!(
        "rendering '{}' at {}x{}, spp={}, depth={}, threads={}",
        cli.scene.name(),
        cli.width,
        cli.height,
        config.samples_per_pixel,
        config.max_depth,
        config.threads
    );

    let framebuffer = integrator::render(
        &setup.camera,
        &setup.world,
        &setup.lights,
        &config,
        cli.width,
        cli.height,
        cli.seed,
    );

    let timestamp = image_io::format_timestamp(SystemTime::now());
    let path = cli.out.clone().unwrap_or_else(|| {
        image_io::output_filename(
            cli.scene.name(),
            &timestamp,
            config.samples_per_pixel,
            config.max_depth.max(0) as u32,
        )
    });

    framebuffer.write_png(&path)?;
    Ok(path)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(path) => {
            info!("wrote {path}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("render failed: {err}");
            ExitCode::FAILURE
        }
    }
}
