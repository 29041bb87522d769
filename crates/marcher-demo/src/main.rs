//! Simple GPU ray tracer.
//!
//! Loads an environment cube map and four channel textures, then each frame
//! launches one full-screen trace shader, applies depth of field and exposes
//! the result to the window. Tab cycles the trace scenes.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use marcher_engine::cgmath::Deg;
use marcher_engine::coords::ColorRgba;
use marcher_engine::core::{App, AppControl, FrameCtx, InitCtx};
use marcher_engine::input::Key;
use marcher_engine::logging::{init_logging, LoggingConfig};
use marcher_engine::render::{
    DepthOfFieldPass, FilmPass, TraceArgs, TraceBindings, TracePass, TraceScene,
};
use marcher_engine::settings::{AppSettings, GuardBand};
use marcher_engine::texture::{CubeMap, Texture, TextureEncoding};
use marcher_engine::window::Runtime;

const ENVIRONMENT_PATTERN: &str = "cubemap/islands/islands_*.jpg";
const CHANNEL_COUNT: usize = 4;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Scene {
    Minimal,
    Analytic,
    Raymarch,
    Venice,
}

impl From<Scene> for TraceScene {
    fn from(scene: Scene) -> Self {
        match scene {
            Scene::Minimal => TraceScene::Minimal,
            Scene::Analytic => TraceScene::Analytic,
            Scene::Raymarch => TraceScene::RayMarch,
            Scene::Venice => TraceScene::Venice,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "marcher-demo", version, about = "Full-screen GPU ray marching")]
struct Cli {
    /// Trace shader to run.
    #[arg(long, value_enum, default_value_t = Scene::Raymarch)]
    scene: Scene,

    #[arg(long, default_value_t = 780)]
    width: u32,

    #[arg(long, default_value_t = 500)]
    height: u32,

    #[arg(long, default_value = "Simple GPU Ray Tracer")]
    caption: String,

    /// Where F4 writes screenshots.
    #[arg(long, default_value = "../journal/")]
    screenshot_dir: PathBuf,

    /// Extra data directory, searched before the defaults. Repeatable.
    #[arg(long = "data-dir")]
    data_dirs: Vec<PathBuf>,

    /// Vertical field of view in degrees.
    #[arg(long, default_value_t = 40.0)]
    fov: f32,

    /// Guard band thickness in pixels on each side of the framebuffer.
    #[arg(long, default_value_t = 0)]
    guard_band: u16,

    /// Disable depth of field.
    #[arg(long)]
    no_dof: bool,

    /// Log filter, overrides RUST_LOG.
    #[arg(long)]
    log: Option<String>,
}

impl Cli {
    fn settings(&self) -> AppSettings {
        let mut settings = AppSettings::default();
        settings.window.caption = self.caption.clone();
        settings.window.width = self.width;
        settings.window.height = self.height;
        settings.screenshot_directory = self.screenshot_dir.clone();
        settings.frame_duration = Duration::from_secs_f64(1.0 / 60.0);

        let band = GuardBand::uniform(self.guard_band);
        settings.hdr_framebuffer.depth_guard_band_thickness = band;
        settings.hdr_framebuffer.color_guard_band_thickness = band;

        let mut dirs = self.data_dirs.clone();
        dirs.append(&mut settings.data_directories);
        settings.data_directories = dirs;
        settings
    }
}

/// GPU passes, created once the device exists.
struct Passes {
    trace: TracePass,
    depth_of_field: DepthOfFieldPass,
    film: FilmPass,
}

struct DemoApp {
    scene: TraceScene,
    field_of_view: Deg<f32>,
    depth_of_field: bool,

    environment_map: Option<CubeMap>,
    channel_textures: Vec<Texture>,
    passes: Option<Passes>,
}

impl DemoApp {
    fn new(cli: &Cli) -> Self {
        Self {
            scene: cli.scene.into(),
            field_of_view: Deg(cli.fov),
            depth_of_field: !cli.no_dof,
            environment_map: None,
            channel_textures: Vec::with_capacity(CHANNEL_COUNT),
            passes: None,
        }
    }
}

impl App for DemoApp {
    fn on_init(&mut self, ctx: &mut InitCtx<'_>) -> Result<()> {
        let environment = ctx
            .load_cube_map(ENVIRONMENT_PATTERN, TextureEncoding::Srgb)
            .context("loading environment map")?;

        let mut channels = Vec::with_capacity(CHANNEL_COUNT);
        for i in 0..CHANNEL_COUNT {
            let name = format!("image/iChannel{i}.jpg");
            let texture = ctx
                .load_texture(&name, TextureEncoding::Srgb)
                .with_context(|| format!("loading channel texture {i}"))?;
            log::debug!(
                "iChannel{i}: {}x{} {:?}",
                texture.width(),
                texture.height(),
                texture.encoding()
            );
            channels.push(texture);
        }

        log::info!(
            "scene `{}`, environment {:?} faces, {} mips, mip constant {:.3}",
            self.scene,
            environment.convention(),
            environment.mip_levels(),
            environment.mip_constant()
        );
        let environment = self.environment_map.insert(environment);
        self.channel_textures = channels;

        let [c0, c1, c2, c3] = self.channel_textures.as_slice() else {
            anyhow::bail!("expected {CHANNEL_COUNT} channel textures");
        };
        let mut trace = TracePass::new(ctx.device, self.scene);
        trace.bind_textures(
            ctx.device,
            &TraceBindings {
                environment,
                channels: [c0, c1, c2, c3],
            },
        );

        ctx.camera.set_field_of_view_angle(self.field_of_view);
        ctx.camera.depth_of_field.enabled = self.depth_of_field;

        self.passes = Some(Passes {
            trace,
            depth_of_field: DepthOfFieldPass::new(ctx.device),
            film: FilmPass::new(),
        });
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.key_pressed(Key::Escape) {
            return AppControl::Exit;
        }

        let Some(passes) = self.passes.as_mut() else {
            return AppControl::Continue;
        };
        if ctx.input_frame.key_pressed(Key::Tab) {
            let scene = passes.trace.scene().next();
            passes.trace.set_scene(scene);
            log::info!("scene `{scene}`");
        }
        let environment = self.environment_map.as_ref();
        let camera = ctx.camera.clone();
        let time = ctx.time;

        ctx.render(|rctx, target| {
            target.clear(ColorRgba::black());

            let fb = target.framebuffer;
            let args = TraceArgs::from_camera(&camera, fb.viewport(), fb.extent(), environment, &time);
            passes.trace.launch(rctx, target.encoder, fb, &args);
            passes.depth_of_field.apply(rctx, target.encoder, fb, &camera);
            passes.film.expose_and_render(
                rctx,
                target.encoder,
                fb.filtered_view(),
                target.surface_view,
                &camera.film,
                fb.viewport(),
            );
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = match &cli.log {
        Some(filter) => LoggingConfig::with_filter(filter.clone()),
        None => LoggingConfig::default(),
    };
    init_logging(logging);

    let settings = cli.settings();
    log::info!(
        "data directories: {:?}",
        settings
            .data_directories
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
    );

    Runtime::run(settings, DemoApp::new(&cli))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("marcher-demo").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn defaults_describe_the_demo_window() {
        let cli = parse(&[]);
        assert_eq!(cli.scene, Scene::Raymarch);
        assert_eq!(cli.fov, 40.0);

        let settings = cli.settings();
        assert_eq!(settings.window.caption, "Simple GPU Ray Tracer");
        assert_eq!((settings.window.width, settings.window.height), (780, 500));
        assert_eq!(settings.screenshot_directory, PathBuf::from("../journal/"));
        assert!(settings.hdr_framebuffer.allocation_guard_band().is_zero());
        assert_eq!(settings.frame_duration, Duration::from_secs_f64(1.0 / 60.0));
    }

    #[test]
    fn scene_flag_selects_trace_shader() {
        let cli = parse(&["--scene", "venice"]);
        assert_eq!(TraceScene::from(cli.scene), TraceScene::Venice);
        assert_eq!(TraceScene::from(Scene::Raymarch), TraceScene::RayMarch);
        assert!(Cli::try_parse_from(["marcher-demo", "--scene", "cornell"]).is_err());
    }

    #[test]
    fn data_dirs_are_searched_first() {
        let cli = parse(&["--data-dir", "/assets", "--data-dir", "more"]);
        let dirs = cli.settings().data_directories;
        assert_eq!(dirs[0], PathBuf::from("/assets"));
        assert_eq!(dirs[1], PathBuf::from("more"));
        assert!(dirs.contains(&PathBuf::from("data-files")));
    }

    #[test]
    fn guard_band_and_window_overrides() {
        let cli = parse(&["--width", "1024", "--height", "640", "--guard-band", "16", "--no-dof"]);
        let settings = cli.settings();
        assert_eq!(settings.window.width, 1024);
        assert_eq!(settings.hdr_framebuffer.allocation_guard_band(), GuardBand::uniform(16));
        assert!(!DemoApp::new(&cli).depth_of_field);
    }
}
