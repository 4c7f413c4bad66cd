use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use renderer::{AxisRates, Camera, FrameOptions, SceneKind, ScenePreset, ShaderSource};
use sceneconfig::{SceneConfig, SceneVariant};

use crate::cli::{Args, ClockMode, ReportFormat};
use crate::paths::AppPaths;

/// Frames drawn when neither `--frames` nor an animation duration bounds the run.
pub const DEFAULT_FRAME_LIMIT: u64 = 120;

/// Fully resolved settings for one render session.
#[derive(Debug, Clone)]
pub struct SessionPlan {
    pub config: SceneConfig,
    pub frame_limit: Option<u64>,
    pub clock: ClockMode,
    pub report: ReportFormat,
}

impl SessionPlan {
    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.surface.width, self.config.surface.height)
    }

    pub fn frame_options(&self) -> FrameOptions {
        let config = &self.config;
        FrameOptions {
            camera: Camera {
                fov_y_degrees: config.camera.fov_degrees,
                z_near: config.camera.z_near,
                z_far: config.camera.z_far,
                distance: config.camera.distance,
            },
            axis_rates: AxisRates::from_zyx(config.axis_rates()),
            clear_color: config.scene.clear_color,
            anchor_first_frame: config.scene.anchor_first_frame,
        }
    }

    pub fn scene_preset(&self) -> Result<ScenePreset> {
        let kind = match self.config.scene.variant {
            SceneVariant::Quad => SceneKind::Quad,
            SceneVariant::Cube => SceneKind::Cube,
        };
        let mut preset = ScenePreset::for_kind(kind);
        preset.axis_rates = AxisRates::from_zyx(self.config.axis_rates());
        if let Some((vertex, fragment)) = self.config.shader_files() {
            let shaders = ShaderSource::from_files(vertex, fragment)
                .context("failed to read configured shader sources")?;
            preset = preset.with_shaders(shaders);
        }
        Ok(preset)
    }
}

/// Loads the scene configuration named on the command line, or the one in the
/// config directory when present, or the built-in defaults.
pub fn load_config(args: &Args, paths: &AppPaths) -> Result<SceneConfig> {
    if let Some(path) = args.config.as_deref() {
        return read_config(path);
    }

    let discovered = paths.config_file();
    if discovered.is_file() {
        tracing::debug!(path = %discovered.display(), "using discovered scene config");
        read_config(&discovered)
    } else {
        tracing::debug!(path = %discovered.display(), "no scene config found; using defaults");
        Ok(SceneConfig::default())
    }
}

fn read_config(path: &Path) -> Result<SceneConfig> {
    let mut config = SceneConfig::from_path(path)
        .with_context(|| format!("failed to load scene config {}", path.display()))?;
    if let Some(base) = path.parent() {
        config.shaders.vertex = config.shaders.vertex.map(|p| resolve_relative(base, p));
        config.shaders.fragment = config.shaders.fragment.map(|p| resolve_relative(base, p));
    }
    Ok(config)
}

fn resolve_relative(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Applies command-line overrides on top of `config` and settles the frame
/// budget.
pub fn plan_session(args: &Args, mut config: SceneConfig) -> Result<SessionPlan> {
    if let Some(variant) = args.variant {
        config.scene.variant = variant;
    }
    if let Some(fps) = args.fps {
        config.animation.fps = fps;
    }
    if let Some(size) = args.size.as_deref() {
        let (width, height) = parse_surface_size(size)?;
        config.surface.width = width;
        config.surface.height = height;
    }
    if args.anchor_first_frame {
        config.scene.anchor_first_frame = true;
    }
    config
        .validate()
        .context("invalid scene settings after applying command-line overrides")?;

    let frame_limit = match (args.frames, args.clock, config.animation.duration) {
        (Some(frames), _, _) => Some(frames),
        (None, ClockMode::Simulated, Some(duration)) => {
            Some((duration.as_secs_f64() * f64::from(config.animation.fps)).ceil() as u64)
        }
        // The wall-clock driver stops on its own once the duration elapses.
        (None, ClockMode::Realtime, Some(_)) => None,
        (None, _, None) => Some(DEFAULT_FRAME_LIMIT),
    };

    Ok(SessionPlan {
        config,
        frame_limit,
        clock: args.clock,
        report: args.report,
    })
}

pub fn parse_surface_size(spec: &str) -> Result<(u32, u32)> {
    let trimmed = spec.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| anyhow::anyhow!("expected WxH format, e.g. 800x600"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid width in size specification"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid height in size specification"))?;

    if width == 0 || height == 0 {
        anyhow::bail!("surface dimensions must be greater than zero");
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["tumble"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(parse_surface_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_surface_size(" 640 X 480 ").unwrap(), (640, 480));
        assert_eq!(parse_surface_size("800×600").unwrap(), (800, 600));
        assert!(parse_surface_size("0x600").is_err());
        assert!(parse_surface_size("800").is_err());
        assert!(parse_surface_size("widexhigh").is_err());
    }

    #[test]
    fn cli_overrides_config() {
        let config = SceneConfig::from_toml_str(
            r#"
            [scene]
            variant = "cube"

            [animation]
            fps = 30
            "#,
        )
        .unwrap();
        let plan = plan_session(
            &args(&["--variant", "quad", "--fps", "24", "--size", "320x200"]),
            config,
        )
        .unwrap();
        assert_eq!(plan.config.scene.variant, SceneVariant::Quad);
        assert_eq!(plan.config.animation.fps, 24.0);
        assert_eq!(plan.surface_size(), (320, 200));
        assert_eq!(plan.frame_options().axis_rates, AxisRates::SPIN);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let err = plan_session(&args(&["--fps", "0"]), SceneConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("fps"), "{err:#}");
    }

    #[test]
    fn vanishing_frame_rate_is_rejected() {
        let err = plan_session(&args(&["--fps", "1e-30"]), SceneConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("animation.fps"), "{err:#}");
    }

    #[test]
    fn enormous_duration_saturates_frame_budget() {
        let mut config = SceneConfig::default();
        config.animation.duration = Some(Duration::MAX);
        let plan = plan_session(&args(&[]), config).unwrap();
        assert_eq!(plan.frame_limit, Some(u64::MAX));
        assert_eq!(plan.frame_options().clear_color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn frame_budget_follows_duration_for_simulated_clock() {
        let mut config = SceneConfig::default();
        config.animation.fps = 50.0;
        config.animation.duration = Some(Duration::from_millis(500));
        let plan = plan_session(&args(&[]), config.clone()).unwrap();
        assert_eq!(plan.frame_limit, Some(25));

        let plan = plan_session(&args(&["--clock", "realtime"]), config.clone()).unwrap();
        assert_eq!(plan.frame_limit, None);

        let plan = plan_session(&args(&["--frames", "3"]), config).unwrap();
        assert_eq!(plan.frame_limit, Some(3));

        let plan = plan_session(&args(&[]), SceneConfig::default()).unwrap();
        assert_eq!(plan.frame_limit, Some(DEFAULT_FRAME_LIMIT));
    }

    #[test]
    fn discovered_config_is_loaded_and_shader_paths_resolved() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("tumble.toml"),
            r#"
            [scene]
            variant = "quad"

            [shaders]
            vertex = "quad.vert"
            fragment = "/abs/quad.frag"
            "#,
        )
        .unwrap();
        let paths = AppPaths::from_raw(dir.path().to_path_buf());
        let config = load_config(&args(&[]), &paths).unwrap();
        assert_eq!(config.scene.variant, SceneVariant::Quad);
        assert_eq!(
            config.shaders.vertex.as_deref(),
            Some(dir.path().join("quad.vert").as_path())
        );
        assert_eq!(
            config.shaders.fragment.as_deref(),
            Some(Path::new("/abs/quad.frag"))
        );
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::from_raw(dir.path().join("absent"));
        let config = load_config(&args(&[]), &paths).unwrap();
        assert_eq!(config.scene.variant, SceneVariant::Cube);
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let paths = AppPaths::from_raw(dir.path().to_path_buf());
        let err = load_config(&args(&["--config", missing.to_str().unwrap()]), &paths).unwrap_err();
        assert!(format!("{err:#}").contains("nope.toml"));
    }

    #[test]
    fn configured_shaders_are_read_from_disk() {
        let dir = TempDir::new().unwrap();
        let vertex = dir.path().join("v.glsl");
        let fragment = dir.path().join("f.glsl");
        fs::write(&vertex, ShaderSource::quad().vertex()).unwrap();
        fs::write(&fragment, ShaderSource::quad().fragment()).unwrap();

        let mut config = SceneConfig::default();
        config.shaders.vertex = Some(vertex);
        config.shaders.fragment = Some(fragment);
        let plan = plan_session(&args(&[]), config).unwrap();
        let preset = plan.scene_preset().unwrap();
        assert_eq!(preset.shaders, ShaderSource::quad());
        assert_eq!(preset.kind, SceneKind::Cube);
    }
}
