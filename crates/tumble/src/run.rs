use std::io::{self, Write};

use anyhow::{Context, Result};
use renderer::{FrameLoop, HeadlessContext, LoopSummary};
use scheduler::{AnimationDriver, IntervalDriver, ManualDriver};
use tracing_subscriber::EnvFilter;

use crate::bootstrap::{load_config, plan_session, SessionPlan, DEFAULT_FRAME_LIMIT};
use crate::cli::{Args, ClockMode};
use crate::paths::AppPaths;
use crate::report::Reporter;

pub fn run(args: Args) -> Result<()> {
    initialise_tracing();

    let paths = AppPaths::discover()?;
    tracing::debug!(config = %paths.config_dir().display(), "resolved tumble paths");

    let config = load_config(&args, &paths)?;
    let plan = plan_session(&args, config)?;
    tracing::info!(
        variant = %plan.config.scene.variant,
        size = ?plan.surface_size(),
        fps = plan.config.animation.fps,
        frames = ?plan.frame_limit,
        clock = ?plan.clock,
        "starting render session"
    );

    let stdout = io::stdout();
    let reporter = Reporter::new(stdout.lock(), plan.report);
    run_session(&plan, reporter)?;
    Ok(())
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Builds the scene on a headless context and drives it with the clock the
/// plan asks for.
pub fn run_session<W: Write>(plan: &SessionPlan, reporter: Reporter<W>) -> Result<W> {
    let fps = plan.config.animation.fps;
    match plan.clock {
        ClockMode::Simulated => {
            let frames = plan.frame_limit.unwrap_or(DEFAULT_FRAME_LIMIT);
            let driver = ManualDriver::simulated(fps, frames).context("invalid frame rate")?;
            drive(plan, driver, reporter)
        }
        ClockMode::Realtime => {
            let driver = IntervalDriver::from_settings(&plan.config.animation)
                .context("invalid frame rate")?;
            drive(plan, driver, reporter)
        }
    }
}

fn drive<D, W>(plan: &SessionPlan, driver: D, mut reporter: Reporter<W>) -> Result<W>
where
    D: AnimationDriver,
    W: Write,
{
    let (width, height) = plan.surface_size();
    let renderer = plan
        .scene_preset()?
        .into_renderer(HeadlessContext::new(width, height), plan.frame_options())
        .context("failed to set up the scene")?;

    let mut frame_loop = FrameLoop::new(renderer, driver);
    let summary: LoopSummary = frame_loop
        .run_with(plan.frame_limit, |report| reporter.frame(report))
        .context("frame rendering failed")?;
    frame_loop.stop();

    let (renderer, _) = frame_loop.into_parts();
    let gl = renderer.into_context();
    for error in gl.errors() {
        tracing::warn!(%error, "graphics context reported an error");
    }

    reporter
        .finish(plan.config.scene.variant.as_str(), &summary)
        .context("failed to write frame report")
}
