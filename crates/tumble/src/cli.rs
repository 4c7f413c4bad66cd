use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use sceneconfig::SceneVariant;

#[derive(Parser, Debug)]
#[command(
    name = "tumble",
    author,
    version,
    about = "Render the spinning quad or tumbling cube on a headless context"
)]
pub struct Args {
    /// Scene configuration file; defaults to `tumble.toml` in the config directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Scene to draw: `quad` or `cube`.
    #[arg(long, value_name = "VARIANT", value_parser = parse_variant)]
    pub variant: Option<SceneVariant>,

    /// Stop after this many frames.
    #[arg(long, value_name = "N")]
    pub frames: Option<u64>,

    /// Override the drawable size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Frame rate of the animation clock.
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Animation clock: `simulated` fires frames back to back, `realtime`
    /// paces them against the wall clock.
    #[arg(
        long,
        value_name = "CLOCK",
        value_parser = parse_clock,
        default_value = "simulated"
    )]
    pub clock: ClockMode,

    /// Per-frame output: `text` or `json` (one object per line).
    #[arg(
        long,
        value_name = "FORMAT",
        value_parser = parse_report_format,
        default_value = "text"
    )]
    pub report: ReportFormat,

    /// Seed the clock with the first frame's timestamp so it starts at rest.
    #[arg(long)]
    pub anchor_first_frame: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    Simulated,
    Realtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

pub fn parse() -> Args {
    Args::parse()
}

pub fn parse_variant(value: &str) -> Result<SceneVariant, String> {
    SceneVariant::from_str(value)
}

pub fn parse_clock(value: &str) -> Result<ClockMode, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("clock must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "simulated" | "sim" | "manual" => Ok(ClockMode::Simulated),
        "realtime" | "real" | "wall" => Ok(ClockMode::Realtime),
        other => Err(format!(
            "unknown clock '{other}'; expected simulated or realtime"
        )),
    }
}

pub fn parse_report_format(value: &str) -> Result<ReportFormat, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("report format must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "text" | "plain" => Ok(ReportFormat::Text),
        "json" | "jsonl" => Ok(ReportFormat::Json),
        other => Err(format!("unknown report format '{other}'; expected text or json")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_accepts_aliases_case_insensitively() {
        assert_eq!(parse_clock(" Realtime ").unwrap(), ClockMode::Realtime);
        assert_eq!(parse_clock("SIM").unwrap(), ClockMode::Simulated);
        assert!(parse_clock("").is_err());
        assert!(parse_clock("vsync").is_err());
    }

    #[test]
    fn report_format_parses() {
        assert_eq!(parse_report_format("json").unwrap(), ReportFormat::Json);
        assert_eq!(parse_report_format("Text").unwrap(), ReportFormat::Text);
        assert!(parse_report_format("yaml").is_err());
    }

    #[test]
    fn args_parse_with_defaults() {
        let args = Args::try_parse_from(["tumble"]).unwrap();
        assert!(args.config.is_none());
        assert!(args.variant.is_none());
        assert_eq!(args.clock, ClockMode::Simulated);
        assert_eq!(args.report, ReportFormat::Text);
        assert!(!args.anchor_first_frame);
    }

    #[test]
    fn args_parse_overrides() {
        let args = Args::try_parse_from([
            "tumble",
            "--variant",
            "quad",
            "--frames",
            "12",
            "--size",
            "640x480",
            "--report",
            "json",
            "--anchor-first-frame",
        ])
        .unwrap();
        assert_eq!(args.variant, Some(SceneVariant::Quad));
        assert_eq!(args.frames, Some(12));
        assert_eq!(args.size.as_deref(), Some("640x480"));
        assert_eq!(args.report, ReportFormat::Json);
        assert!(args.anchor_first_frame);
    }

    #[test]
    fn unknown_variant_is_rejected() {
        assert!(Args::try_parse_from(["tumble", "--variant", "sphere"]).is_err());
    }
}
