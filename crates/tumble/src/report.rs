use std::io::{self, Write};

use renderer::{DrawCall, FrameReport, LoopEnd, LoopSummary};
use serde::Serialize;

use crate::cli::ReportFormat;

#[derive(Debug, Serialize)]
struct FrameLine {
    frame: u64,
    timestamp: f64,
    delta: f64,
    angle: f64,
    width: u32,
    height: u32,
    draw: &'static str,
    count: usize,
    model_view: [f32; 16],
}

#[derive(Debug, Serialize)]
struct SummaryLine<'a> {
    summary: bool,
    variant: &'a str,
    frames: u64,
    last_timestamp: Option<f64>,
    angle: f64,
    end: &'static str,
}

fn draw_parts(draw: DrawCall) -> (&'static str, usize) {
    match draw {
        DrawCall::Indexed { count } => ("indexed", count),
        DrawCall::Strip { count } => ("strip", count),
    }
}

fn end_label(end: LoopEnd) -> &'static str {
    match end {
        LoopEnd::FrameLimit => "frame-limit",
        LoopEnd::DriverExhausted => "clock-exhausted",
        LoopEnd::Stopped => "stopped",
    }
}

/// Writes one line per frame plus a closing summary.
pub struct Reporter<W: Write> {
    out: W,
    format: ReportFormat,
    frames: u64,
    error: Option<io::Error>,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: ReportFormat) -> Self {
        Self {
            out,
            format,
            frames: 0,
            error: None,
        }
    }

    /// Records a frame. Write failures are kept and surfaced by [`finish`](Self::finish).
    pub fn frame(&mut self, report: &FrameReport) {
        self.frames += 1;
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.write_frame(report) {
            self.error = Some(err);
        }
    }

    fn write_frame(&mut self, report: &FrameReport) -> io::Result<()> {
        let (draw, count) = draw_parts(report.draw);
        let (width, height) = report.drawable;
        match self.format {
            ReportFormat::Text => writeln!(
                self.out,
                "frame {:>5}  t={:.4}s  dt={:.4}s  angle={:.4}  {}x{}  {}({})",
                self.frames,
                report.timestamp,
                report.delta,
                report.elapsed_angle,
                width,
                height,
                draw,
                count
            ),
            ReportFormat::Json => {
                let line = FrameLine {
                    frame: self.frames,
                    timestamp: report.timestamp,
                    delta: report.delta,
                    angle: report.elapsed_angle,
                    width,
                    height,
                    draw,
                    count,
                    model_view: report.transforms.model_view_columns(),
                };
                serde_json::to_writer(&mut self.out, &line)?;
                writeln!(self.out)
            }
        }
    }

    pub fn finish(mut self, variant: &str, summary: &LoopSummary) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        let end = end_label(summary.end);
        match self.format {
            ReportFormat::Text => writeln!(
                self.out,
                "{variant}: drew {} frames, final angle {:.4} ({end})",
                summary.frames, summary.elapsed_angle
            )?,
            ReportFormat::Json => {
                let line = SummaryLine {
                    summary: true,
                    variant,
                    frames: summary.frames,
                    last_timestamp: summary.last_timestamp,
                    angle: summary.elapsed_angle,
                    end,
                };
                serde_json::to_writer(&mut self.out, &line)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::{AxisRates, Camera, TransformPair};

    fn report(timestamp: f64) -> FrameReport {
        FrameReport {
            timestamp,
            delta: timestamp,
            elapsed_angle: timestamp,
            drawable: (800, 600),
            transforms: TransformPair::compute(
                &Camera::default(),
                AxisRates::TUMBLE,
                timestamp as f32,
                (800, 600),
            ),
            draw: DrawCall::Indexed { count: 36 },
        }
    }

    fn summary(frames: u64) -> LoopSummary {
        LoopSummary {
            frames,
            last_timestamp: Some(0.5),
            elapsed_angle: 0.5,
            end: LoopEnd::FrameLimit,
        }
    }

    #[test]
    fn text_lines_are_numbered() {
        let mut reporter = Reporter::new(Vec::new(), ReportFormat::Text);
        reporter.frame(&report(0.25));
        reporter.frame(&report(0.5));
        let out = reporter.finish("cube", &summary(2)).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("frame     1"));
        assert!(lines[1].contains("indexed(36)"));
        assert_eq!(lines[2], "cube: drew 2 frames, final angle 0.5000 (frame-limit)");
    }

    #[test]
    fn json_lines_parse_back() {
        let mut reporter = Reporter::new(Vec::new(), ReportFormat::Json);
        reporter.frame(&report(0.25));
        let out = reporter.finish("cube", &summary(1)).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        let frame: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(frame["frame"], 1);
        assert_eq!(frame["draw"], "indexed");
        assert_eq!(frame["count"], 36);
        assert_eq!(frame["model_view"].as_array().unwrap().len(), 16);

        let summary: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(summary["summary"], true);
        assert_eq!(summary["frames"], 1);
        assert_eq!(summary["end"], "frame-limit");
    }
}
