use scheduler::{AnimationDriver, FrameRequest};

use crate::context::GraphicsContext;
use crate::error::GraphicsError;
use crate::frame::{FrameOutcome, FrameRenderer, FrameReport, RendererState};

/// Why a [`FrameLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEnd {
    FrameLimit,
    DriverExhausted,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSummary {
    pub frames: u64,
    pub last_timestamp: Option<f64>,
    pub elapsed_angle: f64,
    pub end: LoopEnd,
}

/// Drives a [`FrameRenderer`] from an [`AnimationDriver`].
///
/// The loop holds at most one outstanding [`FrameRequest`]. A frame is only
/// requested after the previous one has been drawn, so draws never overlap.
pub struct FrameLoop<G: GraphicsContext, D: AnimationDriver> {
    renderer: FrameRenderer<G>,
    driver: D,
    pending: Option<FrameRequest>,
}

impl<G: GraphicsContext, D: AnimationDriver> FrameLoop<G, D> {
    pub fn new(renderer: FrameRenderer<G>, driver: D) -> Self {
        Self {
            renderer,
            driver,
            pending: None,
        }
    }

    /// Requests the first frame. Does nothing when a request is already
    /// pending or the renderer is not ready.
    pub fn start(&mut self) {
        if self.pending.is_some() || self.renderer.state() != RendererState::Ready {
            return;
        }
        self.pending = Some(self.driver.schedule_next_frame());
    }

    /// Waits for the pending request, draws, and requests the next frame.
    ///
    /// Returns `Ok(None)` when nothing is pending, the driver has no more
    /// frames, or the renderer was stopped. A failed draw is returned as-is
    /// and no further frame is requested.
    pub fn pump(&mut self) -> Result<Option<FrameReport>, GraphicsError> {
        let Some(request) = self.pending.take() else {
            return Ok(None);
        };
        let Some(timestamp) = self.driver.wait_for(request) else {
            tracing::debug!(request = request.id(), "animation driver exhausted");
            return Ok(None);
        };
        match self.renderer.draw(timestamp)? {
            FrameOutcome::Drawn(report) => {
                self.pending = Some(self.driver.schedule_next_frame());
                Ok(Some(report))
            }
            FrameOutcome::Stopped => Ok(None),
        }
    }

    /// Pumps until `limit` frames were drawn, the driver runs dry, or the
    /// loop is stopped.
    pub fn run(&mut self, limit: Option<u64>) -> Result<LoopSummary, GraphicsError> {
        self.run_with(limit, |_| {})
    }

    /// Like [`run`](Self::run), handing every drawn frame to `on_frame`.
    pub fn run_with<F>(
        &mut self,
        limit: Option<u64>,
        mut on_frame: F,
    ) -> Result<LoopSummary, GraphicsError>
    where
        F: FnMut(&FrameReport),
    {
        self.start();
        let mut frames = 0;
        let mut last_timestamp = None;

        let end = loop {
            if limit.is_some_and(|limit| frames >= limit) {
                break LoopEnd::FrameLimit;
            }
            if self.renderer.state() == RendererState::Stopped {
                break LoopEnd::Stopped;
            }
            match self.pump()? {
                Some(report) => {
                    frames += 1;
                    last_timestamp = Some(report.timestamp);
                    on_frame(&report);
                }
                None if self.renderer.state() == RendererState::Stopped => {
                    break LoopEnd::Stopped
                }
                None => break LoopEnd::DriverExhausted,
            }
        };

        let summary = LoopSummary {
            frames,
            last_timestamp,
            elapsed_angle: self.renderer.frame_state().elapsed_angle,
            end,
        };
        tracing::info!(
            frames = summary.frames,
            end = ?summary.end,
            angle = summary.elapsed_angle,
            "render loop finished"
        );
        Ok(summary)
    }

    /// Cancels the pending request and stops the renderer.
    pub fn stop(&mut self) {
        if let Some(request) = self.pending.take() {
            self.driver.cancel(request);
        }
        self.renderer.stop();
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    pub fn renderer(&self) -> &FrameRenderer<G> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut FrameRenderer<G> {
        &mut self.renderer
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_parts(self) -> (FrameRenderer<G>, D) {
        (self.renderer, self.driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{ShaderProgramBuilder, ShaderSource};
    use crate::context::BufferUsage;
    use crate::frame::FrameOptions;
    use crate::geometry::{GeometryBufferSet, Mesh};
    use crate::headless::HeadlessContext;
    use scheduler::ManualDriver;

    fn quad_loop(driver: ManualDriver) -> FrameLoop<HeadlessContext, ManualDriver> {
        let mut gl = HeadlessContext::new(640, 480);
        let program = ShaderProgramBuilder::new(&mut gl)
            .build(&ShaderSource::quad())
            .unwrap();
        let geometry = GeometryBufferSet::upload(&mut gl, &Mesh::quad(), BufferUsage::Static).unwrap();
        let mut renderer = FrameRenderer::new(gl, FrameOptions::default());
        renderer.attach(program, geometry).unwrap();
        FrameLoop::new(renderer, driver)
    }

    #[test]
    fn run_draws_every_queued_frame() {
        let mut frame_loop = quad_loop(ManualDriver::with_timestamps([0.1, 0.2, 0.35]));
        let summary = frame_loop.run(None).unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.end, LoopEnd::DriverExhausted);
        assert_eq!(summary.last_timestamp, Some(0.35));
        assert!((summary.elapsed_angle - 0.35).abs() < 1e-12);
        assert_eq!(frame_loop.renderer().context().draw_calls().len(), 3);
    }

    #[test]
    fn run_honours_frame_limit() {
        let mut frame_loop = quad_loop(ManualDriver::simulated(60.0, 10).unwrap());
        let summary = frame_loop.run(Some(4)).unwrap();
        assert_eq!(summary.frames, 4);
        assert_eq!(summary.end, LoopEnd::FrameLimit);
        assert_eq!(frame_loop.driver().remaining(), 6);
        assert!(frame_loop.pending().is_some());
    }

    #[test]
    fn only_one_request_is_ever_pending() {
        let mut frame_loop = quad_loop(ManualDriver::with_timestamps([1.0, 2.0]));
        frame_loop.start();
        frame_loop.start();
        assert_eq!(frame_loop.driver().scheduled_count(), 1);
        frame_loop.pump().unwrap();
        assert_eq!(frame_loop.driver().scheduled_count(), 2);
        assert_eq!(frame_loop.driver().pending(), frame_loop.pending());
    }

    #[test]
    fn stop_cancels_pending_frame_and_halts_drawing() {
        let mut frame_loop = quad_loop(ManualDriver::with_timestamps([1.0, 2.0, 3.0]));
        frame_loop.start();
        assert!(frame_loop.pump().unwrap().is_some());
        frame_loop.stop();

        assert_eq!(frame_loop.driver().cancelled_count(), 1);
        assert!(frame_loop.pending().is_none());
        assert_eq!(frame_loop.pump().unwrap(), None);

        let summary = frame_loop.run(None).unwrap();
        assert_eq!(summary.end, LoopEnd::Stopped);
        assert_eq!(summary.frames, 0);
        assert_eq!(frame_loop.renderer().context().draw_calls().len(), 1);
        assert_eq!(frame_loop.driver().remaining(), 2);
    }

    #[test]
    fn run_with_observes_each_frame_in_order() {
        let mut frame_loop = quad_loop(ManualDriver::with_timestamps([0.5, 1.0, 1.5]));
        let mut seen = Vec::new();
        frame_loop
            .run_with(None, |report| seen.push(report.timestamp))
            .unwrap();
        assert_eq!(seen, vec![0.5, 1.0, 1.5]);
    }

    #[test]
    fn start_requires_ready_renderer() {
        let renderer = FrameRenderer::new(HeadlessContext::new(1, 1), FrameOptions::default());
        let mut frame_loop = FrameLoop::new(renderer, ManualDriver::with_timestamps([1.0]));
        frame_loop.start();
        assert!(frame_loop.pending().is_none());
        let summary = frame_loop.run(None).unwrap();
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.end, LoopEnd::DriverExhausted);
    }
}
