//! Frame scheduling for the render loop.
//!
//! An [`AnimationDriver`] stands in for the host's display-refresh callback:
//! callers register interest in the next refresh, then block on that request
//! until it fires with a timestamp in seconds. Each driver keeps at most one
//! pending request, so a renderer driven by it can never be re-entered.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use sceneconfig::{AnimationSettings, MIN_FPS};

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("frame rate must be a finite number of at least {MIN_FPS} (got {0})")]
    InvalidFps(f32),
}

/// Handle for a single pending frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(u64);

impl FrameRequest {
    pub fn id(&self) -> u64 {
        self.0
    }
}

pub trait AnimationDriver {
    /// Registers interest in the next refresh, replacing any request still pending.
    fn schedule_next_frame(&mut self) -> FrameRequest;

    /// Withdraws `request`; it will never fire.
    fn cancel(&mut self, request: FrameRequest);

    /// Waits for `request` to fire and returns its timestamp in seconds.
    ///
    /// Returns `None` when the request was cancelled, superseded, or the
    /// driver has no more frames to deliver.
    fn wait_for(&mut self, request: FrameRequest) -> Option<f64>;
}

#[derive(Debug, Default)]
struct PendingSlot {
    next_id: u64,
    pending: Option<FrameRequest>,
}

impl PendingSlot {
    fn schedule(&mut self) -> FrameRequest {
        self.next_id = self.next_id.wrapping_add(1);
        let request = FrameRequest(self.next_id);
        self.pending = Some(request);
        request
    }

    fn cancel(&mut self, request: FrameRequest) -> bool {
        if self.pending == Some(request) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    fn is_pending(&self, request: FrameRequest) -> bool {
        self.pending == Some(request)
    }

    fn fire(&mut self) {
        self.pending = None;
    }
}

/// Evenly spaced timestamps produced on demand.
#[derive(Debug, Default)]
struct FrameSeries {
    interval: f64,
    next: u64,
    remaining: u64,
}

impl FrameSeries {
    fn take(&mut self) -> Option<f64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let timestamp = self.next as f64 * self.interval;
        self.next = self.next.saturating_add(1);
        Some(timestamp)
    }
}

/// Driver that fires pre-queued timestamps synchronously.
///
/// Useful for tests and for simulated sessions where no real display refresh
/// exists. Each `wait_for` consumes one queued timestamp; simulated frames
/// follow once the queue is drained.
#[derive(Debug, Default)]
pub struct ManualDriver {
    timestamps: VecDeque<f64>,
    series: FrameSeries,
    slot: PendingSlot,
    scheduled: u64,
    cancelled: u64,
    fired: u64,
}

impl ManualDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamps(timestamps: impl IntoIterator<Item = f64>) -> Self {
        Self {
            timestamps: timestamps.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Builds a driver firing `frames` refreshes spaced `1 / fps` seconds apart,
    /// starting one interval after zero.
    pub fn simulated(fps: f32, frames: u64) -> Result<Self, DriverError> {
        let interval = frame_interval(fps)?.as_secs_f64();
        Ok(Self {
            series: FrameSeries {
                interval,
                next: 1,
                remaining: frames,
            },
            ..Self::default()
        })
    }

    pub fn push(&mut self, timestamp: f64) {
        self.timestamps.push_back(timestamp);
    }

    pub fn remaining(&self) -> u64 {
        (self.timestamps.len() as u64).saturating_add(self.series.remaining)
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.slot.pending
    }

    pub fn scheduled_count(&self) -> u64 {
        self.scheduled
    }

    pub fn cancelled_count(&self) -> u64 {
        self.cancelled
    }

    pub fn fired_count(&self) -> u64 {
        self.fired
    }
}

impl AnimationDriver for ManualDriver {
    fn schedule_next_frame(&mut self) -> FrameRequest {
        self.scheduled += 1;
        self.slot.schedule()
    }

    fn cancel(&mut self, request: FrameRequest) {
        if self.slot.cancel(request) {
            self.cancelled += 1;
        }
    }

    fn wait_for(&mut self, request: FrameRequest) -> Option<f64> {
        if !self.slot.is_pending(request) {
            return None;
        }
        let timestamp = self
            .timestamps
            .pop_front()
            .or_else(|| self.series.take())?;
        self.slot.fire();
        self.fired += 1;
        Some(timestamp)
    }
}

/// Wall-clock driver that paces frames to a fixed rate.
///
/// Timestamps are seconds since the driver was created. When a run duration is
/// configured the driver reports exhaustion once it elapses.
#[derive(Debug)]
pub struct IntervalDriver {
    interval: Duration,
    origin: Instant,
    next_tick: Instant,
    deadline: Option<Instant>,
    slot: PendingSlot,
}

impl IntervalDriver {
    pub fn new(fps: f32, run_for: Option<Duration>) -> Result<Self, DriverError> {
        let interval = frame_interval(fps)?;
        let origin = Instant::now();
        Ok(Self {
            interval,
            origin,
            next_tick: advance(origin, interval),
            // A run duration past the clock's range never expires.
            deadline: run_for.and_then(|duration| origin.checked_add(duration)),
            slot: PendingSlot::default(),
        })
    }

    pub fn from_settings(settings: &AnimationSettings) -> Result<Self, DriverError> {
        Self::new(settings.fps, settings.duration)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

impl AnimationDriver for IntervalDriver {
    fn schedule_next_frame(&mut self) -> FrameRequest {
        self.slot.schedule()
    }

    fn cancel(&mut self, request: FrameRequest) {
        self.slot.cancel(request);
    }

    fn wait_for(&mut self, request: FrameRequest) -> Option<f64> {
        if !self.slot.is_pending(request) {
            return None;
        }

        let now = Instant::now();
        if self.expired(now) {
            tracing::debug!("interval driver reached its run duration");
            return None;
        }
        if now < self.next_tick {
            std::thread::sleep(self.next_tick - now);
        }

        let fired_at = Instant::now();
        if self.expired(fired_at) {
            return None;
        }

        self.next_tick = advance(self.next_tick, self.interval);
        if self.next_tick < fired_at {
            // Fell behind (stall or slow frame): skip missed ticks instead of bursting.
            self.next_tick = advance(fired_at, self.interval);
        }

        self.slot.fire();
        Some(fired_at.saturating_duration_since(self.origin).as_secs_f64())
    }
}

fn frame_interval(fps: f32) -> Result<Duration, DriverError> {
    if !fps.is_finite() || fps < MIN_FPS {
        return Err(DriverError::InvalidFps(fps));
    }
    Duration::try_from_secs_f64(1.0 / fps as f64).map_err(|_| DriverError::InvalidFps(fps))
}

fn advance(at: Instant, interval: Duration) -> Instant {
    at.checked_add(interval).unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_driver_fires_queued_timestamps_in_order() {
        let mut driver = ManualDriver::with_timestamps([0.5, 1.0]);
        let first = driver.schedule_next_frame();
        assert_eq!(driver.wait_for(first), Some(0.5));
        let second = driver.schedule_next_frame();
        assert_eq!(driver.wait_for(second), Some(1.0));
        let third = driver.schedule_next_frame();
        assert_eq!(driver.wait_for(third), None);
        assert_eq!(driver.fired_count(), 2);
        assert_eq!(driver.scheduled_count(), 3);
    }

    #[test]
    fn cancelled_request_never_fires() {
        let mut driver = ManualDriver::with_timestamps([1.0]);
        let request = driver.schedule_next_frame();
        driver.cancel(request);
        assert_eq!(driver.wait_for(request), None);
        assert_eq!(driver.remaining(), 1, "cancelled request must not consume a frame");
        assert_eq!(driver.cancelled_count(), 1);
        assert!(driver.pending().is_none());
    }

    #[test]
    fn rescheduling_supersedes_previous_request() {
        let mut driver = ManualDriver::with_timestamps([1.0, 2.0]);
        let stale = driver.schedule_next_frame();
        let fresh = driver.schedule_next_frame();
        assert_ne!(stale, fresh);
        assert_eq!(driver.wait_for(stale), None);
        assert_eq!(driver.wait_for(fresh), Some(1.0));
    }

    #[test]
    fn cancelling_a_stale_request_is_ignored() {
        let mut driver = ManualDriver::with_timestamps([1.0]);
        let stale = driver.schedule_next_frame();
        let fresh = driver.schedule_next_frame();
        driver.cancel(stale);
        assert_eq!(driver.cancelled_count(), 0);
        assert_eq!(driver.wait_for(fresh), Some(1.0));
    }

    #[test]
    fn simulated_driver_spaces_frames_by_interval() {
        let mut driver = ManualDriver::simulated(50.0, 3).unwrap();
        let mut seen = Vec::new();
        loop {
            let request = driver.schedule_next_frame();
            match driver.wait_for(request) {
                Some(timestamp) => seen.push(timestamp),
                None => break,
            }
        }
        assert_eq!(seen.len(), 3);
        assert!((seen[0] - 0.02).abs() < 1e-9);
        assert!((seen[2] - 0.06).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_positive_fps() {
        assert!(matches!(
            IntervalDriver::new(0.0, None),
            Err(DriverError::InvalidFps(_))
        ));
        assert!(matches!(
            ManualDriver::simulated(f32::NAN, 1),
            Err(DriverError::InvalidFps(_))
        ));
    }

    #[test]
    fn rejects_frame_rates_below_floor() {
        assert!(matches!(
            IntervalDriver::new(1e-30, None),
            Err(DriverError::InvalidFps(_))
        ));
        assert!(matches!(
            ManualDriver::simulated(1e-30, 1),
            Err(DriverError::InvalidFps(_))
        ));
        assert!(ManualDriver::simulated(MIN_FPS, 1).is_ok());
    }

    #[test]
    fn huge_simulated_frame_counts_are_generated_lazily() {
        let mut driver = ManualDriver::simulated(60.0, u64::MAX).unwrap();
        assert_eq!(driver.remaining(), u64::MAX);
        let request = driver.schedule_next_frame();
        assert!((driver.wait_for(request).unwrap() - 1.0 / 60.0).abs() < 1e-9);
        assert_eq!(driver.remaining(), u64::MAX - 1);
    }

    #[test]
    fn queued_timestamps_fire_before_simulated_frames() {
        let mut driver = ManualDriver::simulated(10.0, 1).unwrap();
        driver.push(5.0);
        assert_eq!(driver.remaining(), 2);
        let first = driver.schedule_next_frame();
        assert_eq!(driver.wait_for(first), Some(5.0));
        let second = driver.schedule_next_frame();
        assert!((driver.wait_for(second).unwrap() - 0.1).abs() < 1e-9);
        let third = driver.schedule_next_frame();
        assert_eq!(driver.wait_for(third), None);
    }

    #[test]
    fn unreachable_run_duration_never_expires() {
        let mut driver = IntervalDriver::new(1000.0, Some(Duration::MAX)).unwrap();
        let request = driver.schedule_next_frame();
        assert!(driver.wait_for(request).is_some());
    }

    #[test]
    fn interval_driver_produces_non_decreasing_timestamps() {
        let mut driver = IntervalDriver::new(1000.0, None).unwrap();
        let mut last = 0.0;
        for _ in 0..5 {
            let request = driver.schedule_next_frame();
            let timestamp = driver.wait_for(request).expect("frame");
            assert!(timestamp >= last);
            last = timestamp;
        }
    }

    #[test]
    fn interval_driver_stops_after_run_duration() {
        let mut driver = IntervalDriver::new(1000.0, Some(Duration::from_millis(20))).unwrap();
        let mut fired = 0;
        loop {
            let request = driver.schedule_next_frame();
            if driver.wait_for(request).is_none() {
                break;
            }
            fired += 1;
            assert!(fired < 10_000, "driver never expired");
        }
        assert!(fired >= 1);
    }

    #[test]
    fn interval_driver_from_settings_uses_fps() {
        let settings = AnimationSettings {
            fps: 20.0,
            ..AnimationSettings::default()
        };
        let driver = IntervalDriver::from_settings(&settings).unwrap();
        assert!((driver.interval().as_secs_f64() - 0.05).abs() < 1e-6);
    }
}
