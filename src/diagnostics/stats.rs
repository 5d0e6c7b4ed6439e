use serde::Serialize;
use std::time::{Duration, Instant};

use crate::diagnostics::tier::{assess, Assessment};

/// Default length of one FPS window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(1000);

/// Rolling-window throughput counter for the render loop.
///
/// Counts completed and dropped iterations; once a window has elapsed it
/// converts the counters into a [`PerformanceSample`] and starts over.
/// Nothing accumulates across windows.
pub struct PerformanceMonitor {
    window: Duration,
    window_start: Option<Instant>,
    frame_count: u32,
    drop_count: u32,
    latency_sum: Duration,
    last_sample: Option<PerformanceSample>,
}

/// One window's worth of throughput, serialised for the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSample {
    pub fps: u32,
    /// Mean per-iteration processing latency over the window.
    pub latency_ms: f64,
    /// Dropped iterations as a percentage (0.0 - 100.0).
    pub drop_rate: f64,
    pub frame_count: u32,
    pub drop_count: u32,
}

impl PerformanceSample {
    /// Tier and latency class for this sample.
    pub fn assess(&self) -> Assessment {
        assess(self.fps, self.latency_ms)
    }
}

impl PerformanceMonitor {
    /// Create a monitor with zeroed counters and the given window length.
    pub fn new(window: Duration) -> Self {
        Self {
            window: window.max(Duration::from_millis(1)),
            window_start: None,
            frame_count: 0,
            drop_count: 0,
            latency_sum: Duration::ZERO,
            last_sample: None,
        }
    }

    /// Begin a fresh window at `now`, discarding partial counts.
    pub fn start(&mut self, now: Instant) {
        self.window_start = Some(now);
        self.frame_count = 0;
        self.drop_count = 0;
        self.latency_sum = Duration::ZERO;
    }

    /// Record a completed iteration. Returns a sample when a window closes.
    pub fn record_frame(&mut self, now: Instant, latency: Duration) -> Option<PerformanceSample> {
        self.frame_count += 1;
        self.latency_sum += latency;
        self.roll(now)
    }

    /// Record a skipped or failed iteration. Returns a sample when a window closes.
    pub fn record_drop(&mut self, now: Instant) -> Option<PerformanceSample> {
        self.drop_count += 1;
        self.roll(now)
    }

    fn roll(&mut self, now: Instant) -> Option<PerformanceSample> {
        let start = *self.window_start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(start);
        if elapsed < self.window {
            return None;
        }

        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let total = self.frame_count + self.drop_count;
        let sample = PerformanceSample {
            fps: (self.frame_count as f64 * 1000.0 / elapsed_ms).round() as u32,
            latency_ms: if self.frame_count == 0 {
                0.0
            } else {
                self.latency_sum.as_secs_f64() * 1000.0 / self.frame_count as f64
            },
            drop_rate: if total == 0 {
                0.0
            } else {
                self.drop_count as f64 / total as f64 * 100.0
            },
            frame_count: self.frame_count,
            drop_count: self.drop_count,
        };

        self.start(now);
        self.last_sample = Some(sample);
        Some(sample)
    }

    /// The most recently completed window, if any.
    pub fn last_sample(&self) -> Option<PerformanceSample> {
        self.last_sample
    }

    /// Reset all counters and forget the last sample.
    pub fn reset(&mut self) {
        self.window_start = None;
        self.frame_count = 0;
        self.drop_count = 0;
        self.latency_sum = Duration::ZERO;
        self.last_sample = None;
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
