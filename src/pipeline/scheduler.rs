use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::{broadcast, Notify};

use crate::camera::backend::{CameraHandle, FrameSource};
use crate::camera::error::CameraError;
use crate::camera::types::Frame;
use crate::diagnostics::stats::{PerformanceMonitor, PerformanceSample, DEFAULT_WINDOW};
use crate::pipeline::error::FrameProcessingError;
use crate::pipeline::events::{EventBus, PipelineEvent, SchedulerState};
use crate::pose::{Pose, PoseEstimator, ProportionalEstimator};
use crate::render::debug::draw_pose_overlay;
use crate::render::{CompositeOutcome, Compositor, GarmentDescriptor};
use crate::segment::{EllipseSegmenter, SegmentationMask, Segmenter};
use crate::settings::error::SettingsError;
use crate::settings::store::SettingsStore;
use crate::settings::types::{SettingsUpdate, StyleSettings};

/// Scheduler tuning, usually derived from `PipelineConfig`.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Also render a copy of each frame with keypoint markers.
    pub debug_keypoints: bool,
    /// Length of one FPS window.
    pub sample_window: Duration,
    /// Warn when an open device has produced nothing for this long.
    pub no_frame_warn_after: Duration,
    /// Per-subscriber event backlog.
    pub event_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debug_keypoints: false,
            sample_window: DEFAULT_WINDOW,
            no_frame_warn_after: Duration::from_secs(5),
            event_capacity: 64,
        }
    }
}

/// Everything one iteration produced, replaced as a unit.
///
/// The pose and mask were computed from the frame this composite was drawn
/// on; readers never see a mix of iterations.
#[derive(Debug, Clone)]
pub struct IterationSnapshot {
    pub sequence: u64,
    /// Composited output, without debug markers.
    pub frame: Arc<Frame>,
    /// Composited output with keypoint markers, when enabled.
    pub debug_frame: Option<Arc<Frame>>,
    pub pose: Arc<Pose>,
    pub mask: Arc<SegmentationMask>,
    pub garment: Option<Arc<GarmentDescriptor>>,
    /// Settings the iteration was rendered with.
    pub settings: StyleSettings,
    pub garment_drawn: bool,
}

/// Result of one scheduler callback.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// An iteration completed; `garment_drawn` is false when there was no
    /// selection or the shoulders were not confident.
    Rendered { sequence: u64, garment_drawn: bool },
    /// The device has not produced a frame yet.
    NoFrame,
    /// A stage failed; the loop stays armed.
    Failed(FrameProcessingError),
    /// The loop was stopped; nothing was read.
    Stopped,
    /// `start` has not succeeded yet.
    NotStreaming,
}

struct Shared {
    armed: AtomicBool,
    state: Mutex<SchedulerState>,
    latest: Mutex<Option<Arc<IterationSnapshot>>>,
    garment: Mutex<Option<Arc<GarmentDescriptor>>>,
    settings: Arc<SettingsStore>,
    events: EventBus,
    stop_notify: Notify,
}

/// Cloneable control surface for a running scheduler.
///
/// Safe to use from any thread or task while the loop runs elsewhere.
#[derive(Clone)]
pub struct PipelineHandle {
    shared: Arc<Shared>,
}

impl PipelineHandle {
    pub fn state(&self) -> SchedulerState {
        *self.shared.state.lock()
    }

    /// Request a stop. The loop finishes any in-flight iteration, closes
    /// the device and moves to `Stopped` on its next callback.
    pub fn stop(&self) {
        if self.shared.armed.swap(false, Ordering::AcqRel) {
            tracing::debug!("stop requested");
        }
        self.shared.stop_notify.notify_one();
    }

    /// Whether further iterations will be scheduled.
    pub fn is_armed(&self) -> bool {
        self.shared.armed.load(Ordering::Acquire)
    }

    /// Resolves after the next [`stop`](Self::stop) request.
    pub async fn stop_requested(&self) {
        self.shared.stop_notify.notified().await;
    }

    pub fn select_garment(&self, garment: Arc<GarmentDescriptor>) {
        tracing::info!("selected garment '{}' ({})", garment.name, garment.id);
        *self.shared.garment.lock() = Some(garment);
    }

    pub fn clear_garment(&self) {
        *self.shared.garment.lock() = None;
    }

    pub fn selected_garment(&self) -> Option<Arc<GarmentDescriptor>> {
        self.shared.garment.lock().clone()
    }

    /// The most recent completed iteration.
    pub fn latest(&self) -> Option<Arc<IterationSnapshot>> {
        self.shared.latest.lock().clone()
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.shared.settings
    }

    /// Apply a settings update. Takes effect from the next iteration.
    pub fn update_settings(&self, update: &SettingsUpdate) -> Result<StyleSettings, SettingsError> {
        self.shared.settings.update(update)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.shared.events.subscribe()
    }
}

/// The render loop body: pulls a frame, runs pose, segmentation and
/// compositing in order, records metrics.
///
/// Driven by repeated calls to [`tick`](Self::tick), one per host callback.
/// Iterations never overlap because `tick` takes `&mut self`.
pub struct RenderScheduler {
    camera: CameraHandle,
    estimator: Box<dyn PoseEstimator>,
    segmenter: Box<dyn Segmenter>,
    compositor: Compositor,
    monitor: PerformanceMonitor,
    config: SchedulerConfig,
    shared: Arc<Shared>,
    sequence: u64,
    opened_at: Option<Instant>,
    watchdog_tripped: bool,
}

/// Run one stage, turning a panic into a per-iteration error.
fn run_stage<T>(
    stage: &'static str,
    f: impl FnOnce() -> Result<T, FrameProcessingError>,
) -> Result<T, FrameProcessingError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("{stage} stage panicked: {message}");
            Err(FrameProcessingError::StagePanicked(stage.to_string()))
        }
    }
}

impl RenderScheduler {
    /// Build a scheduler over `source` with the bundled estimator and
    /// segmenter. The device is not opened until [`start`](Self::start).
    pub fn new(
        source: Box<dyn FrameSource>,
        settings: Arc<SettingsStore>,
        config: SchedulerConfig,
    ) -> Self {
        let shared = Arc::new(Shared {
            armed: AtomicBool::new(false),
            state: Mutex::new(SchedulerState::Idle),
            latest: Mutex::new(None),
            garment: Mutex::new(None),
            settings,
            events: EventBus::new(config.event_capacity),
            stop_notify: Notify::new(),
        });
        Self {
            camera: CameraHandle::new(source),
            estimator: Box::new(ProportionalEstimator::new()),
            segmenter: Box::new(EllipseSegmenter::new()),
            compositor: Compositor::new(),
            monitor: PerformanceMonitor::new(config.sample_window),
            config,
            shared,
            sequence: 0,
            opened_at: None,
            watchdog_tripped: false,
        }
    }

    /// Replace the pose estimator.
    pub fn with_estimator(mut self, estimator: impl PoseEstimator + 'static) -> Self {
        self.estimator = Box::new(estimator);
        self
    }

    /// Replace the segmenter.
    pub fn with_segmenter(mut self, segmenter: impl Segmenter + 'static) -> Self {
        self.segmenter = Box::new(segmenter);
        self
    }

    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.shared.state.lock()
    }

    /// Whether the no-frame watchdog has fired for the current session.
    pub fn watchdog_tripped(&self) -> bool {
        self.watchdog_tripped
    }

    fn set_state(&self, next: SchedulerState) {
        let changed = {
            let mut state = self.shared.state.lock();
            let changed = *state != next;
            *state = next;
            changed
        };
        if changed {
            tracing::debug!("scheduler state -> {next:?}");
            self.shared
                .events
                .publish(PipelineEvent::StateChanged { state: next });
        }
    }

    /// Open the frame source and arm the loop.
    ///
    /// Camera errors are returned to the caller and leave the scheduler in
    /// `Error`; calling `start` again retries.
    pub fn start(&mut self) -> Result<(), CameraError> {
        if self.state() == SchedulerState::Streaming {
            return Ok(());
        }
        self.set_state(SchedulerState::Initializing);
        let device = self.camera.device();
        if let Err(e) = self.camera.open() {
            tracing::error!("failed to open camera '{}': {e}", device.name);
            self.set_state(SchedulerState::Error);
            return Err(e);
        }

        let now = Instant::now();
        self.opened_at = Some(now);
        self.watchdog_tripped = false;
        self.monitor.reset();
        self.monitor.start(now);
        self.shared.armed.store(true, Ordering::Release);
        self.set_state(SchedulerState::Streaming);
        tracing::info!("streaming from '{}' ({})", device.name, device.id);
        Ok(())
    }

    /// Disarm the loop, close the device and move to `Stopped`. Idempotent.
    pub fn stop(&mut self) {
        self.shared.armed.store(false, Ordering::Release);
        self.camera.close();
        self.opened_at = None;
        if self.state() != SchedulerState::Stopped {
            tracing::info!("render loop stopped after {} frames", self.sequence);
            self.set_state(SchedulerState::Stopped);
        }
    }

    /// One host callback.
    pub fn tick(&mut self) -> TickOutcome {
        match self.state() {
            SchedulerState::Streaming => {}
            SchedulerState::Stopped => return TickOutcome::Stopped,
            _ => return TickOutcome::NotStreaming,
        }
        if !self.shared.armed.load(Ordering::Acquire) {
            self.stop();
            return TickOutcome::Stopped;
        }

        let Some(frame) = self.camera.current_frame() else {
            self.check_watchdog();
            self.record_drop();
            return TickOutcome::NoFrame;
        };

        // One settings snapshot and one garment reference for the whole
        // iteration, however often they change meanwhile.
        let settings = self.shared.settings.snapshot();
        let garment = self.shared.garment.lock().clone();

        let started = Instant::now();
        match self.process(&frame, settings, garment) {
            Ok(snapshot) => {
                let latency = started.elapsed();
                let sequence = snapshot.sequence;
                let garment_drawn = snapshot.garment_drawn;
                let snapshot = Arc::new(snapshot);
                *self.shared.latest.lock() = Some(Arc::clone(&snapshot));
                self.publish_frame(&snapshot, latency);
                if let Some(sample) = self.monitor.record_frame(Instant::now(), latency) {
                    self.publish_sample(sample);
                }
                TickOutcome::Rendered {
                    sequence,
                    garment_drawn,
                }
            }
            Err(e) => {
                tracing::warn!("dropped frame at {} stage: {e}", e.stage());
                self.shared.events.publish(PipelineEvent::FrameDropped {
                    stage: e.stage().to_string(),
                    reason: e.to_string(),
                });
                self.record_drop();
                TickOutcome::Failed(e)
            }
        }
    }

    fn process(
        &mut self,
        frame: &Frame,
        settings: StyleSettings,
        garment: Option<Arc<GarmentDescriptor>>,
    ) -> Result<IterationSnapshot, FrameProcessingError> {
        let estimator = &mut self.estimator;
        let pose = run_stage("pose", || estimator.estimate(frame))?;
        if !pose.within_bounds(frame.width, frame.height) {
            tracing::trace!("{} placed keypoints outside the frame", estimator.name());
        }

        let segmenter = &mut self.segmenter;
        let mask = run_stage("segmentation", || {
            segmenter.segment(frame, &pose, settings.quality())
        })?;

        let mut surface = frame.clone();
        let garment_drawn = match &garment {
            Some(g) => {
                let compositor = &self.compositor;
                let outcome = run_stage("composite", || {
                    compositor.composite(&mut surface, &pose, Some(&mask), g, &settings)
                })?;
                matches!(outcome, CompositeOutcome::Drawn(_))
            }
            None => false,
        };

        // A failed overlay costs the debug view only, never the frame.
        let debug_frame = if self.config.debug_keypoints {
            let threshold = settings.pose_confidence_threshold();
            run_stage("debug", || {
                let mut overlay = surface.clone();
                draw_pose_overlay(&mut overlay, &pose, threshold);
                Ok(Arc::new(overlay))
            })
            .ok()
        } else {
            None
        };

        self.sequence += 1;
        Ok(IterationSnapshot {
            sequence: self.sequence,
            frame: Arc::new(surface),
            debug_frame,
            pose: Arc::new(pose),
            mask: Arc::new(mask),
            garment,
            settings,
            garment_drawn,
        })
    }

    fn publish_frame(&self, snapshot: &IterationSnapshot, latency: Duration) {
        tracing::trace!(
            "frame {} rendered in {:.2}ms",
            snapshot.sequence,
            latency.as_secs_f64() * 1000.0
        );
        self.shared.events.publish(PipelineEvent::FrameReady {
            sequence: snapshot.sequence,
            timestamp_us: snapshot.frame.timestamp_us,
            width: snapshot.frame.width,
            height: snapshot.frame.height,
            garment_drawn: snapshot.garment_drawn,
            pose_confidence: snapshot.pose.confidence(),
            pose_stability: snapshot.pose.stability(),
            latency_ms: latency.as_secs_f64() * 1000.0,
        });
    }

    fn record_drop(&mut self) {
        if let Some(sample) = self.monitor.record_drop(Instant::now()) {
            self.publish_sample(sample);
        }
    }

    fn publish_sample(&self, sample: PerformanceSample) {
        let assessment = sample.assess();
        tracing::debug!(
            "{} fps ({}), {:.1}ms latency, {:.1}% dropped",
            sample.fps,
            assessment.tier.label(),
            sample.latency_ms,
            sample.drop_rate
        );
        if sample.frame_count > 0 && sample.fps < 15 {
            tracing::warn!("low frame rate: {} fps", sample.fps);
        }
        self.shared
            .events
            .publish(PipelineEvent::Performance { sample, assessment });
    }

    fn check_watchdog(&mut self) {
        if self.watchdog_tripped {
            return;
        }
        if let Some(opened_at) = self.opened_at {
            let waited = opened_at.elapsed();
            if waited >= self.config.no_frame_warn_after {
                tracing::warn!(
                    "camera '{}' has produced no frames for {:.1}s",
                    self.camera.device().name,
                    waited.as_secs_f64()
                );
                self.watchdog_tripped = true;
            }
        }
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
