use serde::Serialize;
use tokio::sync::broadcast;

use crate::diagnostics::{Assessment, PerformanceSample};

/// Render loop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    /// Waiting for the frame source to open.
    Initializing,
    Streaming,
    Stopped,
    /// The frame source failed to open.
    Error,
}

/// Notifications published by the render loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PipelineEvent {
    StateChanged {
        state: SchedulerState,
    },
    /// A window of throughput closed.
    #[serde(rename_all = "camelCase")]
    Performance {
        sample: PerformanceSample,
        assessment: Assessment,
    },
    /// A new composited frame is available for capture.
    #[serde(rename_all = "camelCase")]
    FrameReady {
        sequence: u64,
        timestamp_us: u64,
        width: u32,
        height: u32,
        garment_drawn: bool,
        pose_confidence: f32,
        pose_stability: f32,
        latency_ms: f64,
    },
    /// An iteration failed; the loop carries on.
    FrameDropped { stage: String, reason: String },
}

/// Fan-out of [`PipelineEvent`]s to any number of subscribers.
///
/// Publishing never blocks. A subscriber that falls more than `capacity`
/// events behind loses the oldest ones.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event, returning how many subscribers will see it.
    pub fn publish(&self, event: PipelineEvent) -> usize {
        // An error only means nobody is listening.
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
