// Host-fed frame source: any capture stack pushes raw frames in, the
// pipeline reads the latest normalised frame out.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::camera::backend::FrameSource;
use crate::camera::convert;
use crate::camera::error::{CameraError, Result};
use crate::camera::types::{CameraDevice, DeviceId, Frame, RawFrame};

/// Latest-wins frame queue shared between a producer and the pipeline.
///
/// Holds at most `capacity` frames; a push beyond that evicts the oldest.
/// Readers get `Arc<Frame>` clones, never copies of the pixel data.
pub struct FrameBuffer {
    slots: Mutex<VecDeque<Arc<Frame>>>,
    capacity: usize,
    /// Frames accepted since creation. Survives `clear`.
    sequence: AtomicU64,
}

impl FrameBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            sequence: AtomicU64::new(0),
        }
    }

    /// Queue `frame`, evicting the oldest entry when full. A zero-capacity
    /// buffer drops everything.
    pub fn push(&self, frame: Frame) {
        if self.capacity == 0 {
            return;
        }
        let mut slots = self.slots.lock();
        while slots.len() >= self.capacity {
            slots.pop_front();
        }
        slots.push_back(Arc::new(frame));
        self.sequence.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// The newest frame, if any.
    pub fn latest(&self) -> Option<Arc<Frame>> {
        self.slots.lock().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }
}

struct FeedShared {
    buffer: FrameBuffer,
    open: AtomicBool,
    open_error: Mutex<Option<CameraError>>,
    rejected: AtomicU64,
}

/// A frame source fed by the host application.
///
/// Created together with a [`FeedSender`]; the host's capture thread pushes
/// raw frames through the sender while the pipeline reads from the camera.
pub struct FeedCamera {
    device: CameraDevice,
    shared: Arc<FeedShared>,
}

/// Producer side of a [`FeedCamera`]. Cheap to clone.
#[derive(Clone)]
pub struct FeedSender {
    shared: Arc<FeedShared>,
}

impl FeedCamera {
    /// Create a feed camera and its sender.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> (Self, FeedSender) {
        let shared = Arc::new(FeedShared {
            buffer: FrameBuffer::new(3),
            open: AtomicBool::new(false),
            open_error: Mutex::new(None),
            rejected: AtomicU64::new(0),
        });
        let camera = Self {
            device: CameraDevice {
                id: DeviceId::new(id),
                name: name.into(),
                is_connected: true,
            },
            shared: Arc::clone(&shared),
        };
        (camera, FeedSender { shared })
    }
}

impl FeedSender {
    /// Push a raw frame. Returns `false` when the frame was discarded,
    /// either because the camera is closed or the buffer is malformed.
    pub fn push(&self, raw: &RawFrame) -> bool {
        if !self.shared.open.load(Ordering::Acquire) {
            return false;
        }
        match convert::normalise(raw) {
            Some(frame) => {
                self.shared.buffer.push(frame);
                true
            }
            None => {
                let rejected = self.shared.rejected.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(
                    "discarding malformed {:?} frame {}x{} ({} bytes, {rejected} rejected so far)",
                    raw.format,
                    raw.width,
                    raw.height,
                    raw.data.len()
                );
                false
            }
        }
    }

    /// Make the next `open` fail with `error` (or succeed again with `None`).
    ///
    /// Used by hosts that learn about permission or exclusivity problems
    /// out of band, e.g. from a platform permission prompt.
    pub fn set_open_error(&self, error: Option<CameraError>) {
        *self.shared.open_error.lock() = error;
    }

    /// Whether the pipeline currently holds the camera open.
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::Acquire)
    }

    /// Number of frames accepted so far.
    pub fn frames_accepted(&self) -> u64 {
        self.shared.buffer.sequence()
    }
}

impl FrameSource for FeedCamera {
    fn device(&self) -> CameraDevice {
        self.device.clone()
    }

    fn open(&mut self) -> Result<()> {
        if let Some(err) = self.shared.open_error.lock().clone() {
            return Err(err);
        }
        self.shared.open.store(true, Ordering::Release);
        tracing::info!("feed camera '{}' opened", self.device.name);
        Ok(())
    }

    fn current_frame(&self) -> Option<Arc<Frame>> {
        self.shared.buffer.latest()
    }

    fn close(&mut self) {
        if self.shared.open.swap(false, Ordering::AcqRel) {
            tracing::info!("feed camera '{}' closed", self.device.name);
        }
        self.shared.buffer.clear();
    }

    fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::Acquire)
    }
}
