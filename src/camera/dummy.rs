use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::camera::backend::FrameSource;
use crate::camera::error::{CameraError, Result};
use crate::camera::types::{CameraDevice, DeviceId, Frame};

const DUMMY_DEVICE_ID: &str = "dummy:test:camera-001";
const DUMMY_DEVICE_NAME: &str = "Dummy Test Camera";

/// Counters shared between a [`DummyCamera`] and its observers.
#[derive(Debug, Default)]
pub struct DummyProbe {
    opens: AtomicU64,
    closes: AtomicU64,
    reads: AtomicU64,
    open_tracks: AtomicU64,
}

impl DummyProbe {
    pub fn opens(&self) -> u64 {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u64 {
        self.closes.load(Ordering::SeqCst)
    }

    /// Number of `current_frame` calls made against the device.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Tracks currently held open (0 or 1).
    pub fn open_tracks(&self) -> u64 {
        self.open_tracks.load(Ordering::SeqCst)
    }
}

/// A synthetic camera for running the pipeline without hardware.
///
/// Renders a fixed test scene (gradient backdrop with a standing figure)
/// at the requested resolution. Fault injection covers open failures and
/// a warm-up period during which no frame is available.
pub struct DummyCamera {
    width: u32,
    height: u32,
    scene: Option<Vec<u8>>,
    opened_at: Option<Instant>,
    open_error: Option<CameraError>,
    warmup_reads: u64,
    probe: Arc<DummyProbe>,
}

impl DummyCamera {
    /// Create a dummy camera producing `width` x `height` frames.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scene: None,
            opened_at: None,
            open_error: None,
            warmup_reads: 0,
            probe: Arc::new(DummyProbe::default()),
        }
    }

    /// Make every `open` fail with `error`.
    pub fn with_open_error(mut self, error: CameraError) -> Self {
        self.open_error = Some(error);
        self
    }

    /// Report no frame for the first `reads` calls after opening.
    pub fn with_warmup(mut self, reads: u64) -> Self {
        self.warmup_reads = reads;
        self
    }

    /// Shared counters for observing device usage.
    pub fn probe(&self) -> Arc<DummyProbe> {
        Arc::clone(&self.probe)
    }

    /// The stable device ID for the dummy camera.
    pub fn device_id() -> DeviceId {
        DeviceId::new(DUMMY_DEVICE_ID)
    }

    /// Render the test scene as RGBA.
    pub fn render_scene(width: u32, height: u32) -> Vec<u8> {
        let w = width as f32;
        let h = height as f32;
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let fx = x as f32 + 0.5;
                let fy = y as f32 + 0.5;

                // Head
                let hx = (fx - 0.5 * w) / (0.07 * w);
                let hy = (fy - 0.15 * h) / (0.09 * h);
                // Body column between shoulders and ankles
                let in_body = fx > 0.36 * w && fx < 0.64 * w && fy > 0.26 * h && fy < 0.95 * h;

                let rgba = if hx * hx + hy * hy <= 1.0 {
                    [224, 172, 140, 255]
                } else if in_body {
                    [70, 70, 80, 255]
                } else {
                    let shade = (40.0 + 120.0 * fy / h) as u8;
                    [shade, shade, (shade as u16 + 30).min(255) as u8, 255]
                };
                data.extend_from_slice(&rgba);
            }
        }
        data
    }
}

impl FrameSource for DummyCamera {
    fn device(&self) -> CameraDevice {
        CameraDevice {
            id: Self::device_id(),
            name: DUMMY_DEVICE_NAME.to_string(),
            is_connected: true,
        }
    }

    fn open(&mut self) -> Result<()> {
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        if self.opened_at.is_some() {
            return Err(CameraError::DeviceBusy(DUMMY_DEVICE_ID.to_string()));
        }
        self.scene = Some(Self::render_scene(self.width, self.height));
        self.opened_at = Some(Instant::now());
        self.probe.open_tracks.store(1, Ordering::SeqCst);
        Ok(())
    }

    fn current_frame(&self) -> Option<Arc<Frame>> {
        let reads = self.probe.reads.fetch_add(1, Ordering::SeqCst) + 1;
        let opened_at = self.opened_at?;
        if reads <= self.warmup_reads {
            return None;
        }
        let scene = self.scene.as_ref()?;
        Some(Arc::new(Frame {
            data: scene.clone(),
            width: self.width,
            height: self.height,
            timestamp_us: opened_at.elapsed().as_micros() as u64,
        }))
    }

    fn close(&mut self) {
        if self.opened_at.take().is_some() {
            self.probe.closes.fetch_add(1, Ordering::SeqCst);
        }
        self.scene = None;
        self.probe.open_tracks.store(0, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.opened_at.is_some()
    }
}
