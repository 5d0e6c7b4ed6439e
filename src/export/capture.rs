use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::camera::types::Frame;
use crate::export::error::{ExportError, Result};
use crate::pipeline::scheduler::PipelineHandle;
use crate::render::GarmentDescriptor;
use crate::settings::types::StyleSettings;

/// Looks captured by this process, so ids stay unique within a millisecond.
static LOOK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Milliseconds since the Unix epoch.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Owned full-resolution copy of a composited frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    pub width: u32,
    pub height: u32,
    /// RGBA, row-major, top-down.
    pub rgba: Vec<u8>,
    pub captured_at_ms: u64,
}

impl ImageArtifact {
    pub fn from_frame(frame: &Frame, captured_at_ms: u64) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            rgba: frame.data.clone(),
            captured_at_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.rgba.is_empty()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.rgba.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// A saved try-on result. Owned entirely by the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedLook {
    pub id: String,
    #[serde(skip)]
    pub artifact: ImageArtifact,
    pub garment: Option<GarmentDescriptor>,
    pub settings: StyleSettings,
    /// Render loop iteration the image came from.
    pub sequence: u64,
    pub captured_at_ms: u64,
}

/// Snapshot the most recent composited frame at full resolution.
///
/// Only clones a reference under the lock; the render loop is never paused.
pub fn capture(handle: &PipelineHandle) -> Result<ImageArtifact> {
    let latest = handle.latest().ok_or(ExportError::NoOutput)?;
    let artifact = ImageArtifact::from_frame(&latest.frame, unix_millis());
    if artifact.is_empty() {
        return Err(ExportError::EmptyArtifact);
    }
    Ok(artifact)
}

/// Capture the current look together with the garment and settings it was
/// rendered with.
pub fn capture_look(handle: &PipelineHandle) -> Result<CapturedLook> {
    let latest = handle.latest().ok_or(ExportError::NoOutput)?;
    let captured_at_ms = unix_millis();
    let artifact = ImageArtifact::from_frame(&latest.frame, captured_at_ms);
    if artifact.is_empty() {
        return Err(ExportError::EmptyArtifact);
    }
    tracing::info!("captured look from frame {}", latest.sequence);
    Ok(CapturedLook {
        id: format!(
            "look-{captured_at_ms}-{}-{}",
            latest.sequence,
            LOOK_COUNTER.fetch_add(1, Ordering::Relaxed)
        ),
        artifact,
        garment: latest.garment.as_deref().cloned(),
        settings: latest.settings,
        sequence: latest.sequence,
        captured_at_ms,
    })
}
