use std::sync::Arc;

use crate::camera::error::Result;
use crate::camera::types::{CameraDevice, Frame};

/// Platform-agnostic frame source.
///
/// Owns the capture device. Implementations decode frames on whatever
/// thread their capture stack uses and expose the most recent one through
/// `current_frame`.
pub trait FrameSource: Send {
    /// Describe the device behind this source.
    fn device(&self) -> CameraDevice;

    /// Acquire the device and start streaming.
    fn open(&mut self) -> Result<()>;

    /// The most recent decoded frame, `None` until the device has produced
    /// one with non-zero dimensions.
    fn current_frame(&self) -> Option<Arc<Frame>>;

    /// Stop streaming and release every device track. Must be idempotent.
    fn close(&mut self);

    /// Whether the device is currently acquired.
    fn is_open(&self) -> bool;
}

/// Scoped ownership of an opened frame source.
///
/// The device is closed when the handle is closed explicitly or dropped,
/// so every exit path releases it.
pub struct CameraHandle {
    source: Box<dyn FrameSource>,
}

impl CameraHandle {
    /// Wrap a source without opening it.
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self { source }
    }

    /// Wrap and open a source in one step.
    pub fn open_source(source: Box<dyn FrameSource>) -> Result<Self> {
        let mut handle = Self::new(source);
        handle.open()?;
        Ok(handle)
    }

    /// Open the underlying device. Opening an open device is a no-op.
    pub fn open(&mut self) -> Result<()> {
        if self.source.is_open() {
            return Ok(());
        }
        self.source.open()
    }

    /// The most recent non-empty frame, `None` while closed.
    pub fn current_frame(&self) -> Option<Arc<Frame>> {
        if !self.source.is_open() {
            return None;
        }
        self.source.current_frame().filter(|f| !f.is_empty())
    }

    /// Release the device. Idempotent.
    pub fn close(&mut self) {
        if self.source.is_open() {
            tracing::debug!("closing camera '{}'", self.source.device().name);
        }
        self.source.close();
    }

    pub fn is_open(&self) -> bool {
        self.source.is_open()
    }

    pub fn device(&self) -> CameraDevice {
        self.source.device()
    }
}

impl Drop for CameraHandle {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::error::CameraError;
    use crate::camera::types::DeviceId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        opens: AtomicUsize,
        closes: AtomicUsize,
        reads: AtomicUsize,
    }

    /// Stub source for testing the handle contract.
    struct StubSource {
        open: bool,
        fail_with: Option<CameraError>,
        frame: Option<Arc<Frame>>,
        counters: Arc<Counters>,
    }

    impl StubSource {
        fn new(counters: Arc<Counters>) -> Self {
            Self {
                open: false,
                fail_with: None,
                frame: Some(Arc::new(Frame::filled(4, 4, [0, 0, 0, 255], 0))),
                counters,
            }
        }
    }

    impl FrameSource for StubSource {
        fn device(&self) -> CameraDevice {
            CameraDevice {
                id: DeviceId::new("stub"),
                name: "Stub".to_string(),
                is_connected: true,
            }
        }

        fn open(&mut self) -> Result<()> {
            self.counters.opens.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.fail_with.clone() {
                return Err(e);
            }
            self.open = true;
            Ok(())
        }

        fn current_frame(&self) -> Option<Arc<Frame>> {
            self.counters.reads.fetch_add(1, Ordering::SeqCst);
            self.frame.clone()
        }

        fn close(&mut self) {
            if self.open {
                self.counters.closes.fetch_add(1, Ordering::SeqCst);
            }
            self.open = false;
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    #[test]
    fn open_source_opens_device() {
        let counters = Arc::new(Counters::default());
        let handle = CameraHandle::open_source(Box::new(StubSource::new(counters.clone()))).unwrap();
        assert!(handle.is_open());
        assert_eq!(counters.opens.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn open_failure_is_returned() {
        let counters = Arc::new(Counters::default());
        let mut source = StubSource::new(counters);
        source.fail_with = Some(CameraError::PermissionDenied("user declined".to_string()));
        let result = CameraHandle::open_source(Box::new(source));
        assert!(matches!(result, Err(CameraError::PermissionDenied(_))));
    }

    #[test]
    fn reopening_an_open_handle_is_noop() {
        let counters = Arc::new(Counters::default());
        let mut handle = CameraHandle::open_source(Box::new(StubSource::new(counters.clone()))).unwrap();
        handle.open().unwrap();
        assert_eq!(counters.opens.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn closed_handle_yields_no_frames_and_does_not_read() {
        let counters = Arc::new(Counters::default());
        let handle = CameraHandle::new(Box::new(StubSource::new(counters.clone())));
        assert!(handle.current_frame().is_none());
        assert_eq!(counters.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_frames_are_hidden() {
        let counters = Arc::new(Counters::default());
        let mut source = StubSource::new(counters);
        source.frame = Some(Arc::new(Frame::filled(0, 0, [0, 0, 0, 0], 0)));
        let handle = CameraHandle::open_source(Box::new(source)).unwrap();
        assert!(handle.current_frame().is_none());
    }

    #[test]
    fn close_is_idempotent() {
        let counters = Arc::new(Counters::default());
        let mut handle = CameraHandle::open_source(Box::new(StubSource::new(counters.clone()))).unwrap();
        handle.close();
        handle.close();
        assert!(!handle.is_open());
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_device() {
        let counters = Arc::new(Counters::default());
        {
            let _handle =
                CameraHandle::open_source(Box::new(StubSource::new(counters.clone()))).unwrap();
        }
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn trait_object_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Box<dyn FrameSource>>();
        assert_send::<CameraHandle>();
    }
}
