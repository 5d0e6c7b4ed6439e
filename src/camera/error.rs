use thiserror::Error;

/// Camera subsystem errors.
///
/// All variants are fatal to pipeline start and are surfaced to the caller,
/// which may offer a retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("device busy: {0}")]
    DeviceBusy(String),
}

impl CameraError {
    /// Whether a retry control should be offered for this error.
    ///
    /// Every camera error is retryable from the user's point of view: the
    /// permission can be granted, the other application can release the
    /// device, or the device can be plugged back in.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::PermissionDenied(_) | Self::DeviceBusy(_) | Self::DeviceNotFound(_) => true,
        }
    }

    /// Short machine-readable kind, used in state-change events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "permission_denied",
            Self::DeviceNotFound(_) => "device_not_found",
            Self::DeviceBusy(_) => "device_busy",
        }
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CameraError>;
