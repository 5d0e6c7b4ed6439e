use thiserror::Error;

/// Per-iteration failures.
///
/// These never leave the render loop: the scheduler logs them, counts the
/// iteration as dropped and re-arms.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameProcessingError {
    #[error("pose estimation failed: {0}")]
    Estimation(String),

    #[error("segmentation failed: {0}")]
    Segmentation(String),

    #[error("compositing failed: {0}")]
    Composite(String),

    #[error("mask is {mask_width}x{mask_height} but frame is {frame_width}x{frame_height}")]
    DimensionMismatch {
        frame_width: u32,
        frame_height: u32,
        mask_width: u32,
        mask_height: u32,
    },

    #[error("stage '{0}' panicked")]
    StagePanicked(String),
}

impl FrameProcessingError {
    /// The pipeline stage the error originated in.
    pub fn stage(&self) -> &str {
        match self {
            Self::Estimation(_) => "pose",
            Self::Segmentation(_) => "segmentation",
            Self::Composite(_) | Self::DimensionMismatch { .. } => "composite",
            Self::StagePanicked(stage) => stage,
        }
    }
}
