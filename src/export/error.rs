use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("no composited frame has been rendered yet")]
    NoOutput,

    #[error("image has no pixels")]
    EmptyArtifact,

    #[error("encoding failed: {0}")]
    Encode(String),

    #[error("resize failed: {0}")]
    Resize(String),
}

pub type Result<T> = std::result::Result<T, ExportError>;
