use thiserror::Error;

/// Settings boundary errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("settings parse failed: {0}")]
    Parse(String),

    #[error("settings I/O failed: {0}")]
    Io(String),

    /// A value that cannot be clamped to a valid bound (NaN or infinite).
    #[error("invalid value for '{field}': {reason}")]
    Rejected { field: &'static str, reason: String },
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, SettingsError>;
