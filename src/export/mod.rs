//! Capture and export of composited looks.

pub mod capture;
pub mod encode;
pub mod error;

pub use capture::{capture, capture_look, CapturedLook, ImageArtifact};
pub use encode::{data_url, default_filename, export, thumbnail, ExportFormat};
pub use error::ExportError;
