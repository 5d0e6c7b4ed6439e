use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::export::capture::ImageArtifact;
use crate::export::error::{ExportError, Result};
use crate::settings::types::Quality;

/// Raster formats offered for download/share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

fn to_image(artifact: &ImageArtifact) -> Result<RgbaImage> {
    if artifact.is_empty() {
        return Err(ExportError::EmptyArtifact);
    }
    RgbaImage::from_raw(artifact.width, artifact.height, artifact.rgba.clone()).ok_or_else(|| {
        ExportError::Encode(format!(
            "{} bytes do not fill {}x{}",
            artifact.rgba.len(),
            artifact.width,
            artifact.height
        ))
    })
}

/// Encode RGBA pixels as PNG (lossless, alpha kept).
pub fn encode_png(artifact: &ImageArtifact) -> Result<Vec<u8>> {
    let img = to_image(artifact)?;
    let mut buf = Vec::new();
    img.write_with_encoder(PngEncoder::new(&mut buf))
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Encode as JPEG at `quality` (1-100). Alpha is dropped.
pub fn encode_jpeg(artifact: &ImageArtifact, quality: u8) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(to_image(artifact)?).to_rgb8();
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Serialise a captured image. `quality` only affects lossy formats.
pub fn export(artifact: &ImageArtifact, format: ExportFormat, quality: Quality) -> Result<Vec<u8>> {
    let bytes = match format {
        ExportFormat::Png => encode_png(artifact)?,
        ExportFormat::Jpeg => encode_jpeg(artifact, quality.jpeg_quality())?,
    };
    tracing::debug!(
        "exported {}x{} {} ({} bytes)",
        artifact.width,
        artifact.height,
        format.extension(),
        bytes.len()
    );
    Ok(bytes)
}

/// `data:` URL for share targets that take inline images.
pub fn data_url(bytes: &[u8], format: ExportFormat) -> String {
    format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(bytes))
}

/// `virtual-tryon-<unix-ms>.<ext>`
pub fn default_filename(format: ExportFormat, unix_ms: u64) -> String {
    format!("virtual-tryon-{unix_ms}.{}", format.extension())
}

/// Largest size with the source aspect ratio that fits in the box.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    (
        ((width as f64 * scale).round() as u32).max(1),
        ((height as f64 * scale).round() as u32).max(1),
    )
}

/// Downscale a capture for gallery previews.
///
/// Uses `fast_image_resize` for SIMD-accelerated resizing.
pub fn thumbnail(artifact: &ImageArtifact, max_width: u32, max_height: u32) -> Result<ImageArtifact> {
    use fast_image_resize as fr;
    use fr::images::Image;

    if artifact.is_empty() {
        return Err(ExportError::EmptyArtifact);
    }
    let (tw, th) = fit_within(artifact.width, artifact.height, max_width, max_height);
    if tw == 0 || th == 0 {
        return Err(ExportError::Resize(format!(
            "cannot fit {}x{} into {max_width}x{max_height}",
            artifact.width, artifact.height
        )));
    }

    let src = Image::from_vec_u8(
        artifact.width,
        artifact.height,
        artifact.rgba.clone(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| ExportError::Resize(e.to_string()))?;
    let mut dst = Image::new(tw, th, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(&src, &mut dst, None)
        .map_err(|e| ExportError::Resize(e.to_string()))?;

    Ok(ImageArtifact {
        width: tw,
        height: th,
        rgba: dst.into_vec(),
        captured_at_ms: artifact.captured_at_ms,
    })
}
