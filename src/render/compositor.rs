use std::sync::Arc;

use image::RgbaImage;

use crate::camera::types::Frame;
use crate::pipeline::error::FrameProcessingError;
use crate::pose::Pose;
use crate::render::color::{hsl_to_rgb, lerp, shade, Rgb};
use crate::render::garment::GarmentDescriptor;
use crate::render::geometry::{GarmentGeometry, Rect};
use crate::render::raster::Canvas;
use crate::segment::SegmentationMask;
use crate::settings::types::StyleSettings;

/// Sleeves stay near-opaque regardless of the overlay opacity.
pub const SLEEVE_ALPHA: f32 = 0.9;

const HUE_SATURATION: f32 = 0.7;
const HUE_LIGHTNESS_TOP: f32 = 0.5;
const HUE_LIGHTNESS_BOTTOM: f32 = 0.35;
const FLAT_HEM_SHADE: f32 = 0.8;

/// What the compositor did with one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum CompositeOutcome {
    /// The garment was drawn with this layout.
    Drawn(GarmentGeometry),
    /// Shoulders missing or unconfident: the frame is untouched.
    SkippedNoShoulders,
}

/// Torso fill source.
enum Fill {
    Gradient { top: Rgb, bottom: Rgb },
    Texture(Arc<RgbaImage>),
}

impl Fill {
    /// Hue wins over everything, then the garment's own image or colour,
    /// then its category palette.
    fn resolve(garment: &GarmentDescriptor, settings: &StyleSettings) -> Self {
        if let Some(hue) = settings.hue() {
            return Self::Gradient {
                top: hsl_to_rgb(hue, HUE_SATURATION, HUE_LIGHTNESS_TOP),
                bottom: hsl_to_rgb(hue, HUE_SATURATION, HUE_LIGHTNESS_BOTTOM),
            };
        }
        if let Some(image) = garment.usable_image() {
            return Self::Texture(Arc::clone(image));
        }
        if let Some(color) = garment.color {
            return Self::Gradient {
                top: color,
                bottom: shade(color, FLAT_HEM_SHADE),
            };
        }
        let (top, bottom) = garment.category.palette();
        Self::Gradient { top, bottom }
    }

    /// Solid colour for the sleeves: the collar colour, or the texture's
    /// centre pixel.
    fn sleeve_color(&self) -> Rgb {
        match self {
            Self::Gradient { top, .. } => *top,
            Self::Texture(img) => {
                let p = img.get_pixel(img.width() / 2, img.height() / 2);
                [p[0], p[1], p[2]]
            }
        }
    }

    fn color_at(&self, x: u32, y: u32, bounds: &Rect) -> Rgb {
        let height = (bounds.y1 - bounds.y0).max(1.0);
        let ty = ((y as f32 + 0.5 - bounds.y0) / height).clamp(0.0, 1.0);
        match self {
            Self::Gradient { top, bottom } => lerp(*top, *bottom, ty),
            Self::Texture(img) => {
                let width = (bounds.x1 - bounds.x0).max(1.0);
                let tx = ((x as f32 + 0.5 - bounds.x0) / width).clamp(0.0, 1.0);
                let sx = ((tx * img.width() as f32) as u32).min(img.width() - 1);
                let sy = ((ty * img.height() as f32) as u32).min(img.height() - 1);
                let p = img.get_pixel(sx, sy);
                [p[0], p[1], p[2]]
            }
        }
    }
}

/// Draws the selected garment over the subject.
#[derive(Debug, Clone, Copy)]
pub struct Compositor {
    sleeve_alpha: f32,
}

impl Default for Compositor {
    fn default() -> Self {
        Self {
            sleeve_alpha: SLEEVE_ALPHA,
        }
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composite `garment` onto `frame` in place.
    ///
    /// Torso pixels blend at the overlay opacity, sleeves at a fixed alpha.
    /// With a mask, pixels under `segmentationThreshold` are left alone.
    pub fn composite(
        &self,
        frame: &mut Frame,
        pose: &Pose,
        mask: Option<&SegmentationMask>,
        garment: &GarmentDescriptor,
        settings: &StyleSettings,
    ) -> Result<CompositeOutcome, FrameProcessingError> {
        if !frame.is_well_formed() {
            return Err(FrameProcessingError::Composite(format!(
                "frame buffer is {} bytes for {}x{}",
                frame.data.len(),
                frame.width,
                frame.height
            )));
        }
        if let Some(mask) = mask {
            if !mask.matches(frame) {
                return Err(FrameProcessingError::DimensionMismatch {
                    frame_width: frame.width,
                    frame_height: frame.height,
                    mask_width: mask.width(),
                    mask_height: mask.height(),
                });
            }
        }

        let Some(geometry) = GarmentGeometry::compute(pose, frame.width, frame.height, settings)
        else {
            tracing::trace!("Shoulders not confident, garment skipped");
            return Ok(CompositeOutcome::SkippedNoShoulders);
        };

        let fill = Fill::resolve(garment, settings);
        let bounds = geometry.torso.bounds();
        let mut canvas = Canvas::new(frame);
        if let Some(mask) = mask {
            canvas = canvas.with_mask(mask, settings.segmentation_threshold());
        }

        canvas.fill_trapezoid(&geometry.torso, settings.overlay_opacity(), |x, y| {
            fill.color_at(x, y, &bounds)
        });

        let sleeve_color = fill.sleeve_color();
        for sleeve in &geometry.sleeves {
            canvas.fill_circle(
                sleeve.cap_center,
                sleeve.cap_radius,
                sleeve_color,
                self.sleeve_alpha,
            );
            canvas.fill_rect(&sleeve.arm, sleeve_color, self.sleeve_alpha);
        }

        Ok(CompositeOutcome::Drawn(geometry))
    }
}
