//! Body segmentation: a frame-sized subject/background mask.
//!
//! [`EllipseSegmenter`] approximates the subject with one ellipse centred on
//! the frame. Anything implementing [`Segmenter`] can replace it, as long as
//! the mask matches the frame size and decreases away from the subject.

use crate::camera::types::Frame;
use crate::pipeline::error::FrameProcessingError;
use crate::pose::Pose;
use crate::settings::types::Quality;

/// Per-pixel subject likelihood in [0, 1], row-major, same size as the
/// frame it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationMask {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl SegmentationMask {
    /// Wrap precomputed values; `None` when the length does not match.
    pub fn from_values(width: u32, height: u32, values: Vec<f32>) -> Option<Self> {
        (values.len() == width as usize * height as usize).then(|| Self {
            width,
            height,
            values: values.into_iter().map(|v| v.clamp(0.0, 1.0)).collect(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Mask value at a pixel; out-of-bounds pixels are background.
    pub fn value(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.values[y as usize * self.width as usize + x as usize]
    }

    /// Whether the pixel belongs to the subject at `threshold`.
    pub fn is_subject(&self, x: u32, y: u32, threshold: f32) -> bool {
        self.value(x, y) >= threshold
    }

    /// Whether the mask is aligned with `frame`.
    pub fn matches(&self, frame: &Frame) -> bool {
        self.width == frame.width && self.height == frame.height
    }
}

/// Produces a subject mask for a frame.
pub trait Segmenter: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Segment one frame. `quality` selects the mask granularity.
    fn segment(
        &mut self,
        frame: &Frame,
        pose: &Pose,
        quality: Quality,
    ) -> Result<SegmentationMask, FrameProcessingError>;
}

/// Frame-centred elliptical subject approximation.
#[derive(Debug, Clone, Copy)]
pub struct EllipseSegmenter {
    /// Horizontal radius as a fraction of frame width.
    radius_x: f32,
    /// Vertical radius as a fraction of frame height.
    radius_y: f32,
}

impl Default for EllipseSegmenter {
    fn default() -> Self {
        Self {
            radius_x: 0.4,
            radius_y: 0.5,
        }
    }
}

impl EllipseSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask value for the point (`x`, `y`): 1 at the centre, falling to 0
    /// on the ellipse boundary and beyond.
    fn falloff(&self, x: f32, y: f32, width: f32, height: f32) -> f32 {
        let dx = (x - width / 2.0) / (self.radius_x * width);
        let dy = (y - height / 2.0) / (self.radius_y * height);
        (1.0 - (dx * dx + dy * dy)).max(0.0)
    }
}

impl Segmenter for EllipseSegmenter {
    fn name(&self) -> &str {
        "ellipse"
    }

    fn segment(
        &mut self,
        frame: &Frame,
        _pose: &Pose,
        quality: Quality,
    ) -> Result<SegmentationMask, FrameProcessingError> {
        if frame.is_empty() {
            return Err(FrameProcessingError::Segmentation(
                "cannot segment an empty frame".into(),
            ));
        }
        let (w, h) = (frame.width, frame.height);
        let (wf, hf) = (w as f32, h as f32);
        let block = quality.mask_block().max(1);
        let mut values = vec![0.0f32; w as usize * h as usize];

        // Each block takes the value at its own centre.
        for by in (0..h).step_by(block as usize) {
            let y_end = (by + block).min(h);
            let cy = (by + y_end) as f32 / 2.0;
            for bx in (0..w).step_by(block as usize) {
                let x_end = (bx + block).min(w);
                let cx = (bx + x_end) as f32 / 2.0;
                let v = self.falloff(cx, cy, wf, hf);
                for y in by..y_end {
                    let row = y as usize * w as usize;
                    values[row + bx as usize..row + x_end as usize].fill(v);
                }
            }
        }

        Ok(SegmentationMask {
            width: w,
            height: h,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(w: u32, h: u32) -> Frame {
        Frame::filled(w, h, [0, 0, 0, 255], 0)
    }

    fn mask(w: u32, h: u32, quality: Quality) -> SegmentationMask {
        EllipseSegmenter::new()
            .segment(&frame(w, h), &Pose::empty(), quality)
            .unwrap()
    }

    #[test]
    fn mask_matches_frame_dimensions() {
        for quality in [Quality::Low, Quality::Medium, Quality::High] {
            let m = mask(161, 97, quality);
            assert_eq!((m.width(), m.height()), (161, 97));
            assert!(m.matches(&frame(161, 97)));
        }
    }

    #[test]
    fn values_decrease_outward_from_centre() {
        let m = mask(200, 100, Quality::High);
        let row: Vec<f32> = (100..200).map(|x| m.value(x, 50)).collect();
        assert!(row.windows(2).all(|w| w[0] >= w[1]));
        let col: Vec<f32> = (50..100).map(|y| m.value(100, y)).collect();
        assert!(col.windows(2).all(|w| w[0] >= w[1]));
        assert!(m.value(100, 50) > 0.99);
        assert_eq!(m.value(0, 0), 0.0);
    }

    #[test]
    fn coarse_mask_is_still_monotonic_along_centre_row() {
        let m = mask(320, 240, Quality::Low);
        let right: Vec<f32> = (160..320).map(|x| m.value(x, 120)).collect();
        assert!(right.windows(2).all(|w| w[0] >= w[1]));
        let left: Vec<f32> = (0..160).rev().map(|x| m.value(x, 120)).collect();
        assert!(left.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn coarse_mask_is_blocky() {
        let m = mask(64, 64, Quality::Low);
        assert_eq!(m.value(8, 8), m.value(15, 15));
    }

    #[test]
    fn torso_is_subject_at_default_threshold() {
        let m = mask(640, 480, Quality::Medium);
        assert!(m.is_subject(320, 252, 0.5));
        assert!(!m.is_subject(5, 5, 0.5));
    }

    #[test]
    fn out_of_bounds_is_background() {
        let m = mask(10, 10, Quality::High);
        assert_eq!(m.value(10, 3), 0.0);
    }

    #[test]
    fn empty_frame_is_a_segmentation_error() {
        let result = EllipseSegmenter::new().segment(&frame(0, 0), &Pose::empty(), Quality::High);
        assert!(matches!(result, Err(FrameProcessingError::Segmentation(_))));
    }

    #[test]
    fn from_values_validates_length_and_clamps() {
        assert!(SegmentationMask::from_values(2, 2, vec![0.0; 3]).is_none());
        let m = SegmentationMask::from_values(1, 2, vec![2.0, -1.0]).unwrap();
        assert_eq!(m.value(0, 0), 1.0);
        assert_eq!(m.value(0, 1), 0.0);
    }
}
