use std::collections::VecDeque;

use crate::camera::types::Frame;
use crate::pipeline::error::FrameProcessingError;
use crate::pose::{Keypoint, KeypointName, Pose, PoseEstimator};

/// Placement of one keypoint as fractions of frame width/height.
struct Placement {
    name: KeypointName,
    fx: f32,
    fy: f32,
    confidence: f32,
}

#[rustfmt::skip]
const PLACEMENTS: &[Placement] = &[
    Placement { name: KeypointName::Nose, fx: 0.50, fy: 0.15, confidence: 0.95 },
    Placement { name: KeypointName::LeftEye, fx: 0.47, fy: 0.13, confidence: 0.93 },
    Placement { name: KeypointName::RightEye, fx: 0.53, fy: 0.13, confidence: 0.93 },
    Placement { name: KeypointName::LeftShoulder, fx: 0.35, fy: 0.30, confidence: 0.92 },
    Placement { name: KeypointName::RightShoulder, fx: 0.65, fy: 0.30, confidence: 0.92 },
    Placement { name: KeypointName::LeftElbow, fx: 0.30, fy: 0.45, confidence: 0.88 },
    Placement { name: KeypointName::RightElbow, fx: 0.70, fy: 0.45, confidence: 0.88 },
    Placement { name: KeypointName::LeftWrist, fx: 0.27, fy: 0.60, confidence: 0.85 },
    Placement { name: KeypointName::RightWrist, fx: 0.73, fy: 0.60, confidence: 0.85 },
    Placement { name: KeypointName::LeftHip, fx: 0.40, fy: 0.60, confidence: 0.90 },
    Placement { name: KeypointName::RightHip, fx: 0.60, fy: 0.60, confidence: 0.90 },
    Placement { name: KeypointName::LeftKnee, fx: 0.40, fy: 0.78, confidence: 0.86 },
    Placement { name: KeypointName::RightKnee, fx: 0.60, fy: 0.78, confidence: 0.86 },
    Placement { name: KeypointName::LeftAnkle, fx: 0.40, fy: 0.95, confidence: 0.82 },
    Placement { name: KeypointName::RightAnkle, fx: 0.60, fy: 0.95, confidence: 0.82 },
];

/// Geometric stand-in for a pose model.
///
/// Places the fifteen keypoints at fixed fractions of the frame extents,
/// so the result depends only on the frame dimensions.
#[derive(Debug, Default, Clone)]
pub struct ProportionalEstimator;

impl ProportionalEstimator {
    pub fn new() -> Self {
        Self
    }

    /// The reference pose for a `width` x `height` frame.
    pub fn pose_for(width: u32, height: u32) -> Pose {
        let w = width as f32;
        let h = height as f32;
        Pose::new(
            PLACEMENTS
                .iter()
                .map(|p| Keypoint::new(p.name, p.fx * w, p.fy * h, p.confidence)),
        )
    }
}

impl PoseEstimator for ProportionalEstimator {
    fn name(&self) -> &str {
        "proportional"
    }

    fn estimate(&mut self, frame: &Frame) -> Result<Pose, FrameProcessingError> {
        if frame.is_empty() {
            return Err(FrameProcessingError::Estimation(
                "frame has zero dimensions".to_string(),
            ));
        }
        Ok(Self::pose_for(frame.width, frame.height))
    }
}

const HISTORY_LIMIT: usize = 10;
const SMOOTHING_WINDOW: usize = 3;
const CURRENT_WEIGHT: f32 = 0.7;
const HISTORY_CONFIDENCE_DECAY: f32 = 0.9;

/// Temporal smoothing around any estimator.
///
/// Each keypoint is blended with its mean over the last three poses
/// (0.7 current, 0.3 history). Confidence becomes the larger of the current
/// value and 0.9 times the historical mean, which keeps a landmark alive
/// through a single low-confidence frame.
pub struct SmoothingEstimator<E> {
    inner: E,
    history: VecDeque<Pose>,
}

impl<E: PoseEstimator> SmoothingEstimator<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    /// Forget previous poses, e.g. after the subject leaves the frame.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    fn smooth(&self, raw: &Pose) -> Pose {
        if self.history.len() < SMOOTHING_WINDOW {
            return raw.clone();
        }
        let recent: Vec<&Pose> = self.history.iter().rev().take(SMOOTHING_WINDOW).collect();

        Pose::new(raw.keypoints().iter().map(|kp| {
            let past: Vec<&Keypoint> = recent.iter().filter_map(|p| p.get(kp.name)).collect();
            if past.len() < 2 {
                return *kp;
            }
            let n = past.len() as f32;
            let avg_x = past.iter().map(|p| p.x).sum::<f32>() / n;
            let avg_y = past.iter().map(|p| p.y).sum::<f32>() / n;
            let avg_c = past.iter().map(|p| p.confidence).sum::<f32>() / n;
            Keypoint::new(
                kp.name,
                kp.x * CURRENT_WEIGHT + avg_x * (1.0 - CURRENT_WEIGHT),
                kp.y * CURRENT_WEIGHT + avg_y * (1.0 - CURRENT_WEIGHT),
                kp.confidence.max(avg_c * HISTORY_CONFIDENCE_DECAY),
            )
        }))
    }
}

impl<E: PoseEstimator> PoseEstimator for SmoothingEstimator<E> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn estimate(&mut self, frame: &Frame) -> Result<Pose, FrameProcessingError> {
        let raw = self.inner.estimate(frame)?;
        let smoothed = self.smooth(&raw);
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(raw);
        Ok(smoothed)
    }
}
