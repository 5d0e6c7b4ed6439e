//! Pose estimation: named anatomical keypoints with per-point confidence.
//!
//! The pipeline only depends on the [`PoseEstimator`] trait. The bundled
//! [`ProportionalEstimator`] places keypoints at fixed fractions of the
//! frame and stands in for a learned model; [`SmoothingEstimator`] wraps
//! any estimator with temporal smoothing.

pub mod estimator;
pub mod skeleton;

pub use estimator::{ProportionalEstimator, SmoothingEstimator};

use serde::Serialize;

use crate::camera::types::Frame;
use crate::pipeline::error::FrameProcessingError;

/// The fifteen tracked landmarks, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeypointName {
    Nose,
    LeftEye,
    RightEye,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl KeypointName {
    pub const ALL: [KeypointName; 15] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    /// Position in [`KeypointName::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// camelCase identifier, as used on the wire.
    pub fn as_id_str(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "leftEye",
            Self::RightEye => "rightEye",
            Self::LeftShoulder => "leftShoulder",
            Self::RightShoulder => "rightShoulder",
            Self::LeftElbow => "leftElbow",
            Self::RightElbow => "rightElbow",
            Self::LeftWrist => "leftWrist",
            Self::RightWrist => "rightWrist",
            Self::LeftHip => "leftHip",
            Self::RightHip => "rightHip",
            Self::LeftKnee => "leftKnee",
            Self::RightKnee => "rightKnee",
            Self::LeftAnkle => "leftAnkle",
            Self::RightAnkle => "rightAnkle",
        }
    }
}

/// A named, confidence-scored 2D landmark in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Keypoint {
    pub name: KeypointName,
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(name: KeypointName, x: f32, y: f32, confidence: f32) -> Self {
        Self {
            name,
            x,
            y,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// The full set of keypoints for one frame plus an overall confidence.
///
/// Produced fresh each iteration and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pose {
    keypoints: Vec<Keypoint>,
    confidence: f32,
}

impl Pose {
    /// Build a pose from keypoints in any order.
    ///
    /// Keypoints are stored in canonical order; duplicates keep the last
    /// occurrence. The overall confidence is the mean over all fifteen
    /// landmarks, counting missing ones as zero.
    pub fn new(keypoints: impl IntoIterator<Item = Keypoint>) -> Self {
        let mut slots: [Option<Keypoint>; 15] = [None; 15];
        for kp in keypoints {
            slots[kp.name.index()] = Some(kp);
        }
        let keypoints: Vec<Keypoint> = slots.into_iter().flatten().collect();
        let confidence =
            keypoints.iter().map(|kp| kp.confidence).sum::<f32>() / KeypointName::ALL.len() as f32;
        Self {
            keypoints,
            confidence,
        }
    }

    /// A pose with no keypoints.
    pub fn empty() -> Self {
        Self {
            keypoints: Vec::new(),
            confidence: 0.0,
        }
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Look up a keypoint regardless of its confidence.
    pub fn get(&self, name: KeypointName) -> Option<&Keypoint> {
        self.keypoints.iter().find(|kp| kp.name == name)
    }

    /// Look up a keypoint, treating it as absent below `threshold`.
    pub fn confident(&self, name: KeypointName, threshold: f32) -> Option<&Keypoint> {
        self.get(name).filter(|kp| kp.confidence >= threshold)
    }

    /// Rough stability score in [0, 1] derived from mean confidence.
    pub fn stability(&self) -> f32 {
        (self.confidence * 1.2).min(1.0)
    }

    /// Whether every keypoint lies inside `[0, width] x [0, height]`.
    pub fn within_bounds(&self, width: u32, height: u32) -> bool {
        self.keypoints.iter().all(|kp| {
            kp.x >= 0.0 && kp.y >= 0.0 && kp.x <= width as f32 && kp.y <= height as f32
        })
    }
}

/// Maps a frame to a pose.
///
/// Implementations may be deterministic in the frame dimensions or depend
/// on pixel content; callers must not assume either.
pub trait PoseEstimator: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Estimate the pose for one frame.
    fn estimate(&mut self, frame: &Frame) -> Result<Pose, FrameProcessingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_orders_keypoints_canonically() {
        let pose = Pose::new([
            Keypoint::new(KeypointName::RightShoulder, 2.0, 1.0, 0.9),
            Keypoint::new(KeypointName::Nose, 1.0, 0.0, 0.9),
        ]);
        let names: Vec<_> = pose.keypoints().iter().map(|kp| kp.name).collect();
        assert_eq!(names, vec![KeypointName::Nose, KeypointName::RightShoulder]);
    }

    #[test]
    fn confidence_is_clamped() {
        let kp = Keypoint::new(KeypointName::Nose, 0.0, 0.0, 1.7);
        assert_eq!(kp.confidence, 1.0);
    }

    #[test]
    fn low_confidence_keypoint_is_absent() {
        let pose = Pose::new([Keypoint::new(KeypointName::LeftHip, 5.0, 5.0, 0.3)]);
        assert!(pose.get(KeypointName::LeftHip).is_some());
        assert!(pose.confident(KeypointName::LeftHip, 0.5).is_none());
        assert!(pose.confident(KeypointName::LeftHip, 0.3).is_some());
    }

    #[test]
    fn overall_confidence_counts_missing_as_zero() {
        let pose = Pose::new(
            KeypointName::ALL
                .iter()
                .take(5)
                .map(|&n| Keypoint::new(n, 0.0, 0.0, 0.9)),
        );
        assert!((pose.confidence() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn stability_saturates() {
        let pose = Pose::new(
            KeypointName::ALL
                .iter()
                .map(|&n| Keypoint::new(n, 0.0, 0.0, 0.95)),
        );
        assert_eq!(pose.stability(), 1.0);
    }

    #[test]
    fn keypoint_names_serialise_camel_case() {
        let json = serde_json::to_value(KeypointName::LeftShoulder).unwrap();
        assert_eq!(json, "leftShoulder");
        assert_eq!(KeypointName::LeftShoulder.as_id_str(), "leftShoulder");
    }

    #[test]
    fn index_matches_canonical_order() {
        for (i, name) in KeypointName::ALL.iter().enumerate() {
            assert_eq!(name.index(), i);
        }
    }
}
