use crate::pose::KeypointName;

/// Bone connections drawn by the debug overlay (start, end).
pub const SKELETON_CONNECTIONS: [(KeypointName, KeypointName); 14] = [
    // Face
    (KeypointName::LeftEye, KeypointName::Nose),
    (KeypointName::Nose, KeypointName::RightEye),
    // Upper body
    (KeypointName::LeftShoulder, KeypointName::RightShoulder),
    (KeypointName::LeftShoulder, KeypointName::LeftElbow),
    (KeypointName::LeftElbow, KeypointName::LeftWrist),
    (KeypointName::RightShoulder, KeypointName::RightElbow),
    (KeypointName::RightElbow, KeypointName::RightWrist),
    // Torso
    (KeypointName::LeftShoulder, KeypointName::LeftHip),
    (KeypointName::RightShoulder, KeypointName::RightHip),
    (KeypointName::LeftHip, KeypointName::RightHip),
    // Lower body
    (KeypointName::LeftHip, KeypointName::LeftKnee),
    (KeypointName::LeftKnee, KeypointName::LeftAnkle),
    (KeypointName::RightHip, KeypointName::RightKnee),
    (KeypointName::RightKnee, KeypointName::RightAnkle),
];

/// Marker colour for confident keypoints (RGBA).
pub const KEYPOINT_COLOR: [u8; 4] = [0, 255, 0, 255];

/// Bone colour (RGBA).
pub const SKELETON_COLOR: [u8; 4] = [255, 255, 0, 255];

/// Marker colour for keypoints below the confidence threshold (RGBA).
pub const LOW_CONFIDENCE_COLOR: [u8; 4] = [255, 0, 0, 255];
