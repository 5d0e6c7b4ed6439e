use crate::camera::types::Frame;
use crate::pose::skeleton::{
    KEYPOINT_COLOR, LOW_CONFIDENCE_COLOR, SKELETON_COLOR, SKELETON_CONNECTIONS,
};
use crate::pose::Pose;
use crate::render::color::Rgb;
use crate::render::geometry::Point;
use crate::render::raster::Canvas;

fn rgb(rgba: [u8; 4]) -> Rgb {
    [rgba[0], rgba[1], rgba[2]]
}

/// Marker radius in pixels for a frame of the given width.
pub fn marker_radius(width: u32) -> f32 {
    (width as f32 / 160.0).max(2.0)
}

/// Draw keypoint markers and skeleton bones over a composited frame.
///
/// Bones join pairs that are both confident; markers below `threshold`
/// are drawn in the low-confidence colour.
pub fn draw_pose_overlay(frame: &mut Frame, pose: &Pose, threshold: f32) {
    let radius = marker_radius(frame.width);
    let mut canvas = Canvas::new(frame);

    for (from, to) in SKELETON_CONNECTIONS {
        if let (Some(a), Some(b)) = (pose.confident(from, threshold), pose.confident(to, threshold))
        {
            canvas.draw_line(
                Point { x: a.x, y: a.y },
                Point { x: b.x, y: b.y },
                rgb(SKELETON_COLOR),
                1.0,
            );
        }
    }

    for kp in pose.keypoints() {
        let color = if kp.confidence >= threshold {
            KEYPOINT_COLOR
        } else {
            LOW_CONFIDENCE_COLOR
        };
        canvas.fill_circle(Point { x: kp.x, y: kp.y }, radius, rgb(color), 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Keypoint, KeypointName};

    #[test]
    fn markers_use_confidence_colours() {
        let mut frame = Frame::filled(200, 200, [0, 0, 0, 255], 0);
        let pose = Pose::new([
            Keypoint::new(KeypointName::Nose, 50.5, 50.5, 0.9),
            Keypoint::new(KeypointName::LeftHip, 150.5, 150.5, 0.1),
        ]);
        draw_pose_overlay(&mut frame, &pose, 0.5);
        assert_eq!(frame.pixel(50, 50), Some(KEYPOINT_COLOR));
        assert_eq!(frame.pixel(150, 150), Some(LOW_CONFIDENCE_COLOR));
    }

    #[test]
    fn bones_join_confident_pairs_only() {
        let mut frame = Frame::filled(200, 200, [0, 0, 0, 255], 0);
        let pose = Pose::new([
            Keypoint::new(KeypointName::LeftShoulder, 20.0, 100.0, 0.9),
            Keypoint::new(KeypointName::RightShoulder, 180.0, 100.0, 0.9),
            Keypoint::new(KeypointName::LeftHip, 20.0, 190.0, 0.1),
        ]);
        draw_pose_overlay(&mut frame, &pose, 0.5);
        assert_eq!(frame.pixel(100, 100), Some(SKELETON_COLOR));
        assert_eq!(frame.pixel(20, 150), Some([0, 0, 0, 255]));
    }
}
