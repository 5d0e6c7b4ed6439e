//! Garment layout from a pose. Pure functions, no drawing.

use serde::Serialize;

use crate::pose::{KeypointName, Pose};
use crate::settings::types::StyleSettings;

/// Garment length as a fraction of frame height.
pub const GARMENT_HEIGHT_FRACTION: f32 = 0.45;
/// Hip width relative to shoulder width when the hips are not visible.
pub const HIP_FALLBACK_RATIO: f32 = 0.9;
pub const SLEEVE_CAP_RADIUS_FRACTION: f32 = 0.035;
pub const SLEEVE_WIDTH_FRACTION: f32 = 0.07;
pub const SLEEVE_HEIGHT_FRACTION: f32 = 0.18;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned rectangle, `x0 <= x1`, `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// Torso outline: horizontal top and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trapezoid {
    pub top_y: f32,
    pub bottom_y: f32,
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_left: f32,
    pub bottom_right: f32,
}

impl Trapezoid {
    pub fn top_width(&self) -> f32 {
        self.top_right - self.top_left
    }

    pub fn bottom_width(&self) -> f32 {
        self.bottom_right - self.bottom_left
    }

    /// Horizontal extent at `y`, `None` outside the vertical range.
    pub fn span_at(&self, y: f32) -> Option<(f32, f32)> {
        if y < self.top_y || y >= self.bottom_y {
            return None;
        }
        let t = (y - self.top_y) / (self.bottom_y - self.top_y);
        Some((
            self.top_left + (self.bottom_left - self.top_left) * t,
            self.top_right + (self.bottom_right - self.top_right) * t,
        ))
    }

    pub fn bounds(&self) -> Rect {
        Rect {
            x0: self.top_left.min(self.bottom_left),
            y0: self.top_y,
            x1: self.top_right.max(self.bottom_right),
            y1: self.bottom_y,
        }
    }

    /// Midpoint of the outline, used to probe the blended colour.
    pub fn center(&self) -> Point {
        Point {
            x: (self.top_left + self.top_right + self.bottom_left + self.bottom_right) / 4.0,
            y: (self.top_y + self.bottom_y) / 2.0,
        }
    }
}

/// Shoulder cap plus the rectangle hanging down the outside of the arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sleeve {
    pub cap_center: Point,
    pub cap_radius: f32,
    pub arm: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GarmentGeometry {
    pub torso: Trapezoid,
    pub sleeves: [Sleeve; 2],
    pub shoulder_width: f32,
    pub hip_width: f32,
}

impl GarmentGeometry {
    /// Lay out the garment for `pose` on a `width` x `height` frame.
    ///
    /// Returns `None` when either shoulder is missing or below the pose
    /// confidence threshold. Hips below threshold are ignored and replaced
    /// by a fraction of the shoulder width.
    pub fn compute(
        pose: &Pose,
        width: u32,
        height: u32,
        settings: &StyleSettings,
    ) -> Option<Self> {
        let threshold = settings.pose_confidence_threshold();
        let left = pose.confident(KeypointName::LeftShoulder, threshold)?;
        let right = pose.confident(KeypointName::RightShoulder, threshold)?;

        let (w, h) = (width as f32, height as f32);
        let fit = settings.fit_mode().width_multiplier();

        let shoulder_width = (right.x - left.x).abs();
        let shoulder_y = (left.y + right.y) / 2.0;
        let shoulder_mid_x = (left.x + right.x) / 2.0;

        let hip_width = match (
            pose.confident(KeypointName::LeftHip, threshold),
            pose.confident(KeypointName::RightHip, threshold),
        ) {
            (Some(lh), Some(rh)) => (rh.x - lh.x).abs(),
            _ => shoulder_width * HIP_FALLBACK_RATIO,
        };

        let top_half = shoulder_width * fit / 2.0;
        let bottom_half = hip_width * fit / 2.0;
        let torso = Trapezoid {
            top_y: shoulder_y,
            bottom_y: shoulder_y + h * GARMENT_HEIGHT_FRACTION,
            top_left: shoulder_mid_x - top_half,
            top_right: shoulder_mid_x + top_half,
            bottom_left: shoulder_mid_x - bottom_half,
            bottom_right: shoulder_mid_x + bottom_half,
        };

        let cap_radius = w * SLEEVE_CAP_RADIUS_FRACTION * fit;
        let sleeve_w = w * SLEEVE_WIDTH_FRACTION * fit;
        let sleeve_h = h * SLEEVE_HEIGHT_FRACTION;
        // The arm rectangle sits on the outer side of each shoulder, whichever
        // way the camera mirrors the image.
        let (outer_left, outer_right) = if left.x <= right.x {
            (left, right)
        } else {
            (right, left)
        };
        let sleeve = |x0: f32, x1: f32, at: Point| Sleeve {
            cap_center: at,
            cap_radius,
            arm: Rect {
                x0,
                y0: at.y,
                x1,
                y1: at.y + sleeve_h,
            },
        };
        let sleeves = [
            sleeve(
                outer_left.x - sleeve_w,
                outer_left.x,
                Point {
                    x: outer_left.x,
                    y: outer_left.y,
                },
            ),
            sleeve(
                outer_right.x,
                outer_right.x + sleeve_w,
                Point {
                    x: outer_right.x,
                    y: outer_right.y,
                },
            ),
        ];

        Some(Self {
            torso,
            sleeves,
            shoulder_width,
            hip_width,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Keypoint, ProportionalEstimator};
    use crate::settings::types::{FitMode, SettingsUpdate};

    fn settings(fit: FitMode) -> StyleSettings {
        StyleSettings::from_update(&SettingsUpdate {
            fit_mode: Some(fit),
            ..Default::default()
        })
        .unwrap()
    }

    fn shoulders(left_x: f32, right_x: f32, conf: f32) -> Vec<Keypoint> {
        vec![
            Keypoint::new(KeypointName::LeftShoulder, left_x, 100.0, conf),
            Keypoint::new(KeypointName::RightShoulder, right_x, 100.0, conf),
        ]
    }

    #[test]
    fn missing_shoulder_yields_no_geometry() {
        let pose = Pose::new([Keypoint::new(KeypointName::LeftShoulder, 10.0, 10.0, 0.9)]);
        assert!(GarmentGeometry::compute(&pose, 640, 480, &StyleSettings::default()).is_none());
    }

    #[test]
    fn low_confidence_shoulder_yields_no_geometry() {
        let pose = Pose::new(shoulders(200.0, 400.0, 0.3));
        assert!(GarmentGeometry::compute(&pose, 640, 480, &StyleSettings::default()).is_none());
    }

    #[test]
    fn top_width_grows_with_shoulder_width() {
        let s = StyleSettings::default();
        let mut last = 0.0;
        for half in [20.0, 40.0, 80.0, 160.0] {
            let pose = Pose::new(shoulders(320.0 - half, 320.0 + half, 0.9));
            let g = GarmentGeometry::compute(&pose, 640, 480, &s).unwrap();
            assert!(g.torso.top_width() > last);
            last = g.torso.top_width();
        }
    }

    #[test]
    fn fit_modes_are_ordered() {
        let pose = ProportionalEstimator::pose_for(640, 480);
        let width = |fit| {
            GarmentGeometry::compute(&pose, 640, 480, &settings(fit))
                .unwrap()
                .torso
                .top_width()
        };
        assert!(width(FitMode::Loose) >= width(FitMode::Regular));
        assert!(width(FitMode::Regular) >= width(FitMode::Tight));
    }

    #[test]
    fn hips_fall_back_to_shoulder_fraction() {
        let pose = Pose::new(shoulders(200.0, 400.0, 0.9));
        let g = GarmentGeometry::compute(&pose, 640, 480, &StyleSettings::default()).unwrap();
        assert!((g.hip_width - 180.0).abs() < 1e-3);
        assert!((g.torso.bottom_width() - 180.0).abs() < 1e-3);
    }

    #[test]
    fn bottom_edge_centres_on_shoulders_not_hips() {
        let mut kps = shoulders(200.0, 400.0, 0.9);
        kps.push(Keypoint::new(KeypointName::LeftHip, 100.0, 300.0, 0.9));
        kps.push(Keypoint::new(KeypointName::RightHip, 200.0, 300.0, 0.9));
        let g = GarmentGeometry::compute(&Pose::new(kps), 640, 480, &StyleSettings::default())
            .unwrap();
        let bottom_mid = (g.torso.bottom_left + g.torso.bottom_right) / 2.0;
        assert!((bottom_mid - 300.0).abs() < 1e-3);
        assert!((g.hip_width - 100.0).abs() < 1e-3);
    }

    #[test]
    fn torso_spans_fixed_fraction_of_height() {
        let pose = Pose::new(shoulders(200.0, 400.0, 0.9));
        let g = GarmentGeometry::compute(&pose, 640, 480, &StyleSettings::default()).unwrap();
        assert_eq!(g.torso.top_y, 100.0);
        assert!((g.torso.bottom_y - (100.0 + 480.0 * 0.45)).abs() < 1e-3);
    }

    #[test]
    fn sleeves_hang_outside_the_shoulders() {
        let pose = Pose::new(shoulders(400.0, 200.0, 0.9));
        let g = GarmentGeometry::compute(&pose, 640, 480, &StyleSettings::default()).unwrap();
        assert!(g.sleeves[0].arm.x1 <= 200.0);
        assert!(g.sleeves[1].arm.x0 >= 400.0);
        assert_eq!(g.sleeves[0].cap_center.x, 200.0);
    }

    #[test]
    fn span_at_interpolates_edges() {
        let t = Trapezoid {
            top_y: 0.0,
            bottom_y: 10.0,
            top_left: 0.0,
            top_right: 10.0,
            bottom_left: 2.0,
            bottom_right: 8.0,
        };
        assert_eq!(t.span_at(5.0), Some((1.0, 9.0)));
        assert_eq!(t.span_at(10.0), None);
        assert_eq!(t.span_at(-1.0), None);
    }
}
