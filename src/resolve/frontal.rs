//! Landmark geometry check deciding whether a face is usable for recognition.

use nalgebra::{Point2, Vector2, distance};
use serde::{Deserialize, Serialize};

use crate::resolve::rect::PixelBox;

/// The five keypoints produced by the face detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmarks {
    pub left_eye: Point2<f32>,
    pub right_eye: Point2<f32>,
    pub nose: Point2<f32>,
    pub mouth_left: Point2<f32>,
    pub mouth_right: Point2<f32>,
}

impl Landmarks {
    /// Build from `[[x, y]; 5]` in detector order: left eye, right eye, nose,
    /// mouth-left, mouth-right.
    pub fn from_points(points: [[f32; 2]; 5]) -> Self {
        let p = |i: usize| Point2::new(points[i][0], points[i][1]);
        Self {
            left_eye: p(0),
            right_eye: p(1),
            nose: p(2),
            mouth_left: p(3),
            mouth_right: p(4),
        }
    }

    /// Midpoint between the eyes.
    pub fn eye_mid(&self) -> Point2<f32> {
        nalgebra::center(&self.left_eye, &self.right_eye)
    }

    /// Midpoint between the mouth corners.
    pub fn mouth_mid(&self) -> Point2<f32> {
        nalgebra::center(&self.mouth_left, &self.mouth_right)
    }
}

/// Thresholds for the frontal-pose check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontalPoseConfig {
    /// Largest tolerated tilt of the eye line and of the mouth line, in degrees.
    pub max_roll_degrees: f32,
    /// Exclusive bounds on inter-eye distance over face scale.
    pub eye_ratio: (f32, f32),
    /// Exclusive bounds on eye-to-mouth vertical distance over face scale.
    pub vertical_ratio: (f32, f32),
    /// Minimum nose-to-eyes over nose-to-mouth distance.
    pub min_nose_ratio: f32,
}

impl Default for FrontalPoseConfig {
    fn default() -> Self {
        Self {
            max_roll_degrees: 20.0,
            eye_ratio: (0.25, 0.55),
            vertical_ratio: (0.35, 0.75),
            min_nose_ratio: 0.8,
        }
    }
}

/// Raw geometry the frontal decision is made from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseMeasurements {
    pub eye_angle: f32,
    pub mouth_angle: f32,
    pub eye_ratio: f32,
    pub vertical_ratio: f32,
    pub nose_ratio: f32,
}

impl PoseMeasurements {
    /// Measure a face. Returns `None` when the geometry is degenerate
    /// (empty box or nose sitting on the mouth midpoint).
    pub fn measure(face: &PixelBox, landmarks: &Landmarks) -> Option<Self> {
        let scale = (face.width() as f32 + face.height() as f32) / 2.0;
        if !(scale.is_finite() && scale > 0.0) {
            return None;
        }

        let eye_mid = landmarks.eye_mid();
        let mouth_mid = landmarks.mouth_mid();

        let eye_distance = distance(&landmarks.left_eye, &landmarks.right_eye);
        let face_vertical = distance(&eye_mid, &mouth_mid);

        let nose_to_eyes = distance(&landmarks.nose, &eye_mid);
        let nose_to_mouth = distance(&landmarks.nose, &mouth_mid);
        if nose_to_mouth <= f32::EPSILON {
            return None;
        }

        let measured = Self {
            eye_angle: line_angle(landmarks.right_eye - landmarks.left_eye),
            mouth_angle: line_angle(landmarks.mouth_right - landmarks.mouth_left),
            eye_ratio: eye_distance / scale,
            vertical_ratio: face_vertical / scale,
            nose_ratio: nose_to_eyes / nose_to_mouth,
        };
        measured.is_finite().then_some(measured)
    }

    fn is_finite(&self) -> bool {
        [
            self.eye_angle,
            self.mouth_angle,
            self.eye_ratio,
            self.vertical_ratio,
            self.nose_ratio,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Apply every threshold; all of them must pass.
    pub fn passes(&self, config: &FrontalPoseConfig) -> bool {
        let within = |v: f32, (lo, hi): (f32, f32)| lo < v && v < hi;

        self.eye_angle.abs() <= config.max_roll_degrees
            && self.mouth_angle.abs() <= config.max_roll_degrees
            && within(self.eye_ratio, config.eye_ratio)
            && within(self.vertical_ratio, config.vertical_ratio)
            // a downward tilt pulls the nose toward the mouth
            && self.nose_ratio >= config.min_nose_ratio
    }
}

/// Angle of a line against the horizontal, in degrees.
fn line_angle(v: Vector2<f32>) -> f32 {
    v.y.atan2(v.x).to_degrees()
}

/// Whether the face pose is frontal enough for recognition and attribute
/// estimation.
pub fn is_frontal(face: &PixelBox, landmarks: &Landmarks, config: &FrontalPoseConfig) -> bool {
    PoseMeasurements::measure(face, landmarks).is_some_and(|m| m.passes(config))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 100x100 face with the eye line rotated by `eye_deg` around its midpoint.
    /// Eye distance is `eye_ratio * 100`, mouth midpoint 50px below the eyes,
    /// nose halfway between.
    pub(crate) fn face_with(eye_deg: f32, eye_ratio: f32) -> (PixelBox, Landmarks) {
        let face = PixelBox::from_xyxy(0, 0, 100, 100);
        let half = eye_ratio * 100.0 / 2.0;
        let (s, c) = eye_deg.to_radians().sin_cos();
        let mid = Point2::new(50.0_f32, 30.0);
        let landmarks = Landmarks {
            left_eye: Point2::new(mid.x - half * c, mid.y - half * s),
            right_eye: Point2::new(mid.x + half * c, mid.y + half * s),
            nose: Point2::new(50.0, 55.0),
            mouth_left: Point2::new(35.0, 80.0),
            mouth_right: Point2::new(65.0, 80.0),
        };
        (face, landmarks)
    }

    #[test]
    fn test_ideal_face_is_frontal() {
        let (face, lm) = face_with(0.0, 0.4);
        assert!(is_frontal(&face, &lm, &FrontalPoseConfig::default()));
    }

    #[test]
    fn test_eye_angle_boundary() {
        let config = FrontalPoseConfig::default();
        let (face, lm) = face_with(19.0, 0.4);
        assert!(is_frontal(&face, &lm, &config));
        let (face, lm) = face_with(21.0, 0.4);
        assert!(!is_frontal(&face, &lm, &config));
        let (face, lm) = face_with(-21.0, 0.4);
        assert!(!is_frontal(&face, &lm, &config));
    }

    #[test]
    fn test_eye_ratio_boundary() {
        let config = FrontalPoseConfig::default();
        let (face, lm) = face_with(0.0, 0.24);
        assert!(!is_frontal(&face, &lm, &config));
        let (face, lm) = face_with(0.0, 0.26);
        assert!(is_frontal(&face, &lm, &config));
        let (face, lm) = face_with(0.0, 0.54);
        assert!(is_frontal(&face, &lm, &config));
        let (face, lm) = face_with(0.0, 0.56);
        assert!(!is_frontal(&face, &lm, &config));
    }

    #[test]
    fn test_mouth_angle_rejected() {
        let (face, mut lm) = face_with(0.0, 0.4);
        // 30px wide mouth tilted by 15px around its midpoint: ~26.6 degrees
        lm.mouth_left.y -= 7.5;
        lm.mouth_right.y += 7.5;
        let m = PoseMeasurements::measure(&face, &lm).unwrap();
        assert!((m.vertical_ratio - 0.5).abs() < 1e-4);
        assert!(!is_frontal(&face, &lm, &FrontalPoseConfig::default()));
    }

    /// Tilt the 30px mouth line by `deg` around its midpoint.
    fn tilt_mouth(lm: &mut Landmarks, deg: f32) {
        let mid = lm.mouth_mid();
        let (s, c) = deg.to_radians().sin_cos();
        lm.mouth_left = Point2::new(mid.x - 15.0 * c, mid.y - 15.0 * s);
        lm.mouth_right = Point2::new(mid.x + 15.0 * c, mid.y + 15.0 * s);
    }

    #[test]
    fn test_mouth_angle_boundary() {
        let config = FrontalPoseConfig::default();
        for (deg, frontal) in [(19.0, true), (21.0, false), (-19.0, true), (-21.0, false)] {
            let (face, mut lm) = face_with(0.0, 0.4);
            tilt_mouth(&mut lm, deg);
            let m = PoseMeasurements::measure(&face, &lm).unwrap();
            assert!((m.mouth_angle - deg).abs() < 1e-3);
            assert_eq!(is_frontal(&face, &lm, &config), frontal, "mouth at {deg} degrees");
        }
    }

    /// Move the mouth so the eye-to-mouth distance is `ratio` of the face,
    /// keeping the nose halfway between.
    fn with_vertical_ratio(ratio: f32) -> (PixelBox, Landmarks) {
        let (face, mut lm) = face_with(0.0, 0.4);
        let mouth_y = 30.0 + ratio * 100.0;
        lm.mouth_left.y = mouth_y;
        lm.mouth_right.y = mouth_y;
        lm.nose.y = (30.0 + mouth_y) / 2.0;
        (face, lm)
    }

    #[test]
    fn test_vertical_ratio_boundary() {
        let config = FrontalPoseConfig::default();
        for (ratio, frontal) in [
            (0.34, false),
            (0.36, true),
            (0.74, true),
            (0.76, false),
            (0.30, false),
            (0.80, false),
        ] {
            let (face, lm) = with_vertical_ratio(ratio);
            let m = PoseMeasurements::measure(&face, &lm).unwrap();
            assert!((m.vertical_ratio - ratio).abs() < 1e-4);
            assert_eq!(is_frontal(&face, &lm, &config), frontal, "vertical ratio {ratio}");
        }
    }

    #[test]
    fn test_nose_ratio_boundary() {
        let config = FrontalPoseConfig::default();
        for (ratio, frontal) in [(0.79, false), (0.81, true)] {
            let (face, mut lm) = face_with(0.0, 0.4);
            // eyes at y=30, mouth at y=80; split the 50px so that
            // nose-to-eyes / nose-to-mouth == ratio
            lm.nose.y = 30.0 + 50.0 * ratio / (1.0 + ratio);
            let m = PoseMeasurements::measure(&face, &lm).unwrap();
            assert!((m.nose_ratio - ratio).abs() < 1e-4);
            assert_eq!(is_frontal(&face, &lm, &config), frontal, "nose ratio {ratio}");
        }
    }

    #[test]
    fn test_saturated_face_box_does_not_overflow() {
        let (_, lm) = face_with(0.0, 0.4);
        let huge = PixelBox::new(i32::MIN, i32::MAX, i32::MAX, i32::MIN);
        let m = PoseMeasurements::measure(&huge, &lm).unwrap();
        assert!(m.eye_ratio < 1e-6);
        assert!(!is_frontal(&huge, &lm, &FrontalPoseConfig::default()));
    }

    #[test]
    fn test_nose_near_mouth_rejected() {
        let (face, mut lm) = face_with(0.0, 0.4);
        // nose-to-eyes 40, nose-to-mouth 10
        lm.nose.y = 70.0;
        let m = PoseMeasurements::measure(&face, &lm).unwrap();
        assert!((m.nose_ratio - 4.0).abs() < 1e-4);
        assert!(is_frontal(&face, &lm, &FrontalPoseConfig::default()));

        // nose-to-eyes 15, nose-to-mouth 35
        lm.nose.y = 45.0;
        assert!(!is_frontal(&face, &lm, &FrontalPoseConfig::default()));
    }

    #[test]
    fn test_degenerate_geometry_rejected() {
        let (_, lm) = face_with(0.0, 0.4);
        let empty = PixelBox::from_xyxy(10, 10, 10, 10);
        assert!(PoseMeasurements::measure(&empty, &lm).is_none());
        assert!(!is_frontal(&empty, &lm, &FrontalPoseConfig::default()));

        let (face, mut lm) = face_with(0.0, 0.4);
        lm.nose = lm.mouth_mid();
        assert!(!is_frontal(&face, &lm, &FrontalPoseConfig::default()));
    }

    #[test]
    fn test_mirrored_eyes_rejected() {
        let (face, mut lm) = face_with(0.0, 0.4);
        std::mem::swap(&mut lm.left_eye, &mut lm.right_eye);
        assert!(!is_frontal(&face, &lm, &FrontalPoseConfig::default()));
    }

    #[test]
    fn test_from_points_order() {
        let lm = Landmarks::from_points([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0], [7.0, 8.0], [9.0, 10.0]]);
        assert_eq!(lm.nose, Point2::new(5.0, 6.0));
        assert_eq!(lm.mouth_right, Point2::new(9.0, 10.0));
        assert_eq!(lm.eye_mid(), Point2::new(2.0, 3.0));
    }
}
