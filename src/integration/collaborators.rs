//! Traits for the external models the pipeline drives.
//!
//! Implement these to connect concrete detectors, trackers and estimators.
//! All of them are called synchronously, once per frame or once per face.

use ndarray::{Array1, Array2, Array3, Axis};

use crate::error::{BoxError, OutputShapeError};
use crate::integration::catalog::KnownCatalog;
use crate::integration::frame::{FaceCrop, Frame};
use crate::resolve::{Emotion, Gender, Landmarks, PixelBox, Recognition, Rect, TrackId};

/// One object detector output.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDetection {
    /// Box in TLWH format
    pub bbox: Rect,
    pub confidence: f32,
    pub class_id: u32,
}

/// Trait for object detection backends.
///
/// # Example
///
/// ```ignore
/// use facetrack_rs::integration::{Frame, ObjectDetection, ObjectDetector};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl ObjectDetector for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, frame: &Frame<'_>) -> Result<Vec<ObjectDetection>, Self::Error> {
///         // Run inference and return detections
///         Ok(vec![])
///     }
/// }
/// ```
pub trait ObjectDetector {
    type Error: std::error::Error + Send + Sync + 'static;

    fn detect(&mut self, frame: &Frame<'_>) -> Result<Vec<ObjectDetection>, Self::Error>;
}

/// A live track as reported by the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObject {
    pub track_id: TrackId,
    /// Body box; the tracker reports TLBR, stored here as a [`Rect`]
    pub bbox: Rect,
    pub class_id: u32,
}

/// Appearance-based multi-object tracker.
///
/// Stateful across calls and owns the track lifecycle. Called exactly once
/// per frame, in capture order. Returned tracks keep the tracker's order,
/// which decides ties during face association.
pub trait Tracker {
    type Error: std::error::Error + Send + Sync + 'static;

    fn update(
        &mut self,
        detections: &[ObjectDetection],
        frame: &Frame<'_>,
    ) -> Result<Vec<TrackedObject>, Self::Error>;
}

/// Raw face detector output.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDetections {
    /// `[N, 4]` boxes as (x1, y1, x2, y2)
    pub boxes: Array2<f32>,
    /// `[M, 5, 2]` keypoints for the first `M <= N` faces
    pub landmarks: Option<Array3<f32>>,
}

impl FaceDetections {
    /// No faces.
    pub fn empty() -> Self {
        Self {
            boxes: Array2::zeros((0, 4)),
            landmarks: None,
        }
    }

    /// Split into one observation per face.
    ///
    /// A wrong array layout fails the whole output. A row with a non-finite
    /// coordinate fails only that face. Faces beyond the landmark rows get no
    /// landmarks.
    pub fn observations(
        &self,
    ) -> Result<Vec<Result<FaceObservation, OutputShapeError>>, OutputShapeError> {
        let (faces, cols) = self.boxes.dim();
        if cols != 4 {
            return Err(OutputShapeError::FaceBoxes(self.boxes.shape().to_vec()));
        }
        if let Some(lm) = &self.landmarks {
            let (rows, points, coords) = lm.dim();
            if rows > faces || points != 5 || coords != 2 {
                return Err(OutputShapeError::Landmarks {
                    faces,
                    shape: lm.shape().to_vec(),
                });
            }
        }

        Ok((0..faces).map(|index| self.observation(index)).collect())
    }

    fn observation(&self, index: usize) -> Result<FaceObservation, OutputShapeError> {
        let row = self.boxes.index_axis(Axis(0), index);
        if row.iter().any(|v| !v.is_finite()) {
            return Err(OutputShapeError::NonFinite { index });
        }
        let face_box = PixelBox::from_xyxy(row[0] as i32, row[1] as i32, row[2] as i32, row[3] as i32);

        let landmarks = match &self.landmarks {
            Some(lm) if index < lm.dim().0 => {
                let p = lm.index_axis(Axis(0), index);
                if p.iter().any(|v| !v.is_finite()) {
                    return Err(OutputShapeError::NonFinite { index });
                }
                let mut points = [[0.0; 2]; 5];
                for (k, point) in points.iter_mut().enumerate() {
                    *point = [p[[k, 0]], p[[k, 1]]];
                }
                Some(Landmarks::from_points(points))
            }
            _ => None,
        };
        Ok(FaceObservation {
            face_box,
            landmarks,
        })
    }
}

/// One detected face in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceObservation {
    pub face_box: PixelBox,
    pub landmarks: Option<Landmarks>,
}

/// Trait for face detection backends.
///
/// Faces scoring below `threshold` should not be returned.
pub trait FaceDetector {
    type Error: std::error::Error + Send + Sync + 'static;

    fn detect(&mut self, frame: &Frame<'_>, threshold: f32) -> Result<FaceDetections, Self::Error>;
}

/// Matches a face against the known-identity catalog.
///
/// Implementations whose backend answers `(name, role)` with `"unknown"` for
/// no match can use [`Recognition::from_label`].
pub trait FaceRecognizer {
    type Error: std::error::Error + Send + Sync + 'static;

    fn recognize(
        &mut self,
        frame: &Frame<'_>,
        face: &PixelBox,
        catalog: &KnownCatalog,
    ) -> Result<Recognition, Self::Error>;
}

/// Computes a face embedding. `Ok(None)` when no face could be encoded.
pub trait FaceEncoder {
    type Error: std::error::Error + Send + Sync + 'static;

    fn encode(&mut self, frame: &Frame<'_>, face: &PixelBox)
    -> Result<Option<Array1<f64>>, Self::Error>;
}

/// Estimates age in years from a face crop.
pub trait AgeEstimator {
    fn estimate_age(&mut self, face: &FaceCrop) -> Result<u32, BoxError>;
}

/// Estimates gender from a face crop.
pub trait GenderEstimator {
    fn estimate_gender(&mut self, face: &FaceCrop) -> Result<Gender, BoxError>;
}

/// Classifies the facial expression of a face crop.
pub trait EmotionEstimator {
    fn estimate_emotion(&mut self, face: &FaceCrop) -> Result<Emotion, BoxError>;
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn test_observations_with_partial_landmarks() {
        let detections = FaceDetections {
            boxes: array![[10.2, 20.9, 50.0, 70.0], [100.0, 100.0, 140.0, 150.0]],
            landmarks: Some(
                Array3::from_shape_vec(
                    (1, 5, 2),
                    vec![20.0, 35.0, 40.0, 35.0, 30.0, 45.0, 22.0, 58.0, 38.0, 58.0],
                )
                .unwrap(),
            ),
        };

        let faces: Vec<_> = detections
            .observations()
            .unwrap()
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].face_box, PixelBox::from_xyxy(10, 20, 50, 70));
        let lm = faces[0].landmarks.unwrap();
        assert_eq!(lm.right_eye.x, 40.0);
        assert_eq!(lm.mouth_left.y, 58.0);
        assert!(faces[1].landmarks.is_none());
    }

    #[test]
    fn test_empty_detections() {
        assert!(FaceDetections::empty().observations().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_shapes() {
        let detections = FaceDetections {
            boxes: Array2::zeros((2, 3)),
            landmarks: None,
        };
        assert_eq!(
            detections.observations().unwrap_err(),
            OutputShapeError::FaceBoxes(vec![2, 3])
        );

        let detections = FaceDetections {
            boxes: Array2::zeros((1, 4)),
            landmarks: Some(Array3::zeros((2, 5, 2))),
        };
        assert!(matches!(
            detections.observations().unwrap_err(),
            OutputShapeError::Landmarks { faces: 1, .. }
        ));
    }

    #[test]
    fn test_non_finite_fails_only_that_face() {
        let detections = FaceDetections {
            boxes: array![
                [0.0, 0.0, 10.0, 10.0],
                [f32::NAN, 0.0, 10.0, 10.0],
                [20.0, 0.0, 30.0, 10.0]
            ],
            landmarks: Some(
                Array3::from_shape_vec(
                    (3, 5, 2),
                    (0..30)
                        .map(|i| if i == 25 { f32::INFINITY } else { i as f32 })
                        .collect(),
                )
                .unwrap(),
            ),
        };
        let faces = detections.observations().unwrap();
        assert_eq!(faces.len(), 3);
        assert_eq!(faces[0].as_ref().unwrap().face_box, PixelBox::from_xyxy(0, 0, 10, 10));
        assert_eq!(faces[1], Err(OutputShapeError::NonFinite { index: 1 }));
        // finite box, infinite keypoint
        assert_eq!(faces[2], Err(OutputShapeError::NonFinite { index: 2 }));
    }
}
