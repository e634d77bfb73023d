//! One-shot age, gender and emotion estimation per track.

use tracing::debug;

use crate::error::{BoxError, FaceError};
use crate::integration::{AgeEstimator, EmotionEstimator, Frame, GenderEstimator};
use crate::resolve::identity::{Attributes, IdentityState, TrackId};
use crate::resolve::rect::PixelBox;

/// The configured attribute estimators. Any of them may be absent.
#[derive(Default)]
pub struct AttributeEstimators {
    pub age: Option<Box<dyn AgeEstimator>>,
    pub gender: Option<Box<dyn GenderEstimator>>,
    pub emotion: Option<Box<dyn EmotionEstimator>>,
}

impl AttributeEstimators {
    /// No estimators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the age estimator.
    pub fn with_age(mut self, estimator: impl AgeEstimator + 'static) -> Self {
        self.age = Some(Box::new(estimator));
        self
    }

    /// Set the gender estimator.
    pub fn with_gender(mut self, estimator: impl GenderEstimator + 'static) -> Self {
        self.gender = Some(Box::new(estimator));
        self
    }

    /// Set the emotion estimator.
    pub fn with_emotion(mut self, estimator: impl EmotionEstimator + 'static) -> Self {
        self.emotion = Some(Box::new(estimator));
        self
    }

    /// Whether no estimator is configured.
    pub fn is_empty(&self) -> bool {
        self.age.is_none() && self.gender.is_none() && self.emotion.is_none()
    }
}

impl std::fmt::Debug for AttributeEstimators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeEstimators")
            .field("age", &self.age.is_some())
            .field("gender", &self.gender.is_some())
            .field("emotion", &self.emotion.is_some())
            .finish()
    }
}

/// What the attribute pass did with a track this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeStep {
    /// Attributes were set on an earlier frame; estimators not called.
    AlreadyPresent,
    NotFrontal,
    /// Clamped crop too small; retried on a later frontal frame.
    DegenerateCrop,
    /// No estimator configured.
    Unavailable,
    Computed,
}

/// Runs the configured estimators on a track's first usable frontal face.
#[derive(Debug)]
pub struct AttributeResolver {
    estimators: AttributeEstimators,
    min_crop: u32,
}

impl AttributeResolver {
    /// A crop whose clamped width or height is `<= min_crop` is skipped.
    pub fn new(estimators: AttributeEstimators, min_crop: u32) -> Self {
        Self {
            estimators,
            min_crop,
        }
    }

    /// Fill `state`'s attributes from the face crop, at most once.
    ///
    /// All configured estimators must succeed; on any failure `state` is left
    /// unchanged and the error is returned.
    pub fn resolve(
        &mut self,
        state: &mut IdentityState,
        is_frontal: bool,
        frame: &Frame<'_>,
        face: &PixelBox,
        track_id: TrackId,
    ) -> Result<AttributeStep, FaceError> {
        if state.attributes().is_some() {
            return Ok(AttributeStep::AlreadyPresent);
        }
        if !is_frontal {
            return Ok(AttributeStep::NotFrontal);
        }
        if self.estimators.is_empty() {
            return Ok(AttributeStep::Unavailable);
        }
        let Some(crop) = frame.crop(face, self.min_crop) else {
            debug!(%track_id, ?face, "face crop too small for attribute estimation");
            return Ok(AttributeStep::DegenerateCrop);
        };

        let estimator_error = move |attribute: &'static str| {
            move |source: BoxError| FaceError::Estimator {
                track_id,
                attribute,
                source,
            }
        };

        let est = &mut self.estimators;
        let age = est
            .age
            .as_mut()
            .map(|e| e.estimate_age(&crop))
            .transpose()
            .map_err(estimator_error("age"))?;
        let gender = est
            .gender
            .as_mut()
            .map(|e| e.estimate_gender(&crop))
            .transpose()
            .map_err(estimator_error("gender"))?;
        let emotion = est
            .emotion
            .as_mut()
            .map(|e| e.estimate_emotion(&crop))
            .transpose()
            .map_err(estimator_error("emotion"))?;

        state.set_attributes(Attributes {
            age,
            gender,
            emotion,
        });
        Ok(AttributeStep::Computed)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use ndarray::Array3;

    use super::*;
    use crate::integration::FaceCrop;
    use crate::resolve::identity::{Emotion, Gender};

    struct CountingAge {
        calls: Rc<Cell<u32>>,
        age: u32,
    }

    impl AgeEstimator for CountingAge {
        fn estimate_age(&mut self, _face: &FaceCrop) -> Result<u32, BoxError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.age)
        }
    }

    struct FixedGender(Gender);

    impl GenderEstimator for FixedGender {
        fn estimate_gender(&mut self, _face: &FaceCrop) -> Result<Gender, BoxError> {
            Ok(self.0)
        }
    }

    struct BrokenEmotion;

    impl EmotionEstimator for BrokenEmotion {
        fn estimate_emotion(&mut self, _face: &FaceCrop) -> Result<Emotion, BoxError> {
            Err("emotion model unavailable".into())
        }
    }

    fn blank(width: usize, height: usize) -> Array3<u8> {
        Array3::zeros((height, width, 3))
    }

    fn face() -> PixelBox {
        PixelBox::from_xyxy(10, 10, 60, 70)
    }

    #[test]
    fn test_computes_once() {
        let pixels = blank(100, 100);
        let frame = Frame::new(pixels.view());
        let calls = Rc::new(Cell::new(0));
        let estimators = AttributeEstimators::new()
            .with_age(CountingAge {
                calls: calls.clone(),
                age: 34,
            })
            .with_gender(FixedGender(Gender::Man));
        let mut resolver = AttributeResolver::new(estimators, 10);
        let mut state = IdentityState::new();

        let step = resolver
            .resolve(&mut state, true, &frame, &face(), TrackId(1))
            .unwrap();
        assert_eq!(step, AttributeStep::Computed);
        let attrs = *state.attributes().unwrap();
        assert_eq!(attrs.age, Some(34));
        assert_eq!(attrs.gender, Some(Gender::Man));
        assert_eq!(attrs.emotion, None);

        let step = resolver
            .resolve(&mut state, true, &frame, &face(), TrackId(1))
            .unwrap();
        assert_eq!(step, AttributeStep::AlreadyPresent);
        assert_eq!(calls.get(), 1);
        assert_eq!(state.attributes(), Some(&attrs));
    }

    #[test]
    fn test_not_frontal_skips() {
        let pixels = blank(100, 100);
        let frame = Frame::new(pixels.view());
        let calls = Rc::new(Cell::new(0));
        let estimators = AttributeEstimators::new().with_age(CountingAge {
            calls: calls.clone(),
            age: 20,
        });
        let mut resolver = AttributeResolver::new(estimators, 10);
        let mut state = IdentityState::new();

        let step = resolver
            .resolve(&mut state, false, &frame, &face(), TrackId(1))
            .unwrap();
        assert_eq!(step, AttributeStep::NotFrontal);
        assert_eq!(calls.get(), 0);
        assert!(state.attributes().is_none());
    }

    #[test]
    fn test_degenerate_crop_retried_later() {
        let pixels = blank(100, 100);
        let frame = Frame::new(pixels.view());
        let calls = Rc::new(Cell::new(0));
        let estimators = AttributeEstimators::new().with_age(CountingAge {
            calls: calls.clone(),
            age: 20,
        });
        let mut resolver = AttributeResolver::new(estimators, 10);
        let mut state = IdentityState::new();

        // mostly off the right edge: clamps to 5px wide
        let edge = PixelBox::from_xyxy(95, 10, 160, 70);
        let step = resolver
            .resolve(&mut state, true, &frame, &edge, TrackId(1))
            .unwrap();
        assert_eq!(step, AttributeStep::DegenerateCrop);
        assert!(state.attributes().is_none());

        let step = resolver
            .resolve(&mut state, true, &frame, &face(), TrackId(1))
            .unwrap();
        assert_eq!(step, AttributeStep::Computed);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_failure_leaves_state() {
        let pixels = blank(100, 100);
        let frame = Frame::new(pixels.view());
        let estimators = AttributeEstimators::new()
            .with_gender(FixedGender(Gender::Woman))
            .with_emotion(BrokenEmotion);
        let mut resolver = AttributeResolver::new(estimators, 10);
        let mut state = IdentityState::new();

        let err = resolver
            .resolve(&mut state, true, &frame, &face(), TrackId(9))
            .unwrap_err();
        assert!(matches!(
            err,
            FaceError::Estimator {
                attribute: "emotion",
                track_id: TrackId(9),
                ..
            }
        ));
        assert!(state.attributes().is_none());
    }

    #[test]
    fn test_no_estimators() {
        let pixels = blank(100, 100);
        let frame = Frame::new(pixels.view());
        let mut resolver = AttributeResolver::new(AttributeEstimators::new(), 10);
        let mut state = IdentityState::new();

        let step = resolver
            .resolve(&mut state, true, &frame, &face(), TrackId(1))
            .unwrap();
        assert_eq!(step, AttributeStep::Unavailable);
        assert!(state.attributes().is_none());
    }
}
