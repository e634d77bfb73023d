//! Pipeline configuration.
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! max_recognition_attempts = 5
//! rehydrate_identities = true
//!
//! [frontal]
//! max_roll_degrees = 15.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
pub use crate::resolve::FrontalPoseConfig;

/// Configuration for [`FrameOrchestrator`](crate::FrameOrchestrator).
///
/// Every field is optional in TOML and falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Failed frontal recognitions before a track becomes unknown.
    pub max_recognition_attempts: u32,
    /// Confidence threshold handed to the face detector.
    pub face_detection_threshold: f32,
    /// Object detections below this confidence are dropped before tracking.
    pub min_detection_confidence: f32,
    /// A face crop whose clamped width or height is at most this many pixels
    /// is too small for attribute estimation.
    pub min_face_crop: u32,
    /// Write every object detection through the gateway.
    pub log_object_detections: bool,
    /// Look up unseen track ids in the gateway before treating them as new.
    pub rehydrate_identities: bool,
    /// Forget identities of tracks the tracker has not reported for more than
    /// this many frames. `None` keeps them forever.
    pub stale_track_frames: Option<u64>,
    /// Thresholds for the frontal-pose check.
    pub frontal: FrontalPoseConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_recognition_attempts: 3,
            face_detection_threshold: 0.8,
            min_detection_confidence: 0.5,
            min_face_crop: 10,
            log_object_detections: true,
            rehydrate_identities: false,
            // well past the tracker's own max_age of 70 frames
            stale_track_frames: Some(150),
            frontal: FrontalPoseConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.max_recognition_attempts == 0 {
            return invalid("max_recognition_attempts must be at least 1".into());
        }
        for (name, v) in [
            ("face_detection_threshold", self.face_detection_threshold),
            ("min_detection_confidence", self.min_detection_confidence),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return invalid(format!("{name} must be within [0, 1], got {v}"));
            }
        }

        let f = &self.frontal;
        if !(f.max_roll_degrees > 0.0 && f.max_roll_degrees <= 90.0) {
            return invalid(format!(
                "frontal.max_roll_degrees must be within (0, 90], got {}",
                f.max_roll_degrees
            ));
        }
        for (name, (lo, hi)) in [
            ("frontal.eye_ratio", f.eye_ratio),
            ("frontal.vertical_ratio", f.vertical_ratio),
        ] {
            if !(lo >= 0.0 && lo < hi) {
                return invalid(format!("{name} needs 0 <= low < high, got ({lo}, {hi})"));
            }
        }
        if !(f.min_nose_ratio >= 0.0) {
            return invalid(format!(
                "frontal.min_nose_ratio must be non-negative, got {}",
                f.min_nose_ratio
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_recognition_attempts, 3);
        assert_eq!(config.frontal.eye_ratio, (0.25, 0.55));
    }

    #[test]
    fn test_partial_toml() {
        let config = PipelineConfig::from_toml_str(
            r#"
            max_recognition_attempts = 5
            stale_track_frames = 30

            [frontal]
            max_roll_degrees = 15.0
            "#,
        )
        .unwrap();
        assert_eq!(config.max_recognition_attempts, 5);
        assert_eq!(config.stale_track_frames, Some(30));
        assert_eq!(config.frontal.max_roll_degrees, 15.0);
        assert_eq!(config.frontal.min_nose_ratio, 0.8);
        assert_eq!(config.min_face_crop, 10);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = PipelineConfig::from_toml_str("max_recognition_attempts = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = PipelineConfig::from_toml_str("min_detection_confidence = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = PipelineConfig::from_toml_str("[frontal]\neye_ratio = [0.6, 0.3]").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_syntax() {
        let err = PipelineConfig::from_toml_str("max_recognition_attempts = \"three\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PipelineConfig::load("/nonexistent/facetrack.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
