use std::path::PathBuf;

use thiserror::Error;

use crate::resolve::TrackId;

/// Boxed error for collaborators held as trait objects.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A frame-level collaborator failed and the frame was skipped.
///
/// Identity state is left untouched.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("object detector failed: {0}")]
    Detector(#[source] BoxError),
    #[error("tracker update failed: {0}")]
    Tracker(#[source] BoxError),
    #[error("face detector failed: {0}")]
    FaceDetector(#[source] BoxError),
    #[error("malformed face detector output: {0}")]
    MalformedFaces(#[from] OutputShapeError),
}

/// Processing of a single face failed; the face was skipped for this frame.
#[derive(Debug, Error)]
pub enum FaceError {
    #[error("face recognizer failed for track {track_id}: {source}")]
    Recognizer {
        track_id: TrackId,
        #[source]
        source: BoxError,
    },
    #[error("{attribute} estimator failed for track {track_id}: {source}")]
    Estimator {
        track_id: TrackId,
        attribute: &'static str,
        #[source]
        source: BoxError,
    },
}

/// Collaborator output whose array layout does not match its contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputShapeError {
    #[error("face boxes must be [N, 4], got {0:?}")]
    FaceBoxes(Vec<usize>),
    #[error("landmarks must be [M, 5, 2] with M <= {faces}, got {shape:?}")]
    Landmarks { faces: usize, shape: Vec<usize> },
    #[error("non-finite coordinate in face {index}")]
    NonFinite { index: usize },
    #[error("pixel buffer of {len} bytes does not fit {height}x{width}x{channels}")]
    FrameBuffer {
        len: usize,
        width: usize,
        height: usize,
        channels: usize,
    },
}

/// Parallel catalog columns of different lengths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("catalog columns differ in length: {encodings} encodings, {names} names, {roles} roles")]
pub struct CatalogError {
    pub encodings: usize,
    pub names: usize,
    pub roles: usize,
}

/// Loading or validating a [`PipelineConfig`](crate::PipelineConfig) failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
