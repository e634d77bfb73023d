//! Integration module connecting the external models and storage with the
//! identity resolution core.
//!
//! This module provides the collaborator traits, the persistence contract and
//! the [`FrameOrchestrator`] that drives them frame by frame.

mod builder;
mod catalog;
mod collaborators;
mod frame;
mod gateway;
mod pipeline;
mod stats;

pub use builder::DetectionBuilder;
pub use catalog::{DEFAULT_TOLERANCE, DistanceMatcher, EnrollmentSource, KnownCatalog, KnownIdentity};
pub use collaborators::{
    AgeEstimator, EmotionEstimator, FaceDetections, FaceDetector, FaceEncoder, FaceObservation,
    FaceRecognizer, GenderEstimator, ObjectDetection, ObjectDetector, TrackedObject, Tracker,
};
pub use frame::{FaceCrop, Frame};
pub use gateway::{DetectionRecord, FrameRecord, InMemoryGateway, PersistenceGateway};
pub use pipeline::{Collaborators, FrameOrchestrator};
pub use stats::{FrameSummary, RoleCounts, SessionStats};
