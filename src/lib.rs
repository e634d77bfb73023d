//! Identity resolution for people tracked across the frames of a fixed camera.
//!
//! Body tracks from an external tracker are fused with faces from an external
//! face detector. Each track gets a name and role through bounded-retry
//! recognition, plus age, gender and emotion computed once, and every
//! associated face is written out as a per-frame record.

pub mod coco;
pub mod config;
pub mod error;
pub mod integration;
pub mod resolve;

pub use config::PipelineConfig;
pub use error::{BoxError, CatalogError, ConfigError, FaceError, FrameError, OutputShapeError};
pub use integration::{
    Collaborators, FaceDetections, Frame, FrameOrchestrator, FrameRecord, FrameSummary,
    InMemoryGateway, KnownCatalog, ObjectDetection, PersistenceGateway, TrackedObject,
};
pub use resolve::{Attributes, IdentityPhase, IdentityState, PixelBox, Rect, Role, TrackId};
