//! Persistence contract consumed by the pipeline.

use std::collections::HashMap;
use std::convert::Infallible;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coco;
use crate::integration::collaborators::ObjectDetection;
use crate::resolve::{Association, Emotion, Gender, IdentityState, PixelBox, Role, TrackId};

/// Snapshot of one track in one frame where a face was associated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame: u64,
    pub track_id: TrackId,
    pub name: Option<String>,
    pub role: Role,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub emotion: Option<Emotion>,
    pub face_box: PixelBox,
    pub body_box: PixelBox,
    pub is_frontal: bool,
    pub timestamp: DateTime<Utc>,
}

impl FrameRecord {
    /// Snapshot `state` for an associated face, stamped with the current time.
    pub fn new(
        frame: u64,
        association: &Association,
        face_box: PixelBox,
        state: &IdentityState,
        is_frontal: bool,
    ) -> Self {
        let attributes = state.attributes().copied().unwrap_or_default();
        Self {
            frame,
            track_id: association.track_id,
            name: state.name().map(str::to_owned),
            role: state.role,
            age: attributes.age,
            gender: attributes.gender,
            emotion: attributes.emotion,
            face_box,
            body_box: association.body_box,
            is_frontal,
            timestamp: Utc::now(),
        }
    }
}

/// Raw object detection, logged independently of identity resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub frame: u64,
    pub class_id: u32,
    pub class_name: Option<String>,
    /// (x1, y1, x2, y2)
    pub bbox: [f32; 4],
    /// Rounded to two decimals
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

impl DetectionRecord {
    /// Record a detection of `frame`, stamped with the current time.
    pub fn new(frame: u64, detection: &ObjectDetection) -> Self {
        Self {
            frame,
            class_id: detection.class_id,
            class_name: coco::class_name(detection.class_id).map(str::to_owned),
            bbox: detection.bbox.to_tlbr(),
            confidence: (detection.confidence * 100.0).round() / 100.0,
            timestamp: Utc::now(),
        }
    }
}

/// Storage the pipeline writes through.
///
/// Writes are fire-and-forget: the pipeline logs a failed write and moves on.
pub trait PersistenceGateway {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Append one per-frame snapshot.
    fn append_frame_record(&mut self, record: FrameRecord) -> Result<(), Self::Error>;

    /// Latest stored identity of a track, if any.
    fn get_latest_identity(&mut self, track_id: TrackId) -> Result<Option<IdentityState>, Self::Error>;

    /// Replace the stored identity of a track.
    fn upsert_identity(&mut self, track_id: TrackId, state: &IdentityState) -> Result<(), Self::Error>;

    /// Log a raw object detection. Discarded unless overridden.
    fn append_detection(&mut self, _record: DetectionRecord) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Gateway that keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    frames: Vec<FrameRecord>,
    identities: HashMap<TrackId, IdentityState>,
    detections: Vec<DetectionRecord>,
    upserts: usize,
}

impl InMemoryGateway {
    /// Create an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every frame record, in append order.
    pub fn frame_records(&self) -> &[FrameRecord] {
        &self.frames
    }

    /// Records of one track, in append order.
    pub fn records_for(&self, track_id: TrackId) -> impl Iterator<Item = &FrameRecord> {
        self.frames.iter().filter(move |r| r.track_id == track_id)
    }

    /// Latest upserted identity of a track.
    pub fn identity(&self, track_id: TrackId) -> Option<&IdentityState> {
        self.identities.get(&track_id)
    }

    /// Every logged object detection, in append order.
    pub fn detections(&self) -> &[DetectionRecord] {
        &self.detections
    }

    /// Number of identity upserts received.
    pub fn upsert_count(&self) -> usize {
        self.upserts
    }
}

impl PersistenceGateway for InMemoryGateway {
    type Error = Infallible;

    fn append_frame_record(&mut self, record: FrameRecord) -> Result<(), Self::Error> {
        self.frames.push(record);
        Ok(())
    }

    fn get_latest_identity(&mut self, track_id: TrackId) -> Result<Option<IdentityState>, Self::Error> {
        Ok(self.identities.get(&track_id).cloned())
    }

    fn upsert_identity(&mut self, track_id: TrackId, state: &IdentityState) -> Result<(), Self::Error> {
        self.identities.insert(track_id, state.clone());
        self.upserts += 1;
        Ok(())
    }

    fn append_detection(&mut self, record: DetectionRecord) -> Result<(), Self::Error> {
        self.detections.push(record);
        Ok(())
    }
}
