//! FrameOrchestrator: detection, tracking, face association and identity
//! resolution for one frame at a time.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::{ConfigError, FaceError, FrameError};
use crate::integration::catalog::{EnrollmentSource, KnownCatalog};
use crate::integration::collaborators::{
    FaceDetector, FaceObservation, FaceRecognizer, ObjectDetector, TrackedObject, Tracker,
};
use crate::integration::frame::Frame;
use crate::integration::gateway::{DetectionRecord, FrameRecord, PersistenceGateway};
use crate::integration::stats::{FrameSummary, RoleCounts, SessionStats};
use crate::resolve::{
    AttributeEstimators, AttributeResolver, IdentityState, IdentityStore, RecognitionResolver,
    RecognitionStep, TrackId, associate, is_frontal,
};

/// The external collaborators a [`FrameOrchestrator`] drives.
#[derive(Debug)]
pub struct Collaborators<D, T, F, R, G> {
    pub detector: D,
    pub tracker: T,
    pub face_detector: F,
    pub recognizer: R,
    pub gateway: G,
}

/// How one face ended up.
enum FaceOutcome {
    Unassociated,
    /// An earlier face of the same frame already claimed the track.
    Duplicate,
    Recorded {
        recognized: bool,
        attributes_failed: bool,
        persistence_failures: usize,
    },
}

/// Per-frame driver owning the identity state of every track.
///
/// Frames must be processed one at a time in capture order. Faces within a
/// frame are handled sequentially and a track takes at most one face per
/// frame: the first face associated with it. A recognizer failure skips the
/// face and leaves the track as it was. An estimator failure only leaves the
/// attributes unset for this frame; the recognition outcome is still
/// committed and recorded.
pub struct FrameOrchestrator<D, T, F, R, G> {
    detector: D,
    tracker: T,
    face_detector: F,
    recognizer: R,
    gateway: G,
    recognition: RecognitionResolver,
    attributes: AttributeResolver,
    store: IdentityStore,
    catalog: KnownCatalog,
    config: PipelineConfig,
    frame_count: u64,
    stats: SessionStats,
}

impl<D, T, F, R, G> FrameOrchestrator<D, T, F, R, G>
where
    D: ObjectDetector,
    T: Tracker,
    F: FaceDetector,
    R: FaceRecognizer,
    G: PersistenceGateway,
{
    /// Create an orchestrator with no attribute estimators and an empty catalog.
    pub fn new(parts: Collaborators<D, T, F, R, G>, config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(parts, config))
    }

    /// Create an orchestrator with the default configuration.
    pub fn with_default_config(parts: Collaborators<D, T, F, R, G>) -> Self {
        Self::assemble(parts, PipelineConfig::default())
    }

    fn assemble(parts: Collaborators<D, T, F, R, G>, config: PipelineConfig) -> Self {
        Self {
            detector: parts.detector,
            tracker: parts.tracker,
            face_detector: parts.face_detector,
            recognizer: parts.recognizer,
            gateway: parts.gateway,
            recognition: RecognitionResolver::new(config.max_recognition_attempts),
            attributes: AttributeResolver::new(AttributeEstimators::new(), config.min_face_crop),
            store: IdentityStore::new(),
            catalog: KnownCatalog::default(),
            config,
            frame_count: 0,
            stats: SessionStats::default(),
        }
    }

    /// Use `estimators` for the one-shot attribute pass.
    pub fn with_estimators(mut self, estimators: AttributeEstimators) -> Self {
        self.attributes = AttributeResolver::new(estimators, self.config.min_face_crop);
        self
    }

    /// Start with `catalog` instead of an empty one.
    pub fn with_catalog(mut self, catalog: KnownCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Install a new catalog.
    pub fn replace_catalog(&mut self, catalog: KnownCatalog) {
        info!(identities = catalog.len(), "known-identity catalog replaced");
        self.catalog = catalog;
    }

    /// Reload the catalog from `source`, keeping the current one on error.
    ///
    /// Returns the number of identities now loaded.
    pub fn refresh_catalog<S: EnrollmentSource>(&mut self, source: &mut S) -> Result<usize, S::Error> {
        let catalog = source.load_catalog().inspect_err(|e| {
            warn!(error = %e, "catalog refresh failed, keeping previous catalog");
        })?;
        let count = catalog.len();
        self.replace_catalog(catalog);
        Ok(count)
    }

    /// Process a single frame.
    ///
    /// A detector, tracker or face detector failure skips the whole frame and
    /// is returned; identity state is untouched. Failures while handling an
    /// individual face are logged and counted in the summary instead.
    pub fn process_frame(&mut self, frame: &Frame<'_>) -> Result<FrameSummary, FrameError> {
        self.frame_count += 1;
        let frame_no = self.frame_count;

        match self.run_frame(frame, frame_no) {
            Ok(summary) => {
                self.stats.record(&summary);
                Ok(summary)
            }
            Err(e) => {
                warn!(frame = frame_no, error = %e, "frame skipped");
                self.stats.record_failure();
                Err(e)
            }
        }
    }

    fn run_frame(&mut self, frame: &Frame<'_>, frame_no: u64) -> Result<FrameSummary, FrameError> {
        let mut summary = FrameSummary {
            frame: frame_no,
            ..FrameSummary::default()
        };

        let mut detections = self
            .detector
            .detect(frame)
            .map_err(|e| FrameError::Detector(Box::new(e)))?;
        detections.retain(|d| d.confidence >= self.config.min_detection_confidence);
        summary.detections = detections.len();

        if self.config.log_object_detections {
            for detection in &detections {
                let record = DetectionRecord::new(frame_no, detection);
                if let Err(e) = self.gateway.append_detection(record) {
                    warn!(frame = frame_no, error = %e, "failed to log object detection");
                    summary.persistence_failures += 1;
                }
            }
        }

        let tracks = self
            .tracker
            .update(&detections, frame)
            .map_err(|e| FrameError::Tracker(Box::new(e)))?;
        summary.tracks = tracks.len();

        if let Some(max_absence) = self.config.stale_track_frames {
            let evicted = self.store.evict_stale(frame_no, max_absence);
            if !evicted.is_empty() {
                debug!(frame = frame_no, ?evicted, "forgot identities of stale tracks");
            }
            summary.evicted = evicted.len();
        }
        // a reissued id absent for too long is gone before it is touched again
        for track in &tracks {
            self.store.touch(track.track_id, frame_no);
        }

        let faces = self
            .face_detector
            .detect(frame, self.config.face_detection_threshold)
            .map_err(|e| FrameError::FaceDetector(Box::new(e)))?
            .observations()?;
        summary.faces = faces.len();

        let mut claimed = HashSet::new();
        for face in &faces {
            let face = match face {
                Ok(face) => face,
                Err(e) => {
                    warn!(frame = frame_no, error = %e, "malformed face skipped");
                    summary.failures += 1;
                    continue;
                }
            };
            match self.process_face(frame, frame_no, face, &tracks, &mut claimed) {
                Ok(FaceOutcome::Unassociated) => summary.association_misses += 1,
                Ok(FaceOutcome::Duplicate) => summary.duplicate_faces += 1,
                Ok(FaceOutcome::Recorded {
                    recognized,
                    attributes_failed,
                    persistence_failures,
                }) => {
                    summary.records += 1;
                    summary.recognitions += usize::from(recognized);
                    summary.failures += usize::from(attributes_failed);
                    summary.persistence_failures += persistence_failures;
                }
                Err(e) => {
                    warn!(frame = frame_no, error = %e, "face skipped");
                    summary.failures += 1;
                }
            }
        }

        Ok(summary)
    }

    fn process_face(
        &mut self,
        frame: &Frame<'_>,
        frame_no: u64,
        face: &FaceObservation,
        tracks: &[TrackedObject],
        claimed: &mut HashSet<TrackId>,
    ) -> Result<FaceOutcome, FaceError> {
        let Some(association) = associate(&face.face_box, tracks) else {
            debug!(frame = frame_no, face = ?face.face_box, "face not inside any track");
            return Ok(FaceOutcome::Unassociated);
        };
        let track_id = association.track_id;
        if !claimed.insert(track_id) {
            debug!(frame = frame_no, %track_id, face = ?face.face_box, "track already has a face this frame");
            return Ok(FaceOutcome::Duplicate);
        }

        let frontal = face
            .landmarks
            .as_ref()
            .is_some_and(|lm| is_frontal(&face.face_box, lm, &self.config.frontal));

        let previous = self.lookup(track_id);
        let mut state = previous.clone().unwrap_or_default();

        let step = self
            .recognition
            .resolve(&mut state, frontal, || {
                self.recognizer
                    .recognize(frame, &face.face_box, &self.catalog)
            })
            .map_err(|e| FaceError::Recognizer {
                track_id,
                source: Box::new(e),
            })?;

        // leaves the attributes unset on failure, retried on a later frame
        let attributes_failed = match self
            .attributes
            .resolve(&mut state, frontal, frame, &face.face_box, track_id)
        {
            Ok(_) => false,
            Err(e) => {
                warn!(frame = frame_no, %track_id, error = %e, "attributes unavailable this frame");
                true
            }
        };

        match step {
            RecognitionStep::Resolved => info!(
                frame = frame_no,
                %track_id,
                name = state.name().unwrap_or_default(),
                role = state.role.as_str(),
                "track identified"
            ),
            RecognitionStep::Exhausted => info!(
                frame = frame_no,
                %track_id,
                attempts = self.recognition.max_attempts(),
                "recognition attempts exhausted, track is unknown"
            ),
            RecognitionStep::Retrying { attempts } => {
                debug!(frame = frame_no, %track_id, attempts, "no catalog match")
            }
            RecognitionStep::Settled | RecognitionStep::Deferred => {}
        }

        // commit, then persist the snapshot that reflects it
        let changed = previous.as_ref() != Some(&state);
        self.store.commit(track_id, state.clone(), frame_no);

        let mut persistence_failures = 0;
        if changed {
            if let Err(e) = self.gateway.upsert_identity(track_id, &state) {
                warn!(frame = frame_no, %track_id, error = %e, "failed to upsert identity");
                persistence_failures += 1;
            }
        }
        let record = FrameRecord::new(frame_no, &association, face.face_box, &state, frontal);
        if let Err(e) = self.gateway.append_frame_record(record) {
            warn!(frame = frame_no, %track_id, error = %e, "failed to append frame record");
            persistence_failures += 1;
        }

        Ok(FaceOutcome::Recorded {
            recognized: step.called_recognizer(),
            attributes_failed,
            persistence_failures,
        })
    }

    /// Current state of a track, rehydrated from the gateway when configured.
    fn lookup(&mut self, track_id: TrackId) -> Option<IdentityState> {
        if let Some(state) = self.store.get(track_id) {
            return Some(state.clone());
        }
        if !self.config.rehydrate_identities {
            return None;
        }
        match self.gateway.get_latest_identity(track_id) {
            Ok(state) => {
                if state.is_some() {
                    debug!(%track_id, "rehydrated identity from storage");
                }
                state
            }
            Err(e) => {
                warn!(%track_id, error = %e, "identity lookup failed, treating track as new");
                None
            }
        }
    }

    /// Identity state of a track, if the pipeline has seen a face for it.
    pub fn identity(&self, track_id: TrackId) -> Option<&IdentityState> {
        self.store.get(track_id)
    }

    /// Get a reference to the identity store.
    pub fn store(&self) -> &IdentityStore {
        &self.store
    }

    /// Count known tracks by outcome.
    pub fn role_counts(&self) -> RoleCounts {
        RoleCounts::from_store(&self.store)
    }

    /// Get the running session statistics.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Number of frames processed, failed ones included.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Get a reference to the known-identity catalog.
    pub fn catalog(&self) -> &KnownCatalog {
        &self.catalog
    }

    /// Get a reference to the persistence gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Get a mutable reference to the persistence gateway.
    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// Get a mutable reference to the underlying tracker.
    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    /// Get a mutable reference to the face recognizer.
    pub fn recognizer_mut(&mut self) -> &mut R {
        &mut self.recognizer
    }
}
