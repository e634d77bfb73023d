use crate::resolve::{IdentityPhase, IdentityStore, Role};

/// What happened during one call to `process_frame`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSummary {
    pub frame: u64,
    /// Object detections kept after the confidence gate
    pub detections: usize,
    pub tracks: usize,
    pub faces: usize,
    /// Frame records written
    pub records: usize,
    /// Faces with no containing track
    pub association_misses: usize,
    /// Faces on a track that already took an earlier face this frame
    pub duplicate_faces: usize,
    /// Malformed faces, faces skipped on a recognizer error and faces
    /// recorded without attributes after an estimator error
    pub failures: usize,
    pub persistence_failures: usize,
    pub recognitions: usize,
    pub evicted: usize,
}

/// Running totals over a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub frames_failed: u64,
    pub faces: u64,
    pub records: u64,
    pub association_misses: u64,
    pub duplicate_faces: u64,
    pub face_failures: u64,
    pub persistence_failures: u64,
    pub recognitions: u64,
}

impl SessionStats {
    /// Add a processed frame.
    pub fn record(&mut self, summary: &FrameSummary) {
        self.frames += 1;
        self.faces += summary.faces as u64;
        self.records += summary.records as u64;
        self.association_misses += summary.association_misses as u64;
        self.duplicate_faces += summary.duplicate_faces as u64;
        self.face_failures += summary.failures as u64;
        self.persistence_failures += summary.persistence_failures as u64;
        self.recognitions += summary.recognitions as u64;
    }

    /// Add a frame that was skipped.
    pub fn record_failure(&mut self) {
        self.frames += 1;
        self.frames_failed += 1;
    }
}

/// Tracks currently known to the pipeline, by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleCounts {
    pub customers: usize,
    pub staff: usize,
    pub vip: usize,
    pub identifying: usize,
    pub unknown: usize,
}

impl RoleCounts {
    /// Count the tracks in `store`.
    pub fn from_store(store: &IdentityStore) -> Self {
        let mut counts = Self::default();
        for (_, state) in store.iter() {
            match (&state.phase, state.role) {
                (IdentityPhase::Identifying { .. }, _) => counts.identifying += 1,
                (IdentityPhase::Unknown, _) => counts.unknown += 1,
                (IdentityPhase::Resolved { .. }, Role::Customer) => counts.customers += 1,
                (IdentityPhase::Resolved { .. }, Role::Staff) => counts.staff += 1,
                (IdentityPhase::Resolved { .. }, Role::Vip) => counts.vip += 1,
            }
        }
        counts
    }
}
