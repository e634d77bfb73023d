use std::collections::HashMap;

use crate::resolve::identity::{IdentityState, TrackId};

#[derive(Debug, Clone)]
struct Entry {
    state: IdentityState,
    last_seen: u64,
}

/// Identity states keyed by track id, with the last frame each track was
/// reported by the tracker.
#[derive(Debug, Clone, Default)]
pub struct IdentityStore {
    entries: HashMap<TrackId, Entry>,
}

impl IdentityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state of a track.
    pub fn get(&self, track_id: TrackId) -> Option<&IdentityState> {
        self.entries.get(&track_id).map(|e| &e.state)
    }

    /// Store `state` for the track, seen in `frame`.
    pub fn commit(&mut self, track_id: TrackId, state: IdentityState, frame: u64) {
        let entry = self.entries.entry(track_id).or_insert(Entry {
            state: IdentityState::new(),
            last_seen: frame,
        });
        entry.state = state;
        entry.last_seen = entry.last_seen.max(frame);
    }

    /// Record that the tracker reported the track in `frame`.
    pub fn touch(&mut self, track_id: TrackId, frame: u64) {
        if let Some(entry) = self.entries.get_mut(&track_id) {
            entry.last_seen = entry.last_seen.max(frame);
        }
    }

    /// Last frame the track was reported or committed in.
    pub fn last_seen(&self, track_id: TrackId) -> Option<u64> {
        self.entries.get(&track_id).map(|e| e.last_seen)
    }

    /// Drop every identity not seen for more than `max_absence` frames before
    /// `frame`, returning the evicted ids in ascending order.
    pub fn evict_stale(&mut self, frame: u64, max_absence: u64) -> Vec<TrackId> {
        let mut evicted: Vec<TrackId> = self
            .entries
            .iter()
            .filter(|(_, e)| frame.saturating_sub(e.last_seen) > max_absence)
            .map(|(id, _)| *id)
            .collect();
        evicted.sort_unstable();
        for id in &evicted {
            self.entries.remove(id);
        }
        evicted
    }

    /// Number of tracks with a known identity.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no track has an identity yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over every track and its state, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (TrackId, &IdentityState)> {
        self.entries.iter().map(|(id, e)| (*id, &e.state))
    }
}
