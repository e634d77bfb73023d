//! Face-to-body association.

use crate::integration::TrackedObject;
use crate::resolve::identity::TrackId;
use crate::resolve::rect::PixelBox;

/// A face attached to the body track that contains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Association {
    pub track_id: TrackId,
    pub body_box: PixelBox,
}

/// Find the track whose body box contains `face`.
///
/// Tracks are scanned in the order the tracker returned them and the first
/// containing track wins, even when a later one overlaps the face better.
pub fn associate(face: &PixelBox, tracks: &[TrackedObject]) -> Option<Association> {
    tracks.iter().find_map(|track| {
        let body_box = track.bbox.to_pixel_box();
        body_box.contains(face).then_some(Association {
            track_id: track.track_id,
            body_box,
        })
    })
}
