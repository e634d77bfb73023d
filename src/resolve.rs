mod associate;
mod attributes;
mod frontal;
mod identity;
mod recognition;
mod rect;
mod store;

pub use associate::{Association, associate};
pub use attributes::{AttributeEstimators, AttributeResolver, AttributeStep};
pub use frontal::{FrontalPoseConfig, Landmarks, PoseMeasurements, is_frontal};
pub use identity::{
    Attributes, Emotion, Gender, IDENTIFYING_NAME, IdentityPhase, IdentityState, ParseLabelError,
    Role, TrackId, UNKNOWN_NAME,
};
pub use recognition::{Recognition, RecognitionResolver, RecognitionStep};
pub use rect::{PixelBox, Rect};
pub use store::IdentityStore;
