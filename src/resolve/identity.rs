use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Name persisted while recognition is in progress.
pub const IDENTIFYING_NAME: &str = "identifying";
/// Name persisted once recognition gave up, and the recognizer's no-match label.
pub const UNKNOWN_NAME: &str = "unknown";

/// Identifier the external tracker assigns to a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Role of a person on the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    #[serde(alias = "waiter")]
    Staff,
    #[serde(alias = "celebrity")]
    Vip,
}

impl Role {
    /// Lowercase label as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Staff => "staff",
            Role::Vip => "vip",
        }
    }
}

impl FromStr for Role {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "staff" | "waiter" => Ok(Role::Staff),
            "vip" | "celebrity" => Ok(Role::Vip),
            _ => Err(ParseLabelError::new("role", s)),
        }
    }
}

/// Gender as reported by the gender estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Man,
    Woman,
}

impl FromStr for Gender {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "man" | "male" => Ok(Gender::Man),
            "woman" | "female" => Ok(Gender::Woman),
            _ => Err(ParseLabelError::new("gender", s)),
        }
    }
}

/// The seven emotion classes, in estimator output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Surprise,
    Sad,
    Anger,
    Disgust,
    Fear,
    Neutral,
}

impl Emotion {
    /// Classes in the estimator's output order.
    pub const ALL: [Emotion; 7] = [
        Emotion::Happy,
        Emotion::Surprise,
        Emotion::Sad,
        Emotion::Anger,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Neutral,
    ];

    /// Map a class index from the estimator's output.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl FromStr for Emotion {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "happy" => Ok(Emotion::Happy),
            "surprise" => Ok(Emotion::Surprise),
            "sad" => Ok(Emotion::Sad),
            "anger" => Ok(Emotion::Anger),
            "disgust" => Ok(Emotion::Disgust),
            "fear" => Ok(Emotion::Fear),
            "neutral" => Ok(Emotion::Neutral),
            _ => Err(ParseLabelError::new("emotion", s)),
        }
    }
}

/// A label string that does not name any variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {kind} label {label:?}")]
pub struct ParseLabelError {
    kind: &'static str,
    label: String,
}

impl ParseLabelError {
    fn new(kind: &'static str, label: &str) -> Self {
        Self {
            kind,
            label: label.to_owned(),
        }
    }
}

/// Demographic and emotional attributes, computed once per track.
///
/// A field is `None` when no estimator for it is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attributes {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub emotion: Option<Emotion>,
}

/// Recognition progress of a track.
///
/// A track absent from the identity store is NEW; the first frame that
/// associates a face creates it in `Identifying`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IdentityPhase {
    /// Failed recognition attempts so far, always below the configured bound.
    Identifying { attempts: u32 },
    Resolved { name: String },
    Unknown,
}

impl Default for IdentityPhase {
    fn default() -> Self {
        IdentityPhase::Identifying { attempts: 0 }
    }
}

/// Per-track identity annotation owned by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdentityState {
    pub phase: IdentityPhase,
    pub role: Role,
    attributes: Option<Attributes>,
}

impl IdentityState {
    /// A freshly seen track: identifying, no attempts yet, customer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name as persisted.
    ///
    /// `None` until a recognition attempt has been made.
    pub fn name(&self) -> Option<&str> {
        match &self.phase {
            IdentityPhase::Identifying { attempts: 0 } => None,
            IdentityPhase::Identifying { .. } => Some(IDENTIFYING_NAME),
            IdentityPhase::Resolved { name } => Some(name.as_str()),
            IdentityPhase::Unknown => Some(UNKNOWN_NAME),
        }
    }

    /// Failed attempts while identifying; zero in every other phase.
    pub fn attempts(&self) -> u32 {
        match self.phase {
            IdentityPhase::Identifying { attempts } => attempts,
            _ => 0,
        }
    }

    /// Resolved or unknown: no further recognition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.phase, IdentityPhase::Identifying { .. })
    }

    /// Attributes, once computed.
    pub fn attributes(&self) -> Option<&Attributes> {
        self.attributes.as_ref()
    }

    /// Store attributes unless some are already present.
    ///
    /// Returns whether the value was stored. Attributes never change once set.
    pub fn set_attributes(&mut self, attributes: Attributes) -> bool {
        if self.attributes.is_some() {
            return false;
        }
        self.attributes = Some(attributes);
        true
    }
}
