//! Bounded-retry recognition state machine.

use crate::resolve::identity::{IdentityPhase, IdentityState, Role, UNKNOWN_NAME};

/// Result of one call to the face recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognition {
    Match { name: String, role: Role },
    NoMatch,
}

impl Recognition {
    /// Interpret a recognizer's `(name, role)` answer, where the name
    /// `"unknown"` means nothing in the catalog matched.
    pub fn from_label(name: impl Into<String>, role: Role) -> Self {
        let name = name.into();
        if name == UNKNOWN_NAME {
            Recognition::NoMatch
        } else {
            Recognition::Match { name, role }
        }
    }
}

/// What the resolver did with a track this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionStep {
    /// Already resolved or unknown; the recognizer was not called.
    Settled,
    /// Face not usable; the recognizer was not called and nothing was charged.
    Deferred,
    Resolved,
    /// Attempt failed, more remain.
    Retrying { attempts: u32 },
    /// Attempt failed and the bound was reached; the track is now unknown.
    Exhausted,
}

impl RecognitionStep {
    /// Whether the recognizer was invoked for this step.
    pub fn called_recognizer(&self) -> bool {
        matches!(
            self,
            RecognitionStep::Resolved
                | RecognitionStep::Retrying { .. }
                | RecognitionStep::Exhausted
        )
    }
}

/// Applies the retry policy to a track's [`IdentityState`].
#[derive(Debug, Clone, Copy)]
pub struct RecognitionResolver {
    max_attempts: u32,
}

impl RecognitionResolver {
    /// `max_attempts` below 1 is treated as 1.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Failed attempts allowed before a track becomes unknown.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Advance `state` for one associated face.
    ///
    /// `recognize` is only invoked for a frontal face on a track that is still
    /// identifying. A recognizer error is returned as-is and leaves `state`
    /// untouched.
    pub fn resolve<E>(
        &self,
        state: &mut IdentityState,
        is_frontal: bool,
        recognize: impl FnOnce() -> Result<Recognition, E>,
    ) -> Result<RecognitionStep, E> {
        let IdentityPhase::Identifying { attempts } = state.phase else {
            return Ok(RecognitionStep::Settled);
        };
        if !is_frontal {
            return Ok(RecognitionStep::Deferred);
        }

        match recognize()? {
            Recognition::Match { name, role } => {
                state.phase = IdentityPhase::Resolved { name };
                state.role = role;
                Ok(RecognitionStep::Resolved)
            }
            Recognition::NoMatch => {
                let attempts = attempts + 1;
                if attempts >= self.max_attempts {
                    state.phase = IdentityPhase::Unknown;
                    Ok(RecognitionStep::Exhausted)
                } else {
                    state.phase = IdentityPhase::Identifying { attempts };
                    Ok(RecognitionStep::Retrying { attempts })
                }
            }
        }
    }
}

impl Default for RecognitionResolver {
    fn default() -> Self {
        Self::new(3)
    }
}
