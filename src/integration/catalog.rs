//! Known-identity catalog and a distance-based recognizer over it.

use ndarray::{Array1, ArrayView1};

use crate::error::CatalogError;
use crate::integration::collaborators::{FaceEncoder, FaceRecognizer};
use crate::integration::frame::Frame;
use crate::resolve::{PixelBox, Recognition, Role};

/// An enrolled person.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownIdentity {
    pub name: String,
    pub role: Role,
    pub encoding: Array1<f64>,
}

/// Enrolled identities in enrollment order.
///
/// The pipeline only reads a catalog; new registrations arrive as a whole new
/// catalog from an [`EnrollmentSource`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnownCatalog {
    entries: Vec<KnownIdentity>,
}

impl KnownCatalog {
    /// Create a catalog from entries in enrollment order.
    pub fn new(entries: Vec<KnownIdentity>) -> Self {
        Self { entries }
    }

    /// Build from parallel encoding, name and role columns.
    pub fn from_columns(
        encodings: Vec<Array1<f64>>,
        names: Vec<String>,
        roles: Vec<Role>,
    ) -> Result<Self, CatalogError> {
        if encodings.len() != names.len() || names.len() != roles.len() {
            return Err(CatalogError {
                encodings: encodings.len(),
                names: names.len(),
                roles: roles.len(),
            });
        }
        let entries = encodings
            .into_iter()
            .zip(names)
            .zip(roles)
            .map(|((encoding, name), role)| KnownIdentity {
                name,
                role,
                encoding,
            })
            .collect();
        Ok(Self { entries })
    }

    /// Number of enrolled identities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no identity is enrolled.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in enrollment order.
    pub fn iter(&self) -> impl Iterator<Item = &KnownIdentity> {
        self.entries.iter()
    }

    /// First entry, in enrollment order, whose encoding lies within
    /// `tolerance` Euclidean distance of `encoding`.
    ///
    /// Entries of a different dimension never match.
    pub fn first_within(&self, encoding: ArrayView1<'_, f64>, tolerance: f64) -> Option<&KnownIdentity> {
        self.entries.iter().find(|known| {
            known.encoding.len() == encoding.len()
                && euclidean(known.encoding.view(), encoding) <= tolerance
        })
    }
}

fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    (&a - &b).mapv(|d| d * d).sum().sqrt()
}

/// Supplies the catalog at startup and after new registrations.
pub trait EnrollmentSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load_catalog(&mut self) -> Result<KnownCatalog, Self::Error>;
}

/// Default match tolerance for 128-d face embeddings.
pub const DEFAULT_TOLERANCE: f64 = 0.6;

/// [`FaceRecognizer`] that encodes the face and picks the first catalog entry
/// within a distance tolerance.
#[derive(Debug, Clone)]
pub struct DistanceMatcher<E> {
    encoder: E,
    tolerance: f64,
}

impl<E: FaceEncoder> DistanceMatcher<E> {
    /// Create a matcher with [`DEFAULT_TOLERANCE`].
    pub fn new(encoder: E) -> Self {
        Self::with_tolerance(encoder, DEFAULT_TOLERANCE)
    }

    /// Create a matcher with a custom distance tolerance.
    pub fn with_tolerance(encoder: E, tolerance: f64) -> Self {
        Self { encoder, tolerance }
    }

    /// Get a reference to the face encoder.
    pub fn encoder(&self) -> &E {
        &self.encoder
    }
}

impl<E: FaceEncoder> FaceRecognizer for DistanceMatcher<E> {
    type Error = E::Error;

    fn recognize(
        &mut self,
        frame: &Frame<'_>,
        face: &PixelBox,
        catalog: &KnownCatalog,
    ) -> Result<Recognition, Self::Error> {
        if catalog.is_empty() {
            return Ok(Recognition::NoMatch);
        }
        let Some(encoding) = self.encoder.encode(frame, face)? else {
            return Ok(Recognition::NoMatch);
        };
        Ok(match catalog.first_within(encoding.view(), self.tolerance) {
            Some(known) => Recognition::Match {
                name: known.name.clone(),
                role: known.role,
            },
            None => Recognition::NoMatch,
        })
    }
}
