//! Problem value objects - identifiers and immutable report data.
//!
//! # Identifiers
//! - [`ProblemId`] - store-assigned identity of a reported problem
//! - [`ActorId`] - stable identity of a caller, supplied by the identity provider
//! - [`TypeKey`] - reference into the external problem type catalog
//!
//! # Report Data
//! - [`Location`] - latitude/longitude pair
//! - [`NewProblem`] - validated input for creating a problem

use crate::core::error::DomainError;
use crate::core::string::non_blank;
use serde::{Deserialize, Serialize};

/// Unique identifier for a reported problem.
///
/// Assigned by the problem store at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemId(u64);

impl ProblemId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ProblemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ProblemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl std::str::FromStr for ProblemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim_start_matches('#').parse().map(Self)
    }
}

/// Stable identity of an authenticated caller.
///
/// The core trusts this token as given; one vote per identity is enforced
/// against it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Creates an ActorId, rejecting blank identities.
    pub fn new(id: impl AsRef<str>) -> Result<Self, DomainError> {
        non_blank(id.as_ref())
            .map(Self)
            .ok_or(DomainError::EmptyActorId)
    }

    /// Identity used for actions triggered by policy rather than a person.
    pub fn system(policy: &str) -> Self {
        Self(format!("system:{policy}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key into the external problem type catalog (e.g. "buraco", "luz_queimada").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(String);

impl TypeKey {
    pub fn new(key: impl AsRef<str>) -> Result<Self, DomainError> {
        non_blank(key.as_ref())
            .map(Self)
            .ok_or(DomainError::EmptyTypeKey)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geographic position of a report, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    /// Creates a location, rejecting out-of-range or non-finite coordinates.
    pub fn new(lat: f64, lng: f64) -> Result<Self, DomainError> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        if valid {
            Ok(Self { lat, lng })
        } else {
            Err(DomainError::InvalidLocation { lat, lng })
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

/// Validated input for reporting a new problem.
///
/// # Example
///
/// ```
/// use zeladoria_domain::NewProblem;
///
/// let report = NewProblem::new("buraco", "Cratera na esquina", -23.5505, -46.6333).unwrap();
/// assert_eq!(report.type_key.as_str(), "buraco");
///
/// assert!(NewProblem::new("buraco", "   ", 0.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProblem {
    pub type_key: TypeKey,
    pub description: String,
    pub location: Location,
}

impl NewProblem {
    pub fn new(
        type_key: impl AsRef<str>,
        description: impl AsRef<str>,
        lat: f64,
        lng: f64,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            type_key: TypeKey::new(type_key)?,
            description: non_blank(description.as_ref()).ok_or(DomainError::EmptyDescription)?,
            location: Location::new(lat, lng)?,
        })
    }
}
