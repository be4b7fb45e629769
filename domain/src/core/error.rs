//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Raised when input cannot form a valid domain value, or when a persisted
/// record violates a lifecycle invariant on the way back in.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Description must not be empty")]
    EmptyDescription,

    #[error("Problem type key must not be empty")]
    EmptyTypeKey,

    #[error("Actor identity must not be empty")]
    EmptyActorId,

    #[error("Invalid location: lat={lat}, lng={lng}")]
    InvalidLocation { lat: f64, lng: f64 },

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("Corrupt problem record {id}: {reason}")]
    CorruptRecord { id: u64, reason: String },
}

impl DomainError {
    /// Whether this error came from a persisted record rather than caller input
    pub fn is_corrupt_record(&self) -> bool {
        matches!(self, DomainError::CorruptRecord { .. })
    }
}
