//! Validation quorum for resolved problems.
//!
//! A resolution is confirmed once a fixed number of distinct citizens attest
//! that the problem is genuinely fixed. The size is small, odd and fixed.

/// Validations needed to treat a resolution as confirmed.
pub const VALIDATION_QUORUM: u32 = 3;

/// Check if a validation count meets the quorum.
///
/// # Examples
///
/// ```
/// use zeladoria_domain::consensus::quorum::quorum_reached;
///
/// assert!(!quorum_reached(2));
/// assert!(quorum_reached(3));
/// ```
pub const fn quorum_reached(validations: u32) -> bool {
    validations >= VALIDATION_QUORUM
}

/// How many more validations are needed to reach the quorum.
pub const fn validations_needed(validations: u32) -> u32 {
    VALIDATION_QUORUM.saturating_sub(validations)
}
