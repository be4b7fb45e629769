//! Problem entity and lifecycle status.
//!
//! A [`Problem`] is only ever mutated by the consensus engine; everything
//! outside the domain crate sees it through read accessors. Persistence goes
//! through [`ProblemRecord`], which re-checks the lifecycle invariants when a
//! record is loaded back.

use super::value_objects::{ActorId, Location, NewProblem, ProblemId, TypeKey};
use crate::consensus::quorum::VALIDATION_QUORUM;
use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lifecycle status of a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemStatus {
    /// Reported and accumulating confirmations
    Open,
    /// Triaged by the authority
    InReview,
    /// Marked fixed by the authority, awaiting citizen validation
    Resolved,
}

impl ProblemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemStatus::Open => "open",
            ProblemStatus::InReview => "in_review",
            ProblemStatus::Resolved => "resolved",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProblemStatus::Open => "Open",
            ProblemStatus::InReview => "In review",
            ProblemStatus::Resolved => "Resolved",
        }
    }
}

impl std::fmt::Display for ProblemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProblemStatus {
    type Err = DomainError;

    /// Accepts the canonical names and the legacy Portuguese ones.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" | "aberto" => Ok(ProblemStatus::Open),
            "in_review" | "in-review" | "analise" => Ok(ProblemStatus::InReview),
            "resolved" | "resolvido" => Ok(ProblemStatus::Resolved),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// A reported municipal problem.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use zeladoria_domain::{ActorId, NewProblem, Problem, ProblemId, ProblemStatus};
///
/// let report = NewProblem::new("buraco", "Cratera na esquina", -23.55, -46.63).unwrap();
/// let reporter = ActorId::new("maria").unwrap();
/// let problem = Problem::report(ProblemId::new(1), report, reporter, Utc::now());
///
/// assert_eq!(problem.status(), ProblemStatus::Open);
/// assert_eq!(problem.confirmation_count(), 1);
/// assert_eq!(problem.validation_count(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProblemRecord", into = "ProblemRecord")]
pub struct Problem {
    pub(crate) id: ProblemId,
    pub(crate) type_key: TypeKey,
    pub(crate) description: String,
    pub(crate) location: Location,
    pub(crate) status: ProblemStatus,
    pub(crate) official_note: Option<String>,
    pub(crate) reported_by: ActorId,
    /// Everyone who corroborated the report, reporter included.
    pub(crate) confirmed_by: BTreeSet<ActorId>,
    /// Citizens who attested the current resolution. Empty unless resolved.
    pub(crate) validated_by: BTreeSet<ActorId>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) resolved_at: Option<DateTime<Utc>>,
}

impl Problem {
    /// Construct a freshly reported problem.
    ///
    /// The reporter's implicit confirmation makes the initial count 1.
    pub fn report(id: ProblemId, report: NewProblem, reporter: ActorId, at: DateTime<Utc>) -> Self {
        let mut confirmed_by = BTreeSet::new();
        confirmed_by.insert(reporter.clone());

        Self {
            id,
            type_key: report.type_key,
            description: report.description,
            location: report.location,
            status: ProblemStatus::Open,
            official_note: None,
            reported_by: reporter,
            confirmed_by,
            validated_by: BTreeSet::new(),
            created_at: at,
            updated_at: at,
            resolved_at: None,
        }
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> ProblemId {
        self.id
    }

    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn status(&self) -> ProblemStatus {
        self.status
    }

    pub fn official_note(&self) -> Option<&str> {
        self.official_note.as_deref()
    }

    pub fn reported_by(&self) -> &ActorId {
        &self.reported_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    // ==================== Vote State ====================

    /// Number of distinct citizens who corroborated the report.
    pub fn confirmation_count(&self) -> u32 {
        self.confirmed_by.len() as u32
    }

    /// Number of distinct citizens who validated the current resolution.
    pub fn validation_count(&self) -> u32 {
        self.validated_by.len() as u32
    }

    pub fn has_confirmed(&self, actor: &ActorId) -> bool {
        self.confirmed_by.contains(actor)
    }

    pub fn has_validated(&self, actor: &ActorId) -> bool {
        self.validated_by.contains(actor)
    }

    pub fn confirmed_by(&self) -> impl Iterator<Item = &ActorId> {
        self.confirmed_by.iter()
    }

    pub fn validated_by(&self) -> impl Iterator<Item = &ActorId> {
        self.validated_by.iter()
    }

    /// `(validations, quorum)` for "Validate (n/3)" style displays.
    pub fn validation_progress(&self) -> (u32, u32) {
        (self.validation_count(), VALIDATION_QUORUM)
    }

    /// Resolved and attested by the full validation quorum. Terminal.
    pub fn is_confirmed_resolved(&self) -> bool {
        self.status == ProblemStatus::Resolved && self.validation_count() >= VALIDATION_QUORUM
    }

    /// Flatten into a persistence record.
    pub fn to_record(&self) -> ProblemRecord {
        ProblemRecord::from(self.clone())
    }
}

/// Flat persistence form of a [`Problem`].
///
/// Stores hand these back through `Problem::try_from`, which rejects records
/// that break the lifecycle invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemRecord {
    pub id: ProblemId,
    pub type_key: TypeKey,
    pub description: String,
    pub location: Location,
    pub status: ProblemStatus,
    pub official_note: Option<String>,
    pub reported_by: ActorId,
    pub confirmed_by: Vec<ActorId>,
    #[serde(default)]
    pub validated_by: Vec<ActorId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<Problem> for ProblemRecord {
    fn from(problem: Problem) -> Self {
        Self {
            id: problem.id,
            type_key: problem.type_key,
            description: problem.description,
            location: problem.location,
            status: problem.status,
            official_note: problem.official_note,
            reported_by: problem.reported_by,
            confirmed_by: problem.confirmed_by.into_iter().collect(),
            validated_by: problem.validated_by.into_iter().collect(),
            created_at: problem.created_at,
            updated_at: problem.updated_at,
            resolved_at: problem.resolved_at,
        }
    }
}

impl TryFrom<ProblemRecord> for Problem {
    type Error = DomainError;

    fn try_from(record: ProblemRecord) -> Result<Self, Self::Error> {
        let corrupt = |reason: &str| DomainError::CorruptRecord {
            id: record.id.value(),
            reason: reason.to_string(),
        };

        let confirmed_by: BTreeSet<ActorId> = record.confirmed_by.iter().cloned().collect();
        if confirmed_by.len() != record.confirmed_by.len() {
            return Err(corrupt("duplicate confirmation"));
        }
        if !confirmed_by.contains(&record.reported_by) {
            return Err(corrupt("reporter missing from confirmations"));
        }

        let validated_by: BTreeSet<ActorId> = record.validated_by.iter().cloned().collect();
        if validated_by.len() != record.validated_by.len() {
            return Err(corrupt("duplicate validation"));
        }
        if validated_by.len() as u32 > VALIDATION_QUORUM {
            return Err(corrupt("validations exceed quorum"));
        }

        let resolved = record.status == ProblemStatus::Resolved;
        if !resolved && !validated_by.is_empty() {
            return Err(corrupt("validations outside resolved status"));
        }
        if resolved != record.resolved_at.is_some() {
            return Err(corrupt("resolved_at inconsistent with status"));
        }

        Ok(Self {
            id: record.id,
            type_key: record.type_key,
            description: record.description,
            location: record.location,
            status: record.status,
            official_note: record.official_note,
            reported_by: record.reported_by,
            confirmed_by,
            validated_by,
            created_at: record.created_at,
            updated_at: record.updated_at,
            resolved_at: record.resolved_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn sample() -> Problem {
        let report = NewProblem::new("buraco", "Cratera na esquina", -23.55, -46.63).unwrap();
        Problem::report(ProblemId::new(1), report, ActorId::new("maria").unwrap(), at())
    }

    #[test]
    fn test_report_initial_state() {
        let problem = sample();
        assert_eq!(problem.status(), ProblemStatus::Open);
        assert_eq!(problem.confirmation_count(), 1);
        assert_eq!(problem.validation_count(), 0);
        assert!(problem.has_confirmed(&ActorId::new("maria").unwrap()));
        assert!(problem.official_note().is_none());
        assert!(problem.resolved_at().is_none());
        assert_eq!(problem.created_at(), problem.updated_at());
        assert_eq!(problem.validation_progress(), (0, 3));
        assert!(!problem.is_confirmed_resolved());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("open".parse::<ProblemStatus>().unwrap(), ProblemStatus::Open);
        assert_eq!("analise".parse::<ProblemStatus>().unwrap(), ProblemStatus::InReview);
        assert_eq!("Resolvido".parse::<ProblemStatus>().unwrap(), ProblemStatus::Resolved);
        assert!("arquivado".parse::<ProblemStatus>().is_err());
    }

    #[test]
    fn test_status_serialize_snake_case() {
        let json = serde_json::to_string(&ProblemStatus::InReview).unwrap();
        assert_eq!(json, "\"in_review\"");
    }

    #[test]
    fn test_record_roundtrip_preserves_voters() {
        let problem = sample();
        let json = serde_json::to_string(&problem).unwrap();
        let back: Problem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, problem);
    }

    #[test]
    fn test_record_rejects_missing_reporter() {
        let mut record = sample().to_record();
        record.confirmed_by.clear();
        let err = Problem::try_from(record).unwrap_err();
        assert!(err.is_corrupt_record());
    }

    #[test]
    fn test_record_rejects_validations_while_open() {
        let mut record = sample().to_record();
        record.validated_by.push(ActorId::new("joao").unwrap());
        assert!(Problem::try_from(record).is_err());
    }

    #[test]
    fn test_record_rejects_duplicate_confirmation() {
        let mut record = sample().to_record();
        record.confirmed_by.push(ActorId::new("maria").unwrap());
        assert!(Problem::try_from(record).is_err());
    }

    #[test]
    fn test_record_rejects_excess_validations() {
        let mut record = sample().to_record();
        record.status = ProblemStatus::Resolved;
        record.resolved_at = Some(at());
        record.validated_by = ["a", "b", "c", "d"]
            .iter()
            .map(|id| ActorId::new(id).unwrap())
            .collect();
        assert!(Problem::try_from(record).is_err());
    }

    #[test]
    fn test_record_requires_resolved_at_when_resolved() {
        let mut record = sample().to_record();
        record.status = ProblemStatus::Resolved;
        assert!(Problem::try_from(record.clone()).is_err());

        record.resolved_at = Some(at());
        assert!(Problem::try_from(record).is_ok());
    }
}
