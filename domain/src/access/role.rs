//! Caller roles and identity.

use crate::core::error::DomainError;
use crate::problem::ActorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of an authenticated caller, as asserted by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Resident who reports, confirms and validates problems
    Citizen,
    /// Municipal staff who triage and resolve problems
    Authority,
    /// Operator with unconditional delete rights
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::Authority => "authority",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "citizen" | "cidadao" => Ok(Role::Citizen),
            "authority" | "prefeitura" => Ok(Role::Authority),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

/// An authenticated caller: who they are and what role they hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub actor: ActorId,
    pub role: Role,
}

impl Caller {
    pub fn new(actor: ActorId, role: Role) -> Self {
        Self { actor, role }
    }

    pub fn citizen(actor: ActorId) -> Self {
        Self::new(actor, Role::Citizen)
    }

    pub fn authority(actor: ActorId) -> Self {
        Self::new(actor, Role::Authority)
    }

    pub fn admin(actor: ActorId) -> Self {
        Self::new(actor, Role::Admin)
    }
}
