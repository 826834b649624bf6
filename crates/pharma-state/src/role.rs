//! # Actor Roles
//!
//! The closed set of roles an actor can hold. Roles gate which custody
//! transitions an actor may perform and, for [`Role::Regulator`], who may
//! manage the identity registry.

use serde::{Deserialize, Serialize};

/// The role assigned to a registered actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Produces and registers batches.
    Manufacturer,
    /// Moves batches between manufacturer and pharmacy.
    Distributor,
    /// Receives and dispenses batches.
    Pharmacy,
    /// Inspects, verifies, flags, and administers the registry.
    Regulator,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 4] = [
        Role::Manufacturer,
        Role::Distributor,
        Role::Pharmacy,
        Role::Regulator,
    ];

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manufacturer => "MANUFACTURER",
            Self::Distributor => "DISTRIBUTOR",
            Self::Pharmacy => "PHARMACY",
            Self::Regulator => "REGULATOR",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown role {s:?}"))
    }
}
