//! # Ledger Errors
//!
//! Every mutating call resolves to a result or one of these errors. The five
//! domain kinds are exposed through [`LedgerError::kind()`] so callers can
//! branch without matching on message text.

use thiserror::Error;

use pharma_core::{ActorId, CanonicalizationError};
use pharma_state::{CustodyError, ProductError, ReplayError};

/// Classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown batch or actor.
    NotFound,
    /// The caller or its role may not perform the operation.
    Unauthorized,
    /// The operation is not defined for the current state.
    InvalidTransition,
    /// The actor identifier already has a role.
    AlreadyRegistered,
    /// Sequence, digest, or projection mismatch: a race or corruption.
    ConsistencyViolation,
    /// I/O, serialization, or configuration failure outside the domain rules.
    Internal,
}

/// Errors returned by the registry, the ledger, and the submission path.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Unknown batch or actor.
    #[error("not found: {what}")]
    NotFound {
        /// What was looked up.
        what: String,
    },

    /// The caller or its role may not perform the operation.
    #[error("unauthorized: {reason}")]
    Unauthorized {
        /// Why the caller was rejected.
        reason: String,
    },

    /// The operation is not defined for the current state.
    #[error("invalid transition: {reason}")]
    InvalidTransition {
        /// Why the operation was rejected.
        reason: String,
    },

    /// The actor identifier already has a role.
    #[error("actor {actor} is already registered")]
    AlreadyRegistered {
        /// The duplicate identifier.
        actor: ActorId,
    },

    /// Sequence, digest, or projection mismatch.
    #[error("consistency violation: {reason}")]
    ConsistencyViolation {
        /// What disagreed.
        reason: String,
    },

    /// A value could not be canonicalized for digesting or signing.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Snapshot file I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot JSON could not be read or written.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

impl LedgerError {
    /// The domain classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::AlreadyRegistered { .. } => ErrorKind::AlreadyRegistered,
            Self::ConsistencyViolation { .. } => ErrorKind::ConsistencyViolation,
            Self::Canonicalization(_) | Self::Io(_) | Self::Serialization(_) | Self::Config(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub(crate) fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound {
            what: what.to_string(),
        }
    }

    pub(crate) fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidTransition {
            reason: reason.into(),
        }
    }

    pub(crate) fn consistency(reason: impl Into<String>) -> Self {
        Self::ConsistencyViolation {
            reason: reason.into(),
        }
    }
}

impl From<CustodyError> for LedgerError {
    fn from(err: CustodyError) -> Self {
        match err {
            CustodyError::Unauthorized { .. } => Self::unauthorized(err.to_string()),
            CustodyError::InvalidTransition { .. } | CustodyError::RecipientNotApplicable { .. } => {
                Self::invalid(err.to_string())
            }
        }
    }
}

impl From<ProductError> for LedgerError {
    fn from(err: ProductError) -> Self {
        Self::invalid(err.to_string())
    }
}

impl From<ReplayError> for LedgerError {
    fn from(err: ReplayError) -> Self {
        Self::consistency(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharma_state::{Action, Role};

    #[test]
    fn test_custody_errors_map_to_kinds() {
        let unauthorized: LedgerError = CustodyError::Unauthorized {
            from: "MANUFACTURED".into(),
            action: Action::Ship,
            role: Role::Pharmacy,
        }
        .into();
        assert_eq!(unauthorized.kind(), ErrorKind::Unauthorized);

        let invalid: LedgerError = CustodyError::RecipientNotApplicable {
            action: Action::Verify,
        }
        .into();
        assert_eq!(invalid.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn test_replay_errors_are_consistency_violations() {
        let err: LedgerError = ReplayError::ChainBroken { sequence: 3 }.into();
        assert_eq!(err.kind(), ErrorKind::ConsistencyViolation);
        assert!(err.to_string().contains("sequence 3"));
    }
}
