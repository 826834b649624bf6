//! # History Replay
//!
//! Folds a batch's records from the initial (no batch) state through
//! [`Projection::apply`]. Replay needs nothing but the records themselves:
//! roles are snapshotted into each record, so later revocations in the
//! registry never change the outcome.

use thiserror::Error;

use pharma_core::BatchId;

use crate::custody::{CustodyError, CustodyState};
use crate::record::{Projection, TransitionRecord};

/// Why a history failed to replay.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// The history has no records.
    #[error("history is empty")]
    Empty,

    /// A record belongs to a different batch.
    #[error("record {sequence} belongs to {found}, expected {expected}")]
    ForeignRecord {
        /// Sequence of the offending record.
        sequence: u64,
        /// The batch being replayed.
        expected: BatchId,
        /// The batch named in the record.
        found: BatchId,
    },

    /// Sequence numbers are not contiguous from 1.
    #[error("sequence gap: expected {expected}, found {found}")]
    SequenceGap {
        /// The next contiguous sequence number.
        expected: u64,
        /// The sequence number in the record.
        found: u64,
    },

    /// `prev_digest` does not match the previous record.
    #[error("digest chain broken at sequence {sequence}")]
    ChainBroken {
        /// Sequence of the offending record.
        sequence: u64,
    },

    /// The stored digest does not match the record body.
    #[error("digest mismatch at sequence {sequence}")]
    DigestMismatch {
        /// Sequence of the offending record.
        sequence: u64,
    },

    /// Registration details are missing from a Register record or present
    /// on any other.
    #[error("registration details misplaced at sequence {sequence}")]
    RegistrationMismatch {
        /// Sequence of the offending record.
        sequence: u64,
    },

    /// The recorded action was not legal at that point.
    #[error("illegal transition at sequence {sequence}: {source}")]
    IllegalTransition {
        /// Sequence of the offending record.
        sequence: u64,
        /// The state machine's rejection.
        source: CustodyError,
    },

    /// The stored resulting state differs from the replayed one.
    #[error("state mismatch at sequence {sequence}: stored {stored}, replayed {replayed}")]
    StateMismatch {
        /// Sequence of the offending record.
        sequence: u64,
        /// State written in the record.
        stored: CustodyState,
        /// State computed by replay.
        replayed: CustodyState,
    },

    /// The stored custodian differs from the replayed one.
    #[error("custodian mismatch at sequence {sequence}")]
    CustodianMismatch {
        /// Sequence of the offending record.
        sequence: u64,
    },
}

/// Replay `records` for `batch_id` and return the resulting projection.
pub fn replay<'a, I>(batch_id: BatchId, records: I) -> Result<Projection, ReplayError>
where
    I: IntoIterator<Item = &'a TransitionRecord>,
{
    records
        .into_iter()
        .try_fold(None, |prev: Option<Projection>, record| {
            Projection::apply(prev.as_ref(), batch_id, record).map(Some)
        })?
        .ok_or(ReplayError::Empty)
}
