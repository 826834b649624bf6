//! # Query and Verification
//!
//! Read-only views used by anyone auditing a batch. Nothing here mutates the
//! ledger or needs the caller to be registered.

use serde::{Deserialize, Serialize};

use pharma_core::{ActorId, BatchId, ContentDigest, Timestamp};
use pharma_state::{replay, CustodyState};

use crate::batch::ProductDescriptor;
use crate::error::LedgerError;
use crate::ledger::BatchLedger;
use crate::submission::check_record_signature;

/// Outcome of a successful provenance check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceReport {
    /// The verified batch.
    pub batch_id: BatchId,
    /// What the batch contains.
    pub product: ProductDescriptor,
    /// When it was manufactured.
    pub manufactured_at: Timestamp,
    /// Number of records replayed.
    pub records: u64,
    /// State reached by replay.
    pub state: CustodyState,
    /// Custodian reached by replay.
    pub custodian: ActorId,
    /// Digest of the last record.
    pub head_digest: ContentDigest,
}

/// One step of a custody trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyStep {
    /// Who held the batch.
    pub custodian: ActorId,
    /// Sequence of the record that gave them custody.
    pub since_sequence: u64,
    /// State at that record.
    pub state: CustodyState,
    /// Timestamp of that record.
    pub at: Timestamp,
}

/// Read-only verifier over a ledger.
#[derive(Debug, Clone, Copy)]
pub struct Verifier<'a> {
    ledger: &'a BatchLedger,
}

impl<'a> Verifier<'a> {
    /// Borrow `ledger` for verification.
    pub fn new(ledger: &'a BatchLedger) -> Self {
        Self { ledger }
    }

    /// Replay the batch's history from the initial state, check that it
    /// reproduces the stored projection, and check every record's signature
    /// against the request rebuilt from it.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown batch, `ConsistencyViolation` if the history
    /// does not replay, disagrees with the projection, or holds a record its
    /// actor did not sign (unsigned records pass when signatures are not
    /// required).
    pub fn verify_provenance(&self, batch_id: BatchId) -> Result<ProvenanceReport, LedgerError> {
        let batch = self.ledger.batch(batch_id)?;
        let replayed = replay(batch_id, batch.history()).map_err(|e| {
            tracing::warn!(batch_id = %batch_id, error = %e, "history does not replay");
            LedgerError::from(e)
        })?;
        if replayed != batch.projection() {
            tracing::warn!(batch_id = %batch_id, "projection disagrees with history");
            return Err(LedgerError::consistency(format!(
                "{batch_id}: stored projection does not match replayed history"
            )));
        }
        let required = self.ledger.config().require_signatures;
        for record in batch.history() {
            check_record_signature(record, required).map_err(|e| {
                tracing::warn!(batch_id = %batch_id, error = %e, "record signature rejected");
                e
            })?;
        }
        tracing::debug!(batch_id = %batch_id, records = replayed.last_sequence, "provenance verified");
        Ok(ProvenanceReport {
            batch_id,
            product: batch.product().clone(),
            manufactured_at: batch.manufactured_at(),
            records: replayed.last_sequence,
            state: replayed.state,
            custodian: replayed.custodian,
            head_digest: replayed.head_digest,
        })
    }

    /// Ordered custodians of a batch, consecutive repeats collapsed.
    pub fn trace(&self, batch_id: BatchId) -> Result<Vec<CustodyStep>, LedgerError> {
        let mut steps: Vec<CustodyStep> = Vec::new();
        for record in self.ledger.history(batch_id)? {
            if steps.last().map(|s| s.custodian) == Some(record.custodian()) {
                continue;
            }
            steps.push(CustodyStep {
                custodian: record.custodian(),
                since_sequence: record.sequence(),
                state: record.state(),
                at: record.body.timestamp,
            });
        }
        Ok(steps)
    }

    /// Verify every batch, ascending by identifier.
    pub fn verify_all(&self) -> Vec<(BatchId, Result<ProvenanceReport, LedgerError>)> {
        self.ledger
            .batch_ids()
            .map(|id| (id, self.verify_provenance(id)))
            .collect()
    }
}
