//! # Batch Ledger
//!
//! The authoritative store of batches. [`BatchLedger::register`] and
//! [`BatchLedger::append`] are the only mutations, and each one either
//! commits a record together with its projection or changes nothing.
//!
//! `append` is compare-and-append: the caller states the sequence number it
//! last saw, and the call fails with `ConsistencyViolation` if another
//! submission got there first.
//!
//! The ledger trusts the role and signature in the [`RecordDraft`]. Resolving
//! the role and checking the signature is the submission path's job (see
//! [`PharmaChain`](crate::PharmaChain)).

use std::collections::{BTreeMap, BTreeSet};

use pharma_core::{ActorId, BatchId, RequestId, Timestamp};
use pharma_crypto::Ed25519Signature;
use pharma_state::{
    next_custodian, transition, Action, CustodyState, Projection, RecordBody, Registration, Role,
    TransitionRecord,
};

use crate::batch::{Batch, ProductDescriptor};
use crate::config::LedgerConfig;
use crate::error::LedgerError;

/// The caller-supplied part of a new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    /// Acting actor.
    pub actor: ActorId,
    /// The actor's current role.
    pub actor_role: Role,
    /// Requested action.
    pub action: Action,
    /// Named recipient of a Ship or Receive.
    pub recipient: Option<ActorId>,
    /// Free-form notes.
    pub metadata: Option<String>,
    /// Single-use submission identifier.
    pub request_id: RequestId,
    /// The actor's signature over the request; `None` for unsigned submissions.
    pub signature: Option<Ed25519Signature>,
}

/// Lazy, restartable iterator over a batch's records, ascending by sequence.
#[derive(Debug, Clone)]
pub struct History<'a> {
    records: std::slice::Iter<'a, TransitionRecord>,
}

impl<'a> Iterator for History<'a> {
    type Item = &'a TransitionRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl ExactSizeIterator for History<'_> {}

/// Append-only store of every batch.
#[derive(Debug, Clone)]
pub struct BatchLedger {
    config: LedgerConfig,
    batches: BTreeMap<BatchId, Batch>,
    next_id: BatchId,
    consumed: BTreeSet<RequestId>,
}

impl Default for BatchLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl BatchLedger {
    /// Empty ledger. The first batch gets [`BatchId::FIRST`].
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            batches: BTreeMap::new(),
            next_id: BatchId::FIRST,
            consumed: BTreeSet::new(),
        }
    }

    /// Rebuild a ledger from batches that were each already checked against
    /// their history. Identifiers must run from 1 without gaps up to
    /// `next_id`, and no request id may appear twice.
    pub(crate) fn restore(
        config: LedgerConfig,
        batches: Vec<Batch>,
        next_id: BatchId,
    ) -> Result<Self, LedgerError> {
        let mut ledger = Self::new(config);
        for batch in batches {
            if batch.id() != ledger.next_id {
                return Err(LedgerError::consistency(format!(
                    "found {} where {} was expected",
                    batch.id(),
                    ledger.next_id
                )));
            }
            for record in batch.history() {
                if !ledger.consumed.insert(record.body.request_id) {
                    return Err(LedgerError::consistency(format!(
                        "{} appears more than once",
                        record.body.request_id
                    )));
                }
            }
            ledger.next_id = batch.id().next();
            ledger.batches.insert(batch.id(), batch);
        }
        if ledger.next_id != next_id {
            return Err(LedgerError::consistency(format!(
                "next batch id is {next_id} but the batches end before {}",
                ledger.next_id
            )));
        }
        Ok(ledger)
    }

    /// Create a batch with the next identifier. Its record 1 is the
    /// Register action in `draft`.
    pub fn register(
        &mut self,
        product: ProductDescriptor,
        manufactured_at: Timestamp,
        draft: RecordDraft,
    ) -> Result<(BatchId, Projection), LedgerError> {
        if draft.action != Action::Register {
            return Err(LedgerError::invalid(format!(
                "a new batch starts with {}, not {}",
                Action::Register,
                draft.action
            )));
        }
        product.validate()?;
        self.check_draft(&draft)?;

        let id = self.next_id;
        let registration = Registration {
            product,
            manufactured_at,
        };
        let record = build_record(id, None, Some(registration), draft)?;
        let request_id = record.body.request_id;
        let batch = Batch::genesis(id, record)?;
        let projection = batch.projection();

        self.batches.insert(id, batch);
        self.next_id = id.next();
        self.consumed.insert(request_id);
        tracing::info!(batch_id = %id, custodian = %projection.custodian, "batch registered");
        Ok((id, projection))
    }

    /// Append one transition to an existing batch.
    ///
    /// Fails with `ConsistencyViolation` unless `expected_sequence` is the
    /// batch's current last sequence.
    pub fn append(
        &mut self,
        batch_id: BatchId,
        expected_sequence: u64,
        draft: RecordDraft,
    ) -> Result<Projection, LedgerError> {
        let current = self.read(batch_id)?;
        if current.last_sequence != expected_sequence {
            tracing::warn!(
                batch_id = %batch_id,
                expected_sequence,
                actual = current.last_sequence,
                "stale append rejected"
            );
            return Err(LedgerError::consistency(format!(
                "{batch_id} is at sequence {}, request expected {expected_sequence}",
                current.last_sequence
            )));
        }
        self.check_draft(&draft)?;

        let action = draft.action;
        let record = build_record(batch_id, Some(&current), None, draft)?;
        let request_id = record.body.request_id;
        let sequence = record.sequence();
        let batch = self
            .batches
            .get_mut(&batch_id)
            .ok_or_else(|| LedgerError::not_found(batch_id))?;
        let projection = batch.commit(record)?;

        self.consumed.insert(request_id);
        tracing::info!(
            batch_id = %batch_id,
            sequence,
            action = %action,
            state = %projection.state,
            "transition appended"
        );
        Ok(projection)
    }

    /// Current projection of a batch.
    pub fn read(&self, batch_id: BatchId) -> Result<Projection, LedgerError> {
        self.batch(batch_id).map(Batch::projection)
    }

    /// Records of a batch, ascending by sequence.
    pub fn history(&self, batch_id: BatchId) -> Result<History<'_>, LedgerError> {
        let batch = self.batch(batch_id)?;
        Ok(History {
            records: batch.history().iter(),
        })
    }

    /// The full batch.
    pub fn batch(&self, batch_id: BatchId) -> Result<&Batch, LedgerError> {
        self.batches
            .get(&batch_id)
            .ok_or_else(|| LedgerError::not_found(batch_id))
    }

    /// Every batch, ascending by identifier.
    pub fn batches(&self) -> impl Iterator<Item = &Batch> {
        self.batches.values()
    }

    /// Every batch identifier, ascending.
    pub fn batch_ids(&self) -> impl Iterator<Item = BatchId> + '_ {
        self.batches.keys().copied()
    }

    /// Number of batches.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether no batch has been registered.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Identifier the next registration will receive.
    pub fn next_batch_id(&self) -> BatchId {
        self.next_id
    }

    /// Whether a request id has already produced a record.
    pub fn is_request_consumed(&self, request_id: &RequestId) -> bool {
        self.consumed.contains(request_id)
    }

    /// Policy this ledger was built with.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn batch_mut(&mut self, batch_id: BatchId) -> Option<&mut Batch> {
        self.batches.get_mut(&batch_id)
    }

    fn check_draft(&self, draft: &RecordDraft) -> Result<(), LedgerError> {
        if draft.signature.is_none() && self.config.require_signatures {
            return Err(LedgerError::unauthorized("unsigned records are not accepted"));
        }
        if self.consumed.contains(&draft.request_id) {
            tracing::warn!(request_id = %draft.request_id, "replayed request rejected");
            return Err(LedgerError::consistency(format!(
                "{} was already applied",
                draft.request_id
            )));
        }
        if let Some(metadata) = &draft.metadata {
            if metadata.len() > self.config.max_metadata_len {
                return Err(LedgerError::invalid(format!(
                    "metadata is {} bytes, limit is {}",
                    metadata.len(),
                    self.config.max_metadata_len
                )));
            }
        }
        Ok(())
    }
}

/// Run the transition and custodian functions for `draft` on top of
/// `current` and seal the resulting record.
fn build_record(
    batch_id: BatchId,
    current: Option<&Projection>,
    registration: Option<Registration>,
    draft: RecordDraft,
) -> Result<TransitionRecord, LedgerError> {
    let state: CustodyState = transition(current.map(|p| p.state), draft.action, draft.actor_role)?;
    let custodian = next_custodian(
        draft.action,
        current.map(|p| p.custodian),
        draft.actor,
        draft.recipient,
    )?;
    let body = RecordBody {
        batch_id,
        sequence: current.map_or(1, |p| p.last_sequence + 1),
        actor: draft.actor,
        actor_role: draft.actor_role,
        action: draft.action,
        timestamp: Timestamp::now(),
        resulting_state: state,
        custodian,
        recipient: draft.recipient,
        metadata: draft.metadata,
        request_id: draft.request_id,
        prev_digest: current.map(|p| p.head_digest),
        registration,
        signature: draft.signature,
    };
    Ok(body.seal()?)
}
