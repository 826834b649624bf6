//! # Batches
//!
//! A [`Batch`] owns its history and a cached [`Projection`]. Both fields are
//! private: the ledger changes them together through [`Batch::commit`], which
//! derives the new projection by folding the new record onto the old one.
//!
//! The product descriptor and manufacturing time are taken from the Register
//! record, so they share its digest.

use pharma_core::{BatchId, Timestamp};
use pharma_state::{replay, Projection, Registration, TransitionRecord};

pub use pharma_state::ProductDescriptor;

use crate::error::LedgerError;

/// A registered batch and its full history.
#[derive(Debug, Clone)]
pub struct Batch {
    id: BatchId,
    registration: Registration,
    history: Vec<TransitionRecord>,
    projection: Projection,
}

impl Batch {
    /// Start a batch from its Register record.
    pub(crate) fn genesis(id: BatchId, record: TransitionRecord) -> Result<Self, LedgerError> {
        let projection = Projection::apply(None, id, &record)?;
        let registration = registration_of(id, &record)?;
        Ok(Self {
            id,
            registration,
            history: vec![record],
            projection,
        })
    }

    /// Rebuild a batch from persisted parts, checking that the history
    /// replays to exactly the stored projection.
    pub(crate) fn restore(
        id: BatchId,
        history: Vec<TransitionRecord>,
        stored: Projection,
    ) -> Result<Self, LedgerError> {
        let replayed = replay(id, &history)?;
        if replayed != stored {
            return Err(LedgerError::consistency(format!(
                "{id}: stored projection does not match history"
            )));
        }
        let registration = match history.first() {
            Some(first) => registration_of(id, first)?,
            None => return Err(LedgerError::consistency(format!("{id}: history is empty"))),
        };
        Ok(Self {
            id,
            registration,
            history,
            projection: replayed,
        })
    }

    /// Check `record` against the current projection and append it.
    /// On error nothing changes.
    pub(crate) fn commit(&mut self, record: TransitionRecord) -> Result<Projection, LedgerError> {
        let next = Projection::apply(Some(&self.projection), self.id, &record)?;
        self.history.push(record);
        self.projection = next;
        Ok(next)
    }

    /// Batch identifier.
    pub fn id(&self) -> BatchId {
        self.id
    }

    /// Product descriptor given at registration.
    pub fn product(&self) -> &ProductDescriptor {
        &self.registration.product
    }

    /// Manufacturing time given at registration.
    pub fn manufactured_at(&self) -> Timestamp {
        self.registration.manufactured_at
    }

    /// Every record, ascending by sequence.
    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    /// Current cached projection.
    pub fn projection(&self) -> Projection {
        self.projection
    }
}

fn registration_of(id: BatchId, record: &TransitionRecord) -> Result<Registration, LedgerError> {
    record
        .body
        .registration
        .clone()
        .ok_or_else(|| LedgerError::consistency(format!("{id}: first record has no registration")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ledger::{BatchLedger, RecordDraft};
    use crate::query::Verifier;
    use pharma_core::{ActorId, RequestId};
    use pharma_state::{Action, Role};

    fn draft(actor: u8, role: Role, action: Action, recipient: Option<u8>) -> RecordDraft {
        RecordDraft {
            actor: ActorId::from_bytes([actor; 32]),
            actor_role: role,
            action,
            recipient: recipient.map(|r| ActorId::from_bytes([r; 32])),
            metadata: None,
            request_id: RequestId::new(),
            signature: None,
        }
    }

    fn shipped() -> (BatchLedger, BatchId) {
        let mut ledger = BatchLedger::new(crate::LedgerConfig {
            require_signatures: false,
            ..Default::default()
        });
        let (batch_id, _) = ledger
            .register(
                ProductDescriptor::new("Amoxicillin", "capsule", 100),
                Timestamp::parse("2026-02-10T06:00:00Z").unwrap(),
                draft(1, Role::Manufacturer, Action::Register, None),
            )
            .unwrap();
        ledger
            .append(batch_id, 1, draft(1, Role::Manufacturer, Action::Ship, Some(2)))
            .unwrap();
        (ledger, batch_id)
    }

    #[test]
    fn test_registration_comes_from_first_record() {
        let (ledger, batch_id) = shipped();
        let batch = ledger.batch(batch_id).unwrap();
        assert_eq!(batch.product().name, "Amoxicillin");
        assert_eq!(
            batch.history()[0].body.registration.as_ref(),
            Some(&batch.registration)
        );
    }

    #[test]
    fn test_projection_disagreeing_with_history_fails_verification() {
        let (mut ledger, batch_id) = shipped();
        ledger.batch_mut(batch_id).unwrap().projection.custodian = ActorId::from_bytes([9; 32]);
        let err = Verifier::new(&ledger).verify_provenance(batch_id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConsistencyViolation);
    }

    #[test]
    fn test_tampered_history_fails_verification() {
        let (mut ledger, batch_id) = shipped();
        let batch = ledger.batch_mut(batch_id).unwrap();
        batch.history[1].body.recipient = Some(ActorId::from_bytes([3; 32]));
        let err = Verifier::new(&ledger).verify_provenance(batch_id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConsistencyViolation);
    }

    #[test]
    fn test_restore_rejects_disagreeing_projection() {
        let (ledger, batch_id) = shipped();
        let batch = ledger.batch(batch_id).unwrap();
        let mut stored = batch.projection();
        stored.last_sequence = 1;
        let err = Batch::restore(batch_id, batch.history().to_vec(), stored).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConsistencyViolation);
    }
}
