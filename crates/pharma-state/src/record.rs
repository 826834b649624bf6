//! # Transition Records and Projections
//!
//! A [`TransitionRecord`] is the immutable unit of batch history. Its
//! `digest` is the SHA-256 of the canonical bytes of its [`RecordBody`], and
//! the body carries the digest of the preceding record, so the history of a
//! batch forms a hash chain. Rewriting any record changes its digest and
//! breaks the link from every record after it.
//!
//! The Register record also commits the batch's [`Registration`], and a
//! record submitted with a signature keeps it, so a rewritten record cannot
//! be resealed without the acting actor's key.
//!
//! A [`Projection`] is the derived "current" view of a batch. It is only ever
//! produced by [`Projection::apply`], the same step function that replay
//! folds over a history, so the ledger cannot hold a projection that the
//! history does not justify.

use serde::{Deserialize, Serialize};

use pharma_core::{
    sha256_digest, ActorId, BatchId, CanonicalBytes, CanonicalizationError, ContentDigest,
    RequestId, Timestamp,
};
use pharma_crypto::Ed25519Signature;

use crate::custody::{next_custodian, transition, Action, CustodyState};
use crate::product::Registration;
use crate::replay::ReplayError;
use crate::role::Role;

/// Everything a record commits to. The record digest is computed over this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBody {
    /// The batch this record belongs to.
    pub batch_id: BatchId,
    /// Position in the batch history, starting at 1.
    pub sequence: u64,
    /// Who performed the action.
    pub actor: ActorId,
    /// The actor's role when the action was accepted.
    pub actor_role: Role,
    /// What was done.
    pub action: Action,
    /// When the ledger accepted the action.
    pub timestamp: Timestamp,
    /// Lifecycle state after the action.
    pub resulting_state: CustodyState,
    /// Custodian after the action.
    pub custodian: ActorId,
    /// Named recipient of a Ship or Receive.
    pub recipient: Option<ActorId>,
    /// Free-form notes: inspection results, flag reason, shipping reference.
    pub metadata: Option<String>,
    /// The submission that produced this record.
    pub request_id: RequestId,
    /// Digest of the previous record; `None` for sequence 1.
    pub prev_digest: Option<ContentDigest>,
    /// Product and manufacturing time. Present on the Register record only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<Registration>,
    /// The actor's signature over the submitted request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Ed25519Signature>,
}

impl RecordBody {
    /// Digest of this body's canonical bytes.
    pub fn digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        Ok(sha256_digest(&CanonicalBytes::new(self)?))
    }

    /// Seal the body into an immutable record.
    pub fn seal(self) -> Result<TransitionRecord, CanonicalizationError> {
        let digest = self.digest()?;
        Ok(TransitionRecord { body: self, digest })
    }
}

/// An immutable, hash-chained entry in a batch's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The committed fields.
    pub body: RecordBody,
    /// SHA-256 of the canonical body.
    pub digest: ContentDigest,
}

impl TransitionRecord {
    /// Position in the batch history.
    pub fn sequence(&self) -> u64 {
        self.body.sequence
    }

    /// Lifecycle state after this record.
    pub fn state(&self) -> CustodyState {
        self.body.resulting_state
    }

    /// Custodian after this record.
    pub fn custodian(&self) -> ActorId {
        self.body.custodian
    }

    /// The action recorded.
    pub fn action(&self) -> Action {
        self.body.action
    }

    /// Whether the stored digest matches the body.
    pub fn digest_matches(&self) -> bool {
        self.body.digest().map(|d| d == self.digest).unwrap_or(false)
    }
}

/// Derived current view of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    /// Current lifecycle state.
    pub state: CustodyState,
    /// Current custodian.
    pub custodian: ActorId,
    /// Sequence number of the latest record.
    pub last_sequence: u64,
    /// Digest of the latest record.
    pub head_digest: ContentDigest,
}

impl Projection {
    /// Fold one record onto the previous projection (`None` before the first).
    ///
    /// Checks, in order: the record belongs to `batch_id`, its sequence is the
    /// next one, it links to the previous digest, its own digest matches its
    /// body, it carries registration details exactly when it is a Register,
    /// the action is legal for the recorded role, and the stored state and
    /// custodian are the ones the transition function computes.
    ///
    /// Signatures are not checked here; rebuilding the signed request is the
    /// ledger's concern.
    pub fn apply(
        prev: Option<&Projection>,
        batch_id: BatchId,
        record: &TransitionRecord,
    ) -> Result<Projection, ReplayError> {
        let body = &record.body;
        let expected_sequence = prev.map_or(1, |p| p.last_sequence + 1);

        if body.batch_id != batch_id {
            return Err(ReplayError::ForeignRecord {
                sequence: body.sequence,
                expected: batch_id,
                found: body.batch_id,
            });
        }
        if body.sequence != expected_sequence {
            return Err(ReplayError::SequenceGap {
                expected: expected_sequence,
                found: body.sequence,
            });
        }
        if body.prev_digest != prev.map(|p| p.head_digest) {
            return Err(ReplayError::ChainBroken {
                sequence: body.sequence,
            });
        }
        if !record.digest_matches() {
            return Err(ReplayError::DigestMismatch {
                sequence: body.sequence,
            });
        }
        if body.registration.is_some() != (body.action == Action::Register) {
            return Err(ReplayError::RegistrationMismatch {
                sequence: body.sequence,
            });
        }

        let state = transition(prev.map(|p| p.state), body.action, body.actor_role).map_err(
            |source| ReplayError::IllegalTransition {
                sequence: body.sequence,
                source,
            },
        )?;
        if state != body.resulting_state {
            return Err(ReplayError::StateMismatch {
                sequence: body.sequence,
                stored: body.resulting_state,
                replayed: state,
            });
        }

        let custodian = next_custodian(
            body.action,
            prev.map(|p| p.custodian),
            body.actor,
            body.recipient,
        )
        .map_err(|source| ReplayError::IllegalTransition {
            sequence: body.sequence,
            source,
        })?;
        if custodian != body.custodian {
            return Err(ReplayError::CustodianMismatch {
                sequence: body.sequence,
            });
        }

        Ok(Projection {
            state,
            custodian,
            last_sequence: body.sequence,
            head_digest: record.digest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::ProductDescriptor;

    fn body(sequence: u64, prev: Option<ContentDigest>) -> RecordBody {
        RecordBody {
            batch_id: BatchId::FIRST,
            sequence,
            actor: ActorId::from_bytes([1; 32]),
            actor_role: Role::Manufacturer,
            action: Action::Register,
            timestamp: Timestamp::parse("2026-02-01T09:00:00Z").unwrap(),
            resulting_state: CustodyState::Manufactured,
            custodian: ActorId::from_bytes([1; 32]),
            recipient: None,
            metadata: Some("lot 42".into()),
            request_id: RequestId::new(),
            prev_digest: prev,
            registration: Some(Registration {
                product: ProductDescriptor::new("Amoxicillin", "capsule", 100),
                manufactured_at: Timestamp::parse("2026-01-30T00:00:00Z").unwrap(),
            }),
            signature: None,
        }
    }

    #[test]
    fn test_seal_is_deterministic() {
        let b = body(1, None);
        let r1 = b.clone().seal().unwrap();
        let r2 = b.seal().unwrap();
        assert_eq!(r1.digest, r2.digest);
        assert!(r1.digest_matches());
    }

    #[test]
    fn test_tampered_body_detected() {
        let mut record = body(1, None).seal().unwrap();
        record.body.metadata = Some("lot 43".into());
        assert!(!record.digest_matches());
    }

    #[test]
    fn test_apply_register() {
        let record = body(1, None).seal().unwrap();
        let p = Projection::apply(None, BatchId::FIRST, &record).unwrap();
        assert_eq!(p.state, CustodyState::Manufactured);
        assert_eq!(p.last_sequence, 1);
        assert_eq!(p.head_digest, record.digest);
    }

    #[test]
    fn test_apply_rejects_wrong_batch() {
        let record = body(1, None).seal().unwrap();
        assert!(matches!(
            Projection::apply(None, BatchId::new(2), &record),
            Err(ReplayError::ForeignRecord { .. })
        ));
    }

    #[test]
    fn test_apply_rejects_bad_first_sequence() {
        let record = body(2, None).seal().unwrap();
        assert_eq!(
            Projection::apply(None, BatchId::FIRST, &record),
            Err(ReplayError::SequenceGap {
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn test_apply_rejects_stored_state_lie() {
        let mut b = body(1, None);
        b.resulting_state = CustodyState::Delivered;
        let record = b.seal().unwrap();
        assert!(matches!(
            Projection::apply(None, BatchId::FIRST, &record),
            Err(ReplayError::StateMismatch { .. })
        ));
    }

    #[test]
    fn test_tampered_registration_detected() {
        let mut record = body(1, None).seal().unwrap();
        if let Some(registration) = record.body.registration.as_mut() {
            registration.product.quantity = 999_999;
        }
        assert!(!record.digest_matches());
    }

    #[test]
    fn test_apply_requires_registration_on_register() {
        let mut b = body(1, None);
        b.registration = None;
        let record = b.seal().unwrap();
        assert_eq!(
            Projection::apply(None, BatchId::FIRST, &record),
            Err(ReplayError::RegistrationMismatch { sequence: 1 })
        );
    }

    #[test]
    fn test_record_json_shape() {
        let record = body(1, None).seal().unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["body"]["action"], "REGISTER");
        assert!(json["digest"].as_str().unwrap().starts_with("sha256:"));
        assert_eq!(json["body"]["registration"]["product"]["quantity"], 100);
        assert!(json["body"].get("signature").is_none());
        let back: TransitionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
