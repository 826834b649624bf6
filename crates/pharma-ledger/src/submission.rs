//! # Signed Submissions
//!
//! Clients send an [`ActionRequest`] (custody actions) or a
//! [`RegistryCommand`] (registry administration) wrapped in [`Signed`]. The
//! signature is Ed25519 over the canonical (JCS) bytes of the payload and
//! must verify against the acting actor's identifier, which is its public
//! key.
//!
//! An action request carries a [`RequestId`] under the signature; the ledger
//! accepts each request id once, so a captured submission cannot be replayed.
//!
//! Every field of an action request is committed in the record it produces,
//! and so is its signature. [`ActionRequest::from_record`] rebuilds the
//! request from the record, which lets [`check_record_signature`] prove long
//! after the fact that the actor asked for exactly what was recorded.

use serde::{Deserialize, Serialize};

use pharma_core::{ActorId, BatchId, CanonicalBytes, RequestId, Timestamp};
use pharma_crypto::{Ed25519KeyPair, Ed25519Signature};
use pharma_state::{Action, Projection, Role, TransitionRecord};

use crate::batch::ProductDescriptor;
use crate::error::LedgerError;

/// A payload that names the actor whose key must sign it.
pub trait Attributed {
    /// The actor expected to have signed.
    fn signer(&self) -> ActorId;
}

/// Where an action request applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchTarget {
    /// Register a new batch.
    New {
        /// What is being registered.
        product: ProductDescriptor,
        /// When it was manufactured.
        manufactured_at: Timestamp,
    },
    /// Act on an existing batch that the client last saw at `expected_sequence`.
    Existing {
        /// Target batch.
        batch_id: BatchId,
        /// The batch's last sequence as the client observed it.
        expected_sequence: u64,
    },
}

/// A custody action submitted by a supply-chain participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Single-use identifier.
    pub request_id: RequestId,
    /// New or existing batch.
    pub target: BatchTarget,
    /// Requested action.
    pub action: Action,
    /// Acting actor; must match the signing key.
    pub actor: ActorId,
    /// Named recipient of a Ship or Receive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ActorId>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

impl ActionRequest {
    /// Request to register a new batch.
    pub fn register(
        actor: ActorId,
        product: ProductDescriptor,
        manufactured_at: Timestamp,
    ) -> Self {
        Self {
            request_id: RequestId::new(),
            target: BatchTarget::New {
                product,
                manufactured_at,
            },
            action: Action::Register,
            actor,
            recipient: None,
            metadata: None,
        }
    }

    /// Request `action` on an existing batch.
    pub fn existing(
        actor: ActorId,
        batch_id: BatchId,
        expected_sequence: u64,
        action: Action,
    ) -> Self {
        Self {
            request_id: RequestId::new(),
            target: BatchTarget::Existing {
                batch_id,
                expected_sequence,
            },
            action,
            actor,
            recipient: None,
            metadata: None,
        }
    }

    /// Name the recipient of a Ship or Receive.
    pub fn with_recipient(mut self, recipient: ActorId) -> Self {
        self.recipient = Some(recipient);
        self
    }

    /// Attach notes.
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    /// The request that produced `record`, rebuilt from the fields it
    /// committed. A registration targets a new batch; anything later targets
    /// the batch at the sequence just before the record.
    pub fn from_record(record: &TransitionRecord) -> Result<Self, LedgerError> {
        let body = &record.body;
        let target = match (&body.registration, body.sequence) {
            (Some(registration), 1) => BatchTarget::New {
                product: registration.product.clone(),
                manufactured_at: registration.manufactured_at,
            },
            (None, sequence) if sequence > 1 => BatchTarget::Existing {
                batch_id: body.batch_id,
                expected_sequence: sequence - 1,
            },
            _ => {
                return Err(LedgerError::consistency(format!(
                    "{} sequence {}: registration details do not fit the record",
                    body.batch_id, body.sequence
                )))
            }
        };
        Ok(Self {
            request_id: body.request_id,
            target,
            action: body.action,
            actor: body.actor,
            recipient: body.recipient,
            metadata: body.metadata.clone(),
        })
    }
}

impl Attributed for ActionRequest {
    fn signer(&self) -> ActorId {
        self.actor
    }
}

/// A registry mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistryOp {
    /// Assign a role to a new actor.
    RegisterActor {
        /// The actor to register.
        actor: ActorId,
        /// Its role.
        role: Role,
    },
    /// Revoke an actor.
    RevokeActor {
        /// The actor to revoke.
        actor: ActorId,
    },
}

/// A registry mutation issued by `caller`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCommand {
    /// The regulator or deploying authority issuing the command.
    pub caller: ActorId,
    /// What to do.
    #[serde(flatten)]
    pub op: RegistryOp,
}

impl RegistryCommand {
    /// Register `actor` with `role`.
    pub fn register(caller: ActorId, actor: ActorId, role: Role) -> Self {
        Self {
            caller,
            op: RegistryOp::RegisterActor { actor, role },
        }
    }

    /// Revoke `actor`.
    pub fn revoke(caller: ActorId, actor: ActorId) -> Self {
        Self {
            caller,
            op: RegistryOp::RevokeActor { actor },
        }
    }
}

impl Attributed for RegistryCommand {
    fn signer(&self) -> ActorId {
        self.caller
    }
}

/// A payload with the signer's Ed25519 signature over its canonical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signed<T> {
    /// The signed content.
    pub payload: T,
    /// Signature by `payload.signer()`.
    pub signature: Ed25519Signature,
}

impl<T: Serialize + Attributed> Signed<T> {
    /// Sign `payload` with `key`, which must belong to the payload's signer.
    pub fn sign(payload: T, key: &Ed25519KeyPair) -> Result<Self, LedgerError> {
        if key.actor_id() != payload.signer() {
            return Err(LedgerError::unauthorized(format!(
                "key {} cannot sign for {}",
                key.actor_id(),
                payload.signer()
            )));
        }
        let signature = key.sign(&CanonicalBytes::new(&payload)?);
        Ok(Self { payload, signature })
    }

    /// Check the signature against the payload's signer.
    ///
    /// Fails with `Unauthorized` on any mismatch.
    pub fn verify(&self) -> Result<(), LedgerError> {
        let bytes = CanonicalBytes::new(&self.payload)?;
        pharma_crypto::verify(&bytes, &self.signature, &self.payload.signer()).map_err(|e| {
            LedgerError::unauthorized(format!(
                "signature check failed for {}: {e}",
                self.payload.signer()
            ))
        })
    }
}

/// Check the signature stored in `record` against the request rebuilt from
/// it. A record without a signature passes only when `required` is false.
///
/// Fails with `ConsistencyViolation`: a stored record that does not carry
/// its actor's valid signature was altered after it was accepted.
pub fn check_record_signature(record: &TransitionRecord, required: bool) -> Result<(), LedgerError> {
    let body = &record.body;
    let Some(signature) = body.signature else {
        if required {
            return Err(LedgerError::consistency(format!(
                "{} sequence {}: record is not signed",
                body.batch_id, body.sequence
            )));
        }
        return Ok(());
    };
    let signed = Signed {
        payload: ActionRequest::from_record(record)?,
        signature,
    };
    signed.verify().map_err(|_| {
        LedgerError::consistency(format!(
            "{} sequence {}: signature by {} does not match the record",
            body.batch_id, body.sequence, body.actor
        ))
    })
}

/// What an accepted action request produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// The request that was applied.
    pub request_id: RequestId,
    /// The batch it applied to (newly assigned for a registration).
    pub batch_id: BatchId,
    /// The batch's projection after the action.
    pub projection: Projection,
}
