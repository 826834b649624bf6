//! # PharmaChain
//!
//! The submission facade. [`PharmaChain`] owns the registry and the ledger
//! and runs every signed request through the same pipeline:
//!
//! ```text
//! signature -> actor role -> recipient -> ledger (sequence, replay, transition) -> commit
//! ```
//!
//! Every check runs before any mutation, so a rejected request leaves both
//! the registry and the ledger untouched. An accepted signed request keeps
//! its signature in the record it produced.

use pharma_core::{ActorId, BatchId};
use pharma_crypto::Ed25519Signature;
use pharma_state::Projection;

use crate::config::{ChainConfig, LedgerConfig};
use crate::error::LedgerError;
use crate::ledger::{BatchLedger, History, RecordDraft};
use crate::query::{CustodyStep, ProvenanceReport, Verifier};
use crate::registry::{IdentityRegistry, RegistryEvent, RoleResolution};
use crate::submission::{
    ActionRequest, BatchTarget, RegistryCommand, RegistryOp, Signed, SubmissionReceipt,
};

/// Registry plus ledger behind a single submission path.
#[derive(Debug, Clone)]
pub struct PharmaChain {
    config: LedgerConfig,
    registry: IdentityRegistry,
    ledger: BatchLedger,
}

impl PharmaChain {
    /// Empty chain whose bootstrap belongs to `authority`.
    pub fn new(authority: ActorId, config: LedgerConfig) -> Self {
        Self {
            config,
            registry: IdentityRegistry::new(authority),
            ledger: BatchLedger::new(config),
        }
    }

    /// Empty chain built from a loaded configuration.
    pub fn from_config(config: &ChainConfig) -> Self {
        Self::new(config.authority, config.ledger)
    }

    pub(crate) fn from_parts(
        config: LedgerConfig,
        registry: IdentityRegistry,
        ledger: BatchLedger,
    ) -> Self {
        Self {
            config,
            registry,
            ledger,
        }
    }

    /// Verify and apply a signed action request.
    pub fn submit(
        &mut self,
        request: &Signed<ActionRequest>,
    ) -> Result<SubmissionReceipt, LedgerError> {
        let outcome = request
            .verify()
            .and_then(|()| self.apply(&request.payload, Some(request.signature)));
        log_outcome(&request.payload, &outcome);
        outcome
    }

    /// Apply a request whose caller the host has already authenticated.
    ///
    /// Fails with `Unauthorized` unless `require_signatures` is off.
    pub fn submit_unsigned(
        &mut self,
        request: &ActionRequest,
    ) -> Result<SubmissionReceipt, LedgerError> {
        let outcome = if self.config.require_signatures {
            Err(LedgerError::unauthorized("unsigned requests are not accepted"))
        } else {
            self.apply(request, None)
        };
        log_outcome(request, &outcome);
        outcome
    }

    /// Verify and apply a signed registry command.
    pub fn administer(
        &mut self,
        command: &Signed<RegistryCommand>,
    ) -> Result<RegistryEvent, LedgerError> {
        command.verify()?;
        self.apply_registry(&command.payload)
    }

    /// Apply a registry command whose caller the host has already authenticated.
    pub fn administer_unsigned(
        &mut self,
        command: &RegistryCommand,
    ) -> Result<RegistryEvent, LedgerError> {
        if self.config.require_signatures {
            return Err(LedgerError::unauthorized("unsigned commands are not accepted"));
        }
        self.apply_registry(command)
    }

    /// The identity and role registry.
    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// The batch ledger.
    pub fn ledger(&self) -> &BatchLedger {
        &self.ledger
    }

    /// Ledger policy.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Read-only verifier over the ledger.
    pub fn verifier(&self) -> Verifier<'_> {
        Verifier::new(&self.ledger)
    }

    /// Current projection of a batch.
    pub fn read(&self, batch_id: BatchId) -> Result<Projection, LedgerError> {
        self.ledger.read(batch_id)
    }

    /// Records of a batch, ascending by sequence.
    pub fn history(&self, batch_id: BatchId) -> Result<History<'_>, LedgerError> {
        self.ledger.history(batch_id)
    }

    /// See [`Verifier::verify_provenance`].
    pub fn verify_provenance(&self, batch_id: BatchId) -> Result<ProvenanceReport, LedgerError> {
        self.verifier().verify_provenance(batch_id)
    }

    /// See [`Verifier::trace`].
    pub fn trace(&self, batch_id: BatchId) -> Result<Vec<CustodyStep>, LedgerError> {
        self.verifier().trace(batch_id)
    }

    /// See [`IdentityRegistry::resolve_role`].
    pub fn resolve_role(&self, actor: &ActorId) -> RoleResolution {
        self.registry.resolve_role(actor)
    }

    fn apply(
        &mut self,
        request: &ActionRequest,
        signature: Option<Ed25519Signature>,
    ) -> Result<SubmissionReceipt, LedgerError> {
        let actor_role = match self.registry.resolve_role(&request.actor) {
            RoleResolution::Registered(role) => role,
            RoleResolution::Revoked(_) => {
                return Err(LedgerError::unauthorized(format!(
                    "actor {} has been revoked",
                    request.actor
                )))
            }
            RoleResolution::Unknown => {
                return Err(LedgerError::unauthorized(format!(
                    "actor {} is not registered",
                    request.actor
                )))
            }
        };
        if let Some(recipient) = request.recipient {
            match self.registry.resolve_role(&recipient) {
                RoleResolution::Registered(_) => {}
                RoleResolution::Revoked(_) => {
                    return Err(LedgerError::unauthorized(format!(
                        "recipient {recipient} has been revoked"
                    )))
                }
                RoleResolution::Unknown => {
                    return Err(LedgerError::not_found(format!("recipient {recipient}")))
                }
            }
        }

        let draft = RecordDraft {
            actor: request.actor,
            actor_role,
            action: request.action,
            recipient: request.recipient,
            metadata: request.metadata.clone(),
            request_id: request.request_id,
            signature,
        };
        let (batch_id, projection) = match &request.target {
            BatchTarget::New {
                product,
                manufactured_at,
            } => self
                .ledger
                .register(product.clone(), *manufactured_at, draft)?,
            BatchTarget::Existing {
                batch_id,
                expected_sequence,
            } => (
                *batch_id,
                self.ledger.append(*batch_id, *expected_sequence, draft)?,
            ),
        };
        Ok(SubmissionReceipt {
            request_id: request.request_id,
            batch_id,
            projection,
        })
    }

    fn apply_registry(&mut self, command: &RegistryCommand) -> Result<RegistryEvent, LedgerError> {
        let event = match command.op {
            RegistryOp::RegisterActor { actor, role } => {
                self.registry.register_actor(command.caller, actor, role)?
            }
            RegistryOp::RevokeActor { actor } => {
                self.registry.revoke_actor(command.caller, actor)?
            }
        };
        Ok(event.clone())
    }
}

fn log_outcome(request: &ActionRequest, outcome: &Result<SubmissionReceipt, LedgerError>) {
    match outcome {
        Ok(receipt) => tracing::debug!(
            request_id = %request.request_id,
            batch_id = %receipt.batch_id,
            sequence = receipt.projection.last_sequence,
            "submission accepted"
        ),
        Err(e) => tracing::warn!(
            request_id = %request.request_id,
            actor = %request.actor,
            action = %request.action,
            error = %e,
            "submission rejected"
        ),
    }
}
