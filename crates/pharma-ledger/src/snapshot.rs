//! # Ledger Snapshots
//!
//! A [`LedgerSnapshot`] is the persisted form of a [`PharmaChain`]: the
//! registry event log and, per batch, the stored projection and the full
//! history. The product descriptor lives in the Register record. Consumed
//! request ids are not stored; they are rebuilt from the histories.
//!
//! [`LedgerSnapshot::restore`] trusts nothing. It replays the registry log,
//! replays every batch history, and rejects the document with
//! `ConsistencyViolation` if any stored projection, sequence number, digest
//! link, role snapshot, recipient, record signature or counter disagrees
//! with what replay produces.
//!
//! Record signatures are what stop a writer of the file from rewriting a
//! record and resealing the chain after it. With `require_signatures` off,
//! unsigned records load and carry only the digest chain's protection.
//!
//! [`LedgerSnapshot::save`] writes a sibling `*.tmp` file and renames it over
//! the target, so readers never see a half-written snapshot.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use pharma_core::{ActorId, BatchId};
use pharma_state::{Projection, TransitionRecord};

use crate::batch::Batch;
use crate::chain::PharmaChain;
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::ledger::BatchLedger;
use crate::registry::{IdentityRegistry, RegistryEvent, RoleResolution};
use crate::submission::check_record_signature;

/// Snapshot layout version written by this crate.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// One batch as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSnapshot {
    /// Batch identifier.
    pub batch_id: BatchId,
    /// Stored projection; checked against the history on load.
    pub projection: Projection,
    /// Every record, ascending by sequence.
    pub history: Vec<TransitionRecord>,
}

/// The persisted form of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Layout version.
    pub format_version: u32,
    /// The deploying authority.
    pub authority: ActorId,
    /// Whether the bootstrap registration was used.
    pub bootstrap_consumed: bool,
    /// Registry event log.
    pub registry_events: Vec<RegistryEvent>,
    /// Every batch, ascending by identifier.
    pub batches: Vec<BatchSnapshot>,
    /// Identifier the next registration will receive.
    pub next_batch_id: BatchId,
}

impl LedgerSnapshot {
    /// Capture the full state of `chain`.
    pub fn capture(chain: &PharmaChain) -> Self {
        let registry = chain.registry();
        let ledger = chain.ledger();
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            authority: registry.authority(),
            bootstrap_consumed: registry.bootstrap_consumed(),
            registry_events: registry.events().to_vec(),
            batches: ledger
                .batches()
                .map(|b| BatchSnapshot {
                    batch_id: b.id(),
                    projection: b.projection(),
                    history: b.history().to_vec(),
                })
                .collect(),
            next_batch_id: ledger.next_batch_id(),
        }
    }

    /// Rebuild a chain, replaying and checking everything.
    pub fn restore(self, config: LedgerConfig) -> Result<PharmaChain, LedgerError> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(LedgerError::consistency(format!(
                "unsupported snapshot format version {}",
                self.format_version
            )));
        }

        let registry = IdentityRegistry::from_events(self.authority, self.registry_events)?;
        if registry.bootstrap_consumed() != self.bootstrap_consumed {
            return Err(LedgerError::consistency(
                "bootstrap flag does not match the registry log",
            ));
        }

        let mut batches = Vec::with_capacity(self.batches.len());
        for snap in self.batches {
            check_records(&registry, &snap, config.require_signatures)?;
            batches.push(Batch::restore(
                snap.batch_id,
                snap.history,
                snap.projection,
            )?);
        }
        let ledger = BatchLedger::restore(config, batches, self.next_batch_id)?;

        tracing::info!(
            batches = ledger.len(),
            registry_events = registry.events().len(),
            "snapshot restored"
        );
        Ok(PharmaChain::from_parts(config, registry, ledger))
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, LedgerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse JSON. Does not check consistency; see [`LedgerSnapshot::restore`].
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write to `path` through a temporary sibling file.
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let json = self.to_json()?;
        let tmp = tmp_path(path);
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), batches = self.batches.len(), "snapshot saved");
        Ok(())
    }

    /// Read and parse a snapshot file.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Check each record against the registry and its own signature.
///
/// The role snapshot must be the role the registry gave the actor; roles
/// never change, so this holds regardless of later revocation. A named
/// recipient must be in the registry. The signature must match the request
/// rebuilt from the record.
fn check_records(
    registry: &IdentityRegistry,
    snap: &BatchSnapshot,
    require_signatures: bool,
) -> Result<(), LedgerError> {
    for record in &snap.history {
        let body = &record.body;
        let role = match registry.resolve_role(&body.actor) {
            RoleResolution::Registered(role) | RoleResolution::Revoked(role) => role,
            RoleResolution::Unknown => {
                return Err(LedgerError::consistency(format!(
                    "{} sequence {}: actor {} is not in the registry",
                    snap.batch_id, body.sequence, body.actor
                )))
            }
        };
        if role != body.actor_role {
            return Err(LedgerError::consistency(format!(
                "{} sequence {}: recorded role {} but actor {} is a {role}",
                snap.batch_id, body.sequence, body.actor_role, body.actor
            )));
        }
        if let Some(recipient) = body.recipient {
            if registry.resolve_role(&recipient) == RoleResolution::Unknown {
                return Err(LedgerError::consistency(format!(
                    "{} sequence {}: recipient {recipient} is not in the registry",
                    snap.batch_id, body.sequence
                )));
            }
        }
        check_record_signature(record, require_signatures)?;
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
