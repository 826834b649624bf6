//! # Shared Chain Handle
//!
//! Thread-safe, cloneable handle over a [`PharmaChain`]. Reads take the read
//! lock and run concurrently; a submission takes the write lock for the whole
//! validate-append-project step, so no reader can observe a record without
//! its projection. The lock is `parking_lot` and never poisons.

use std::sync::Arc;

use parking_lot::RwLock;

use pharma_core::{ActorId, BatchId};
use pharma_state::{Projection, TransitionRecord};

use crate::chain::PharmaChain;
use crate::error::LedgerError;
use crate::query::{CustodyStep, ProvenanceReport};
use crate::registry::{RegistryEvent, RoleResolution};
use crate::snapshot::LedgerSnapshot;
use crate::submission::{ActionRequest, RegistryCommand, Signed, SubmissionReceipt};

/// Cloneable handle to a chain shared between threads.
#[derive(Debug)]
pub struct SharedChain {
    inner: Arc<RwLock<PharmaChain>>,
}

impl Clone for SharedChain {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SharedChain {
    /// Take ownership of `chain`.
    pub fn new(chain: PharmaChain) -> Self {
        Self {
            inner: Arc::new(RwLock::new(chain)),
        }
    }

    /// See [`PharmaChain::submit`].
    pub fn submit(
        &self,
        request: &Signed<ActionRequest>,
    ) -> Result<SubmissionReceipt, LedgerError> {
        self.inner.write().submit(request)
    }

    /// See [`PharmaChain::submit_unsigned`].
    pub fn submit_unsigned(&self, request: &ActionRequest) -> Result<SubmissionReceipt, LedgerError> {
        self.inner.write().submit_unsigned(request)
    }

    /// See [`PharmaChain::administer`].
    pub fn administer(
        &self,
        command: &Signed<RegistryCommand>,
    ) -> Result<RegistryEvent, LedgerError> {
        self.inner.write().administer(command)
    }

    /// See [`PharmaChain::administer_unsigned`].
    pub fn administer_unsigned(
        &self,
        command: &RegistryCommand,
    ) -> Result<RegistryEvent, LedgerError> {
        self.inner.write().administer_unsigned(command)
    }

    /// Current projection of a batch.
    pub fn read(&self, batch_id: BatchId) -> Result<Projection, LedgerError> {
        self.inner.read().read(batch_id)
    }

    /// Owned copy of a batch's records.
    pub fn history(&self, batch_id: BatchId) -> Result<Vec<TransitionRecord>, LedgerError> {
        Ok(self.inner.read().history(batch_id)?.cloned().collect())
    }

    /// See [`PharmaChain::verify_provenance`].
    pub fn verify_provenance(&self, batch_id: BatchId) -> Result<ProvenanceReport, LedgerError> {
        self.inner.read().verify_provenance(batch_id)
    }

    /// See [`PharmaChain::trace`].
    pub fn trace(&self, batch_id: BatchId) -> Result<Vec<CustodyStep>, LedgerError> {
        self.inner.read().trace(batch_id)
    }

    /// See [`PharmaChain::resolve_role`].
    pub fn resolve_role(&self, actor: &ActorId) -> RoleResolution {
        self.inner.read().resolve_role(actor)
    }

    /// Consistent snapshot of the whole chain.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::capture(&self.inner.read())
    }

    /// Run `f` against the chain under the read lock.
    pub fn read_with<R>(&self, f: impl FnOnce(&PharmaChain) -> R) -> R {
        f(&self.inner.read())
    }
}
