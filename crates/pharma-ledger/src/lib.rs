//! # pharma-ledger: Batch Ledger and Registry for PharmaChain
//!
//! Everything that holds state lives here:
//!
//! - [`IdentityRegistry`]: actor identifiers to roles, as an append-only
//!   event log with a rebuilt projection.
//! - [`BatchLedger`]: the authoritative store of batches and their
//!   hash-chained histories. `register` and compare-and-append `append` are
//!   its only mutations.
//! - [`Verifier`]: provenance verification and custody traces. Read-only.
//! - [`PharmaChain`]: the submission facade. Verifies signatures, resolves
//!   roles and recipients through the registry, then hands a
//!   [`RecordDraft`] to the ledger.
//! - [`SharedChain`]: `Arc<RwLock<PharmaChain>>` for concurrent hosts.
//! - [`LedgerSnapshot`]: JSON persistence, checked by full replay on load.
//! - [`ChainConfig`]: YAML configuration.
//!
//! ## Invariants
//!
//! - A batch's projection is only ever produced by folding its history, so
//!   `verify_provenance` succeeds for every batch the ledger built itself.
//! - Sequence numbers are contiguous from 1 and every record links to the
//!   digest of the one before it.
//! - A signed submission keeps its signature in the record it produced, and
//!   the Register record commits the product descriptor, so verification can
//!   tell a rewritten record from the one the actor signed.
//! - A rejected submission changes nothing: all validation precedes the
//!   single commit point.

pub mod batch;
pub mod chain;
pub mod config;
pub mod error;
pub mod ledger;
pub mod query;
pub mod registry;
pub mod shared;
pub mod snapshot;
pub mod submission;

pub use batch::{Batch, ProductDescriptor};
pub use chain::PharmaChain;
pub use config::{ChainConfig, LedgerConfig, DEFAULT_MAX_METADATA_LEN};
pub use error::{ErrorKind, LedgerError};
pub use ledger::{BatchLedger, History, RecordDraft};
pub use query::{CustodyStep, ProvenanceReport, Verifier};
pub use registry::{
    ActorRecord, IdentityRegistry, RegistryEvent, RegistryEventKind, RoleResolution,
};
pub use shared::SharedChain;
pub use snapshot::{BatchSnapshot, LedgerSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use submission::{
    check_record_signature, ActionRequest, Attributed, BatchTarget, RegistryCommand, RegistryOp,
    Signed, SubmissionReceipt,
};
