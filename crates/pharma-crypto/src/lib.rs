//! # pharma-crypto: Actor Signatures
//!
//! Every actor in PharmaChain is identified by an Ed25519 public key
//! ([`pharma_core::ActorId`]). Action requests are signed over their
//! [`pharma_core::CanonicalBytes`] so that the ledger can authenticate the
//! submitter before resolving its role.
//!
//! ## Crate Policy
//!
//! - Depends only on `pharma-core` internally.
//! - Tests use real Ed25519 keys, never mocks.

pub mod ed25519;

pub use ed25519::{verify, Ed25519KeyPair, Ed25519Signature};
