//! # pharma-core: Foundational Types for PharmaChain
//!
//! The leaf crate of the PharmaChain workspace. Every other crate depends on
//! it; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype identifiers.** `ActorId`, `BatchId`, and `RequestId` are
//!    distinct types. A batch number cannot be passed where an actor key is
//!    expected.
//!
//! 2. **`CanonicalBytes` for every digest and signature.** Record digests and
//!    signed submissions are computed over RFC 8785 (JCS) bytes only, so two
//!    independent verifiers always hash the same byte sequence.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is UTC, second precision, rendered
//!    with a `Z` suffix, which keeps canonical bytes deterministic.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `pharma-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod hex;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, CryptoError, PharmaError};
pub use identity::{ActorId, BatchId, RequestId};
pub use temporal::Timestamp;
