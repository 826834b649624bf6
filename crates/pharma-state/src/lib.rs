//! # pharma-state: Custody State Machine
//!
//! The transition function at the heart of PharmaChain. Given a batch's
//! current lifecycle state, the acting actor's role, and a requested action,
//! it decides acceptance and computes the next state and custodian.
//!
//! ## States
//!
//! ```text
//! (none) ──Register──▶ Manufactured ──Ship──▶ InTransit ──Receive──▶ Delivered ──Verify──▶ Verified
//!                           │                     │                      │
//!                           └──────────┬──────────┴──────────────────────┘
//!                                      │
//!                        Recall ──▶ Recalled     Flag ──▶ Flagged
//! ```
//!
//! `Verified`, `Recalled`, and `Flagged` are terminal.
//!
//! ## Modules
//!
//! - [`role`]: the closed set of actor roles.
//! - [`custody`]: states, actions, the transition table as data, and the pure
//!   transition and custodian functions.
//! - [`product`]: the product descriptor committed at registration.
//! - [`record`]: hash-chained transition records and the batch projection.
//! - [`replay`]: folding a record sequence back into a projection.
//!
//! ## Design
//!
//! The transition table is a static slice keyed by (state, action) rather
//! than a typestate per lifecycle stage. Batches are addressed by identifier
//! at runtime and their state is only known after a ledger lookup, so every
//! check happens at runtime anyway; keeping the rules as data lets tests
//! enumerate them exhaustively.

pub mod custody;
pub mod product;
pub mod record;
pub mod replay;
pub mod role;

pub use custody::{
    next_custodian, rule, transition, Action, CustodyError, CustodyState, TransitionRule,
    TRANSITION_TABLE,
};
pub use product::{ProductDescriptor, ProductError, Registration};
pub use record::{Projection, RecordBody, TransitionRecord};
pub use replay::{replay, ReplayError};
pub use role::Role;
