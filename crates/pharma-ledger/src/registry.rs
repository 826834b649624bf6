//! # Identity & Role Registry
//!
//! Maps actor identifiers to roles. Every mutation is an append-only
//! [`RegistryEvent`]; the `{actor -> role, revoked}` table is a projection of
//! the event log and [`IdentityRegistry::from_events`] rebuilds it by replay.
//!
//! ## Authorization
//!
//! - `register_actor`: a non-revoked Regulator, or the deploying authority
//!   exactly once (bootstrap). The bootstrap is consumed only when it was the
//!   reason the call was allowed and the call succeeded.
//! - `revoke_actor`: a non-revoked Regulator only.
//!
//! Identifiers are never recycled: a revoked actor cannot be registered again.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pharma_core::{ActorId, Timestamp};
use pharma_state::Role;

use crate::error::LedgerError;

/// Result of looking up an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleResolution {
    /// Active with this role.
    Registered(Role),
    /// Held this role until revoked.
    Revoked(Role),
    /// Never registered.
    Unknown,
}

impl RoleResolution {
    /// The role if the actor is active.
    pub fn active(&self) -> Option<Role> {
        match self {
            Self::Registered(role) => Some(*role),
            Self::Revoked(_) | Self::Unknown => None,
        }
    }
}

/// Projection entry for one actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRecord {
    /// Role assigned at registration. Never changes.
    pub role: Role,
    /// Whether the actor has been revoked.
    pub revoked: bool,
}

/// What a registry event did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistryEventKind {
    /// An actor received a role.
    Registered {
        /// The new actor.
        actor: ActorId,
        /// Its role.
        role: Role,
    },
    /// An actor was revoked.
    Revoked {
        /// The revoked actor.
        actor: ActorId,
    },
}

/// One entry of the registry's append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEvent {
    /// Position in the log, starting at 1.
    pub sequence: u64,
    /// Who performed the mutation.
    pub caller: ActorId,
    /// When it was accepted.
    pub timestamp: Timestamp,
    /// The mutation.
    #[serde(flatten)]
    pub kind: RegistryEventKind,
}

/// The identity and role registry.
#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    authority: ActorId,
    bootstrap_consumed: bool,
    actors: BTreeMap<ActorId, ActorRecord>,
    events: Vec<RegistryEvent>,
}

impl IdentityRegistry {
    /// Empty registry whose one-time bootstrap belongs to `authority`.
    pub fn new(authority: ActorId) -> Self {
        Self {
            authority,
            bootstrap_consumed: false,
            actors: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Rebuild a registry by replaying its event log.
    ///
    /// Every event is re-authorized against the state built so far. A gap in
    /// numbering or an event that would not have been accepted fails with
    /// `ConsistencyViolation`.
    pub fn from_events<I>(authority: ActorId, events: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = RegistryEvent>,
    {
        let mut registry = Self::new(authority);
        for event in events {
            let expected = registry.next_sequence();
            if event.sequence != expected {
                return Err(LedgerError::consistency(format!(
                    "registry event sequence {} where {expected} was expected",
                    event.sequence
                )));
            }
            let replayed = match event.kind {
                RegistryEventKind::Registered { actor, role } => {
                    registry.apply_register(event.caller, actor, role, event.timestamp)
                }
                RegistryEventKind::Revoked { actor } => {
                    registry.apply_revoke(event.caller, actor, event.timestamp)
                }
            };
            replayed.map_err(|e| {
                LedgerError::consistency(format!(
                    "registry event {} does not replay: {e}",
                    event.sequence
                ))
            })?;
        }
        Ok(registry)
    }

    /// Assign `role` to `actor`.
    pub fn register_actor(
        &mut self,
        caller: ActorId,
        actor: ActorId,
        role: Role,
    ) -> Result<&RegistryEvent, LedgerError> {
        self.apply_register(caller, actor, role, Timestamp::now())
    }

    /// Revoke `actor`. Past transition records are untouched.
    pub fn revoke_actor(
        &mut self,
        caller: ActorId,
        actor: ActorId,
    ) -> Result<&RegistryEvent, LedgerError> {
        self.apply_revoke(caller, actor, Timestamp::now())
    }

    /// Look up an actor's standing.
    pub fn resolve_role(&self, actor: &ActorId) -> RoleResolution {
        match self.actors.get(actor) {
            Some(ActorRecord {
                role,
                revoked: false,
            }) => RoleResolution::Registered(*role),
            Some(ActorRecord {
                role,
                revoked: true,
            }) => RoleResolution::Revoked(*role),
            None => RoleResolution::Unknown,
        }
    }

    /// The actor's role if it is registered and not revoked.
    pub fn active_role(&self, actor: &ActorId) -> Option<Role> {
        self.resolve_role(actor).active()
    }

    /// The event log, oldest first.
    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    /// Every actor ever registered, in identifier order.
    pub fn actors(&self) -> impl Iterator<Item = (&ActorId, &ActorRecord)> {
        self.actors.iter()
    }

    /// The deploying authority.
    pub fn authority(&self) -> ActorId {
        self.authority
    }

    /// Whether the one-time bootstrap registration has been used.
    pub fn bootstrap_consumed(&self) -> bool {
        self.bootstrap_consumed
    }

    fn next_sequence(&self) -> u64 {
        self.events.len() as u64 + 1
    }

    fn apply_register(
        &mut self,
        caller: ActorId,
        actor: ActorId,
        role: Role,
        timestamp: Timestamp,
    ) -> Result<&RegistryEvent, LedgerError> {
        let via_bootstrap = if self.active_role(&caller) == Some(Role::Regulator) {
            false
        } else if caller == self.authority && !self.bootstrap_consumed {
            true
        } else {
            tracing::warn!(caller = %caller, actor = %actor, "registration rejected: caller lacks authority");
            return Err(LedgerError::unauthorized(format!(
                "{caller} may not register actors"
            )));
        };
        if self.actors.contains_key(&actor) {
            return Err(LedgerError::AlreadyRegistered { actor });
        }

        self.actors.insert(
            actor,
            ActorRecord {
                role,
                revoked: false,
            },
        );
        if via_bootstrap {
            self.bootstrap_consumed = true;
        }
        tracing::info!(actor = %actor, role = %role, bootstrap = via_bootstrap, "actor registered");
        Ok(self.push(caller, timestamp, RegistryEventKind::Registered { actor, role }))
    }

    fn apply_revoke(
        &mut self,
        caller: ActorId,
        actor: ActorId,
        timestamp: Timestamp,
    ) -> Result<&RegistryEvent, LedgerError> {
        if self.active_role(&caller) != Some(Role::Regulator) {
            tracing::warn!(caller = %caller, actor = %actor, "revocation rejected: caller is not a regulator");
            return Err(LedgerError::unauthorized(format!(
                "{caller} may not revoke actors"
            )));
        }
        let record = self
            .actors
            .get_mut(&actor)
            .ok_or_else(|| LedgerError::not_found(format!("actor {actor}")))?;
        if record.revoked {
            return Err(LedgerError::invalid(format!("actor {actor} is already revoked")));
        }
        record.revoked = true;
        tracing::info!(actor = %actor, "actor revoked");
        Ok(self.push(caller, timestamp, RegistryEventKind::Revoked { actor }))
    }

    fn push(
        &mut self,
        caller: ActorId,
        timestamp: Timestamp,
        kind: RegistryEventKind,
    ) -> &RegistryEvent {
        let sequence = self.next_sequence();
        self.events.push(RegistryEvent {
            sequence,
            caller,
            timestamp,
            kind,
        });
        &self.events[self.events.len() - 1]
    }
}
