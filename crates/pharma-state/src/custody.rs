//! # Custody Transitions
//!
//! Lifecycle states, actions, and the transition table.
//!
//! | Current | Action | Allowed roles | Next |
//! |---|---|---|---|
//! | (none) | Register | Manufacturer | Manufactured |
//! | Manufactured | Ship | Manufacturer, Distributor | InTransit |
//! | InTransit | Receive | Distributor, Pharmacy | Delivered |
//! | Delivered | Verify | Pharmacy, Regulator | Verified |
//! | Manufactured, InTransit, Delivered | Recall | Manufacturer, Regulator | Recalled |
//! | Manufactured, InTransit, Delivered | Flag | Regulator | Flagged |
//!
//! A (state, action) pair missing from the table is an
//! [`CustodyError::InvalidTransition`]. A pair that exists but does not list
//! the actor's role is [`CustodyError::Unauthorized`]. Both functions here
//! are pure: the same inputs always give the same outputs, which is what lets
//! an independent verifier replay a history and reach the same projection.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pharma_core::ActorId;

use crate::role::Role;

// ─── States ──────────────────────────────────────────────────────────

/// Lifecycle state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustodyState {
    /// Registered by its manufacturer.
    Manufactured,
    /// Shipped, not yet received.
    InTransit,
    /// Received at its destination.
    Delivered,
    /// Authenticity confirmed (terminal).
    Verified,
    /// Withdrawn from the supply chain (terminal).
    Recalled,
    /// Suspected counterfeit or tampered (terminal).
    Flagged,
}

impl CustodyState {
    /// Every state, in lifecycle order.
    pub const ALL: [CustodyState; 6] = [
        CustodyState::Manufactured,
        CustodyState::InTransit,
        CustodyState::Delivered,
        CustodyState::Verified,
        CustodyState::Recalled,
        CustodyState::Flagged,
    ];

    /// Whether no ordinary transition may leave this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::Recalled | Self::Flagged)
    }

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manufactured => "MANUFACTURED",
            Self::InTransit => "IN_TRANSIT",
            Self::Delivered => "DELIVERED",
            Self::Verified => "VERIFIED",
            Self::Recalled => "RECALLED",
            Self::Flagged => "FLAGGED",
        }
    }
}

impl std::fmt::Display for CustodyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

fn state_name(state: Option<CustodyState>) -> String {
    state.map_or_else(|| "NONE".to_string(), |s| s.to_string())
}

// ─── Actions ─────────────────────────────────────────────────────────

/// An action an actor can request against a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Create a new batch.
    Register,
    /// Hand the batch to a carrier or downstream party.
    Ship,
    /// Take delivery of a shipped batch.
    Receive,
    /// Confirm authenticity of a delivered batch.
    Verify,
    /// Withdraw the batch.
    Recall,
    /// Mark the batch as suspected counterfeit or tampered.
    Flag,
}

impl Action {
    /// Every action.
    pub const ALL: [Action; 6] = [
        Action::Register,
        Action::Ship,
        Action::Receive,
        Action::Verify,
        Action::Recall,
        Action::Flag,
    ];

    /// Whether the action moves custody and may name a recipient.
    pub fn transfers_custody(&self) -> bool {
        matches!(self, Self::Ship | Self::Receive)
    }

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "REGISTER",
            Self::Ship => "SHIP",
            Self::Receive => "RECEIVE",
            Self::Verify => "VERIFY",
            Self::Recall => "RECALL",
            Self::Flag => "FLAG",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown action {s:?}"))
    }
}

// ─── Transition Table ────────────────────────────────────────────────

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    /// Required current state; `None` means the batch does not exist yet.
    pub from: Option<CustodyState>,
    /// The requested action.
    pub action: Action,
    /// Roles permitted to perform the action from `from`.
    pub roles: &'static [Role],
    /// Resulting state.
    pub to: CustodyState,
}

const SHIP_ROLES: &[Role] = &[Role::Manufacturer, Role::Distributor];
const RECEIVE_ROLES: &[Role] = &[Role::Distributor, Role::Pharmacy];
const VERIFY_ROLES: &[Role] = &[Role::Pharmacy, Role::Regulator];
const RECALL_ROLES: &[Role] = &[Role::Manufacturer, Role::Regulator];
const FLAG_ROLES: &[Role] = &[Role::Regulator];

/// The complete custody rule set, one row per (state, action) pair.
pub const TRANSITION_TABLE: &[TransitionRule] = &[
    TransitionRule {
        from: None,
        action: Action::Register,
        roles: &[Role::Manufacturer],
        to: CustodyState::Manufactured,
    },
    TransitionRule {
        from: Some(CustodyState::Manufactured),
        action: Action::Ship,
        roles: SHIP_ROLES,
        to: CustodyState::InTransit,
    },
    TransitionRule {
        from: Some(CustodyState::InTransit),
        action: Action::Receive,
        roles: RECEIVE_ROLES,
        to: CustodyState::Delivered,
    },
    TransitionRule {
        from: Some(CustodyState::Delivered),
        action: Action::Verify,
        roles: VERIFY_ROLES,
        to: CustodyState::Verified,
    },
    TransitionRule {
        from: Some(CustodyState::Manufactured),
        action: Action::Recall,
        roles: RECALL_ROLES,
        to: CustodyState::Recalled,
    },
    TransitionRule {
        from: Some(CustodyState::InTransit),
        action: Action::Recall,
        roles: RECALL_ROLES,
        to: CustodyState::Recalled,
    },
    TransitionRule {
        from: Some(CustodyState::Delivered),
        action: Action::Recall,
        roles: RECALL_ROLES,
        to: CustodyState::Recalled,
    },
    TransitionRule {
        from: Some(CustodyState::Manufactured),
        action: Action::Flag,
        roles: FLAG_ROLES,
        to: CustodyState::Flagged,
    },
    TransitionRule {
        from: Some(CustodyState::InTransit),
        action: Action::Flag,
        roles: FLAG_ROLES,
        to: CustodyState::Flagged,
    },
    TransitionRule {
        from: Some(CustodyState::Delivered),
        action: Action::Flag,
        roles: FLAG_ROLES,
        to: CustodyState::Flagged,
    },
];

/// Look up the rule for a (state, action) pair.
pub fn rule(current: Option<CustodyState>, action: Action) -> Option<&'static TransitionRule> {
    TRANSITION_TABLE
        .iter()
        .find(|r| r.from == current && r.action == action)
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Rejection reasons from the custody state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    /// The (state, action) pair is not in the transition table.
    #[error("invalid transition: {action} is not defined for state {from}")]
    InvalidTransition {
        /// Current state name, or `NONE` for an unregistered batch.
        from: String,
        /// The requested action.
        action: Action,
    },

    /// A recipient was named on an action that does not move custody.
    #[error("{action} does not take a recipient")]
    RecipientNotApplicable {
        /// The requested action.
        action: Action,
    },

    /// The actor's role is not in the allowed set for this transition.
    #[error("role {role} may not perform {action} from state {from}")]
    Unauthorized {
        /// Current state name.
        from: String,
        /// The requested action.
        action: Action,
        /// The actor's role.
        role: Role,
    },
}

// ─── Transition Functions ────────────────────────────────────────────

/// Compute the next state for `action` performed by an actor holding `role`.
///
/// # Errors
///
/// `InvalidTransition` if the pair is absent from [`TRANSITION_TABLE`]
/// (this covers every action on a terminal state), `Unauthorized` if the
/// role is not allowed.
pub fn transition(
    current: Option<CustodyState>,
    action: Action,
    role: Role,
) -> Result<CustodyState, CustodyError> {
    let rule = rule(current, action).ok_or_else(|| CustodyError::InvalidTransition {
        from: state_name(current),
        action,
    })?;
    if !rule.roles.contains(&role) {
        return Err(CustodyError::Unauthorized {
            from: state_name(current),
            action,
            role,
        });
    }
    Ok(rule.to)
}

/// Compute the custodian after `action`.
///
/// Register makes the actor the custodian. Ship and Receive hand custody to
/// `recipient` when one is named, otherwise to the actor. Verify, Recall,
/// and Flag leave custody unchanged and reject a recipient. Checking that
/// the recipient is a registered, non-revoked actor is the registry's job.
pub fn next_custodian(
    action: Action,
    current: Option<ActorId>,
    actor: ActorId,
    recipient: Option<ActorId>,
) -> Result<ActorId, CustodyError> {
    if recipient.is_some() && !action.transfers_custody() {
        return Err(CustodyError::RecipientNotApplicable { action });
    }
    match (action, current) {
        (Action::Register, _) => Ok(actor),
        (Action::Ship | Action::Receive, _) => Ok(recipient.unwrap_or(actor)),
        (_, Some(custodian)) => Ok(custodian),
        (_, None) => Err(CustodyError::InvalidTransition {
            from: state_name(None),
            action,
        }),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn all_sources() -> Vec<Option<CustodyState>> {
        std::iter::once(None)
            .chain(CustodyState::ALL.into_iter().map(Some))
            .collect()
    }

    fn actor(n: u8) -> ActorId {
        ActorId::from_bytes([n; 32])
    }

    #[test]
    fn test_table_has_one_rule_per_pair() {
        for (i, a) in TRANSITION_TABLE.iter().enumerate() {
            for b in &TRANSITION_TABLE[i + 1..] {
                assert!(
                    !(a.from == b.from && a.action == b.action),
                    "duplicate rule for {:?}/{}",
                    a.from,
                    a.action
                );
            }
        }
    }

    #[test]
    fn test_exhaustive_state_action_role() {
        for from in all_sources() {
            for action in Action::ALL {
                for role in Role::ALL {
                    let result = transition(from, action, role);
                    match rule(from, action) {
                        None => assert!(
                            matches!(result, Err(CustodyError::InvalidTransition { .. })),
                            "{from:?}/{action}/{role} should be invalid, got {result:?}"
                        ),
                        Some(r) if !r.roles.contains(&role) => assert!(
                            matches!(result, Err(CustodyError::Unauthorized { .. })),
                            "{from:?}/{action}/{role} should be unauthorized, got {result:?}"
                        ),
                        Some(r) => assert_eq!(result, Ok(r.to)),
                    }
                }
            }
        }
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for state in CustodyState::ALL.into_iter().filter(CustodyState::is_terminal) {
            for action in Action::ALL {
                for role in Role::ALL {
                    assert!(matches!(
                        transition(Some(state), action, role),
                        Err(CustodyError::InvalidTransition { .. })
                    ));
                }
            }
        }
    }

    #[test]
    fn test_happy_path() {
        let s = transition(None, Action::Register, Role::Manufacturer).unwrap();
        assert_eq!(s, CustodyState::Manufactured);
        let s = transition(Some(s), Action::Ship, Role::Manufacturer).unwrap();
        assert_eq!(s, CustodyState::InTransit);
        let s = transition(Some(s), Action::Receive, Role::Pharmacy).unwrap();
        assert_eq!(s, CustodyState::Delivered);
        let s = transition(Some(s), Action::Verify, Role::Regulator).unwrap();
        assert_eq!(s, CustodyState::Verified);
        assert!(s.is_terminal());
    }

    #[test]
    fn test_pharmacy_cannot_ship() {
        let err = transition(Some(CustodyState::Manufactured), Action::Ship, Role::Pharmacy)
            .unwrap_err();
        assert_eq!(
            err,
            CustodyError::Unauthorized {
                from: "MANUFACTURED".into(),
                action: Action::Ship,
                role: Role::Pharmacy,
            }
        );
    }

    #[test]
    fn test_register_on_existing_batch_is_invalid() {
        assert!(matches!(
            transition(Some(CustodyState::Manufactured), Action::Register, Role::Manufacturer),
            Err(CustodyError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_only_regulator_flags() {
        for role in Role::ALL {
            let result = transition(Some(CustodyState::InTransit), Action::Flag, role);
            assert_eq!(result.is_ok(), role == Role::Regulator);
        }
    }

    #[test]
    fn test_custodian_rules() {
        let (m, d, p) = (actor(1), actor(2), actor(3));
        assert_eq!(next_custodian(Action::Register, None, m, None), Ok(m));
        assert_eq!(next_custodian(Action::Ship, Some(m), m, Some(d)), Ok(d));
        assert_eq!(next_custodian(Action::Ship, Some(m), m, None), Ok(m));
        assert_eq!(next_custodian(Action::Receive, Some(d), p, None), Ok(p));
        assert_eq!(next_custodian(Action::Verify, Some(p), actor(9), None), Ok(p));
        assert_eq!(next_custodian(Action::Recall, Some(p), m, None), Ok(p));
    }

    #[test]
    fn test_recipient_rejected_on_non_transfer() {
        for action in [Action::Register, Action::Verify, Action::Recall, Action::Flag] {
            assert_eq!(
                next_custodian(action, Some(actor(1)), actor(1), Some(actor(2))),
                Err(CustodyError::RecipientNotApplicable { action })
            );
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(CustodyState::InTransit.to_string(), "IN_TRANSIT");
        assert_eq!(Action::Receive.to_string(), "RECEIVE");
        assert_eq!("ship".parse::<Action>().unwrap(), Action::Ship);
        assert_eq!(
            serde_json::to_string(&CustodyState::InTransit).unwrap(),
            "\"IN_TRANSIT\""
        );
    }
}
