//! Cluster lifecycle state machine.
//!
//! The platform drives every transition; this module only decides whether a
//! lifecycle call may be issued from the state last read.
//!
//! # State Machine
//!
//! ```text
//!   (create)
//!      │
//!      ▼
//! ┌─────────┐  (ready)   ┌─────────────┐  restart  ┌────────────┐
//! │ PENDING │───────────▶│   RUNNING   │──────────▶│ RESTARTING │
//! └────┬────┘            └──────┬──────┘◀──────────└─────┬──────┘
//!      │                  ▲     │ resize   (ready)       │
//!      │          (ready) │     ▼                        │
//!      │               ┌──┴───────┐                      │
//!      │               │ RESIZING │                      │
//!      │               └────┬─────┘                      │
//!      │ terminate          │ terminate                  │ terminate
//!      ▼                    ▼                            ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                      TERMINATING                         │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │ (done)
//!                              ▼
//!                       ┌────────────┐
//!                       │ TERMINATED │
//!                       └────────────┘
//! ```
//!
//! Any non-terminal state may move to `ERROR`. `TERMINATED` and `ERROR` are
//! terminal: only a permanent delete is accepted there.

use sparkdeck_api::types::ClusterState;
use sparkdeck_core::ClusterId;

use crate::error::{Error, Result};

/// A state-changing call on a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterOperation {
    /// Restart a running cluster.
    Restart,
    /// Change the worker count or autoscale bounds of a running cluster.
    Resize,
    /// Shut the cluster down.
    Terminate,
    /// Remove a terminated cluster for good.
    PermanentDelete,
}

impl ClusterOperation {
    /// Lowercase name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Restart => "restart",
            Self::Resize => "resize",
            Self::Terminate => "terminate",
            Self::PermanentDelete => "permanently delete",
        }
    }

    /// The transitional state the platform enters once the call is accepted.
    ///
    /// `None` for a permanent delete, which removes the record instead.
    #[must_use]
    pub const fn target_state(self) -> Option<ClusterState> {
        match self {
            Self::Restart => Some(ClusterState::Restarting),
            Self::Resize => Some(ClusterState::Resizing),
            Self::Terminate => Some(ClusterState::Terminating),
            Self::PermanentDelete => None,
        }
    }
}

/// Check if a state transition is valid according to the state machine.
#[must_use]
pub const fn is_valid_transition(from: ClusterState, to: ClusterState) -> bool {
    use ClusterState::{
        Error, Pending, Resizing, Restarting, Running, Terminated, Terminating, Unknown,
    };

    matches!(
        (from, to),
        (Pending | Restarting | Resizing, Running)
            | (Running, Restarting | Resizing)
            | (Running | Pending | Restarting | Resizing, Terminating)
            | (Terminating, Terminated)
            | (Pending | Running | Restarting | Resizing | Terminating | Unknown, Error)
    )
}

/// Returns the list of valid target states from the given state.
#[must_use]
pub fn valid_transitions_from(state: ClusterState) -> Vec<ClusterState> {
    use ClusterState::{
        Error, Pending, Resizing, Restarting, Running, Terminated, Terminating, Unknown,
    };

    match state {
        Pending | Restarting | Resizing => vec![Running, Terminating, Error],
        Running => vec![Restarting, Resizing, Terminating, Error],
        Terminating => vec![Terminated, Error],
        Unknown => vec![Error],
        Terminated | Error => vec![],
    }
}

/// Returns true if `operation` may be issued while the cluster is in `state`.
#[must_use]
pub const fn is_allowed(operation: ClusterOperation, state: ClusterState) -> bool {
    match operation.target_state() {
        Some(target) => is_valid_transition(state, target),
        None => is_terminal(state),
    }
}

/// Validates an operation against the state last read.
///
/// # Errors
///
/// Returns `Error::InvalidState` if the operation is not allowed.
pub fn validate_operation(
    cluster_id: &ClusterId,
    state: ClusterState,
    operation: ClusterOperation,
) -> Result<()> {
    if is_allowed(operation, state) {
        Ok(())
    } else {
        Err(Error::InvalidState {
            cluster_id: cluster_id.clone(),
            state,
            operation: operation.as_str(),
        })
    }
}

/// Returns true if the cluster is in a terminal state (terminated or error).
#[must_use]
pub const fn is_terminal(state: ClusterState) -> bool {
    matches!(state, ClusterState::Terminated | ClusterState::Error)
}

/// Returns true if `to` can still be reached from `from` through any chain
/// of transitions.
#[must_use]
pub fn can_reach(from: ClusterState, to: ClusterState) -> bool {
    let mut seen = vec![from];
    let mut frontier = vec![from];

    while let Some(state) = frontier.pop() {
        for next in valid_transitions_from(state) {
            if next == to {
                return true;
            }
            if !seen.contains(&next) {
                seen.push(next);
                frontier.push(next);
            }
        }
    }
    false
}
