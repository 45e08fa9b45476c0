//! Draft lifecycle
//!
//! Every session action moves the draft through [`DraftPhase`]; the save
//! action is only reachable from [`DraftPhase::Previewed`].

use crate::error::SessionError;
use serde::{Deserialize, Serialize};

/// Lifecycle of one draft inside a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DraftPhase {
    /// Nothing entered yet
    Empty,
    /// Fields changed since the last validation
    Editing,
    /// Last validation reported issues
    Rejected,
    /// Last validation was clean
    Clean,
    /// Preview shown, save action available
    Previewed,
    /// Row appended
    Submitted,
}

impl DraftPhase {
    /// Whether the save action may be offered
    #[inline]
    #[must_use]
    pub fn can_submit(&self) -> bool {
        matches!(self, DraftPhase::Previewed)
    }
}

/// Validates a phase transition.
pub fn validate_transition(from: DraftPhase, to: DraftPhase) -> Result<(), SessionError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(SessionError::IllegalTransition { from, to })
    }
}

/// Phases reachable in one step from `from`
#[must_use]
pub fn allowed_transitions(from: DraftPhase) -> Vec<DraftPhase> {
    use DraftPhase::*;
    match from {
        Empty => vec![Editing],
        Editing => vec![Editing, Rejected, Clean],
        Rejected => vec![Editing],
        Clean => vec![Editing, Previewed],
        Previewed => vec![Editing, Submitted],
        Submitted => vec![Empty],
    }
}

fn allowed(from: DraftPhase, to: DraftPhase) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
