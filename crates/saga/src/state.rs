//! Placement state machine.

use serde::{Deserialize, Serialize};

/// The state of one order placement.
///
/// State transitions:
/// ```text
/// Validating ──► Pricing ──► Deducting ──► Persisting ──┬──► Committed
///     │             │            │                     └──► Compensating ──┬──► Compensated
///     └─────────────┴────────────┴──► Aborted                             └──► CompensationFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlacementState {
    /// Stock is being validated with the catalog.
    #[default]
    Validating,

    /// Products are being looked up and the order priced.
    Pricing,

    /// Stock is being deducted. Past this point failures need compensation.
    Deducting,

    /// The order is being saved.
    Persisting,

    /// The order was saved (terminal state).
    Committed,

    /// The save failed and stock is being restored.
    Compensating,

    /// Stock was restored after a failed save (terminal state).
    Compensated,

    /// Stock could not be restored after a failed save (terminal state).
    CompensationFailed,

    /// A step before the save failed; nothing to undo (terminal state).
    Aborted,
}

impl PlacementState {
    /// Returns true if moving from `self` to `next` is a legal step.
    pub fn can_transition_to(&self, next: PlacementState) -> bool {
        use PlacementState::*;
        matches!(
            (self, next),
            (Validating, Pricing)
                | (Pricing, Deducting)
                | (Deducting, Persisting)
                | (Persisting, Committed)
                | (Persisting, Compensating)
                | (Compensating, Compensated)
                | (Compensating, CompensationFailed)
                | (Validating | Pricing | Deducting, Aborted)
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlacementState::Committed
                | PlacementState::Compensated
                | PlacementState::CompensationFailed
                | PlacementState::Aborted
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementState::Validating => "validating",
            PlacementState::Pricing => "pricing",
            PlacementState::Deducting => "deducting",
            PlacementState::Persisting => "persisting",
            PlacementState::Committed => "committed",
            PlacementState::Compensating => "compensating",
            PlacementState::Compensated => "compensated",
            PlacementState::CompensationFailed => "compensation_failed",
            PlacementState::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for PlacementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PlacementState; 9] = [
        PlacementState::Validating,
        PlacementState::Pricing,
        PlacementState::Deducting,
        PlacementState::Persisting,
        PlacementState::Committed,
        PlacementState::Compensating,
        PlacementState::Compensated,
        PlacementState::CompensationFailed,
        PlacementState::Aborted,
    ];

    #[test]
    fn test_default_state_is_validating() {
        assert_eq!(PlacementState::default(), PlacementState::Validating);
    }

    #[test]
    fn test_happy_path_transitions() {
        assert!(PlacementState::Validating.can_transition_to(PlacementState::Pricing));
        assert!(PlacementState::Pricing.can_transition_to(PlacementState::Deducting));
        assert!(PlacementState::Deducting.can_transition_to(PlacementState::Persisting));
        assert!(PlacementState::Persisting.can_transition_to(PlacementState::Committed));
    }

    #[test]
    fn test_no_transition_skips_a_step() {
        assert!(!PlacementState::Validating.can_transition_to(PlacementState::Deducting));
        assert!(!PlacementState::Pricing.can_transition_to(PlacementState::Persisting));
        assert!(!PlacementState::Deducting.can_transition_to(PlacementState::Committed));
    }

    #[test]
    fn test_only_persisting_can_compensate() {
        for state in ALL {
            assert_eq!(
                state.can_transition_to(PlacementState::Compensating),
                state == PlacementState::Persisting,
                "{state}"
            );
        }
    }

    #[test]
    fn test_abort_only_before_persisting() {
        assert!(PlacementState::Deducting.can_transition_to(PlacementState::Aborted));
        assert!(!PlacementState::Persisting.can_transition_to(PlacementState::Aborted));
        assert!(!PlacementState::Compensating.can_transition_to(PlacementState::Aborted));
    }

    #[test]
    fn test_terminal_states_have_no_successor() {
        for state in ALL.into_iter().filter(PlacementState::is_terminal) {
            assert!(ALL.iter().all(|next| !state.can_transition_to(*next)), "{state}");
        }
    }

    #[test]
    fn test_serialization() {
        let state = PlacementState::Compensating;
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: PlacementState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
