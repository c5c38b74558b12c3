//! Flow state machine — tracks where a session is in the intake conversation.

use serde::{Deserialize, Serialize};

/// The states a session moves through.
///
/// Idle → (WaitingForForm) → FillingForm → FormComplete → AwaitingAgent →
/// InConversation. Any state can be reset back to Idle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    #[default]
    Idle,
    WaitingForForm,
    FillingForm,
    FormComplete,
    AwaitingAgent,
    InConversation,
}

impl FlowState {
    /// Check if a transition from `self` to `target` is valid.
    ///
    /// Reset is handled separately: it is allowed from every state.
    pub fn can_transition_to(&self, target: FlowState) -> bool {
        use FlowState::*;
        matches!(
            (self, target),
            (Idle, WaitingForForm)
                | (Idle, FillingForm)
                | (WaitingForForm, FillingForm)
                | (FillingForm, FormComplete)
                | (FormComplete, AwaitingAgent)
                | (AwaitingAgent, InConversation)
        )
    }

    /// Whether inbound text is treated as a form answer.
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::FillingForm)
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::WaitingForForm => "waiting_for_form",
            Self::FillingForm => "filling_form",
            Self::FormComplete => "form_complete",
            Self::AwaitingAgent => "awaiting_agent",
            Self::InConversation => "in_conversation",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [FlowState; 6] = [
        FlowState::Idle,
        FlowState::WaitingForForm,
        FlowState::FillingForm,
        FlowState::FormComplete,
        FlowState::AwaitingAgent,
        FlowState::InConversation,
    ];

    #[test]
    fn valid_transitions() {
        use FlowState::*;
        let transitions = [
            (Idle, WaitingForForm),
            (Idle, FillingForm),
            (WaitingForForm, FillingForm),
            (FillingForm, FormComplete),
            (FormComplete, AwaitingAgent),
            (AwaitingAgent, InConversation),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use FlowState::*;
        // Skip ahead
        assert!(!Idle.can_transition_to(FormComplete));
        assert!(!FillingForm.can_transition_to(AwaitingAgent));
        // Go backward
        assert!(!FormComplete.can_transition_to(FillingForm));
        assert!(!InConversation.can_transition_to(AwaitingAgent));
        // Restart without reset
        assert!(!AwaitingAgent.can_transition_to(FillingForm));
        // Self-transition
        for state in ALL {
            assert!(!state.can_transition_to(state), "{state} should not loop");
        }
    }

    #[test]
    fn only_filling_accepts_input() {
        for state in ALL {
            assert_eq!(state.accepts_input(), state == FlowState::FillingForm);
        }
    }

    #[test]
    fn display_matches_serde() {
        for state in ALL {
            let display = format!("{state}");
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(format!("\"{display}\""), json, "Display and serde should match for {state:?}");
        }
    }

    #[test]
    fn default_is_idle() {
        assert_eq!(FlowState::default(), FlowState::Idle);
    }
}
