// Copyright 2025 Cowboy AI, LLC.

//! Generic state machine traits used by the per-domain lifecycle tables
//! (task status, initiative stage, proposal status).
//!
//! These are Moore machines: the holon's current status is the state
//! itself, and a transition is a pure function from `(state, input)` to
//! either the next state or a rejection reason. No side effects live
//! here; callers record the resulting [`crate::event::Event`] themselves.

use std::fmt::Debug;

/// A state in a Moore-style state machine.
pub trait State: Clone + Debug + PartialEq + Send + Sync {
    /// Whether this state has no outgoing transitions.
    fn is_terminal(&self) -> bool;
}

/// Defines the legal transitions for a state machine: for a given current
/// state and input, either the next state or why the input is rejected.
pub trait Transitions {
    /// The type of state this machine transitions between.
    type State: State;
    /// The input that triggers a transition.
    type Input;

    /// Attempt a transition, returning the next state or a rejection
    /// reason.
    fn transition(
        &self,
        current: &Self::State,
        input: &Self::Input,
    ) -> Result<Self::State, String>;

    /// `true` if `input` would be accepted from `current` without
    /// committing to the transition.
    fn can_transition(&self, current: &Self::State, input: &Self::Input) -> bool {
        self.transition(current, input).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Light {
        Red,
        Green,
        Yellow,
    }

    impl State for Light {
        fn is_terminal(&self) -> bool {
            false
        }
    }

    struct LightTable;

    impl Transitions for LightTable {
        type State = Light;
        type Input = ();

        fn transition(&self, current: &Light, _input: &()) -> Result<Light, String> {
            match current {
                Light::Red => Ok(Light::Green),
                Light::Green => Ok(Light::Yellow),
                Light::Yellow => Ok(Light::Red),
            }
        }
    }

    #[test]
    fn cycles_through_states() {
        let table = LightTable;
        let mut state = Light::Red;
        for expected in [Light::Green, Light::Yellow, Light::Red] {
            state = table.transition(&state, &()).unwrap();
            assert_eq!(state, expected);
        }
    }
}
