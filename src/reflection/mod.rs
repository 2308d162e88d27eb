//! Read-only introspection of a configured machine.
//!
//! [`StateMachine::info`](crate::StateMachine::info) produces a snapshot of
//! the configured states, their hierarchy and their fixed transitions. The
//! snapshot is name-based and serializable, suitable for export or diagram
//! generation; it does not observe runtime state.

use serde::Serialize;

/// Snapshot of the whole machine, states sorted by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StateMachineInfo {
    pub states: Vec<StateInfo>,
}

impl StateMachineInfo {
    /// Look up a state's info by name.
    pub fn state(&self, name: &str) -> Option<&StateInfo> {
        self.states.iter().find(|state| state.state == name)
    }
}

/// One configured state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StateInfo {
    /// The state's name.
    pub state: String,
    /// The superstate's name, when the state is nested.
    pub superstate: Option<String>,
    /// Direct substates, in configuration order.
    pub substates: Vec<String>,
    /// The initial-transition target, when one is configured.
    pub initial_transition_target: Option<String>,
    /// Fixed transitions out of this state, sorted by trigger then
    /// destination. Dynamic and internal behaviours are not listed; their
    /// destinations are not known statically.
    pub transitions: Vec<TransitionInfo>,
    /// Triggers this state swallows, sorted by name.
    pub ignored_triggers: Vec<String>,
}

/// One fixed transition: a `permit`-style or reentry behaviour.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransitionInfo {
    pub trigger: String,
    pub destination: String,
    /// Descriptions of the behaviour's guard conditions, in registration
    /// order.
    pub guard_descriptions: Vec<String>,
}
