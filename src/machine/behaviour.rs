//! Trigger behaviours: what a state does when a trigger fires.

use std::sync::Arc;

use crate::core::guard::TransitionGuard;
use crate::core::params::TriggerArg;
use crate::core::state::{State, Trigger};
use crate::machine::actions::InternalActionBehaviour;

/// Computes a destination from the fired arguments at fire time.
pub(crate) type DynamicSelector<S> = Arc<dyn Fn(&[TriggerArg]) -> S + Send + Sync>;

/// The five ways a state can respond to a trigger.
#[derive(Clone)]
pub(crate) enum TriggerBehaviourKind<S: State, T: Trigger> {
    /// Move to a fixed destination.
    Transitioning { destination: S },
    /// Exit and reenter the configured state, running only its local exit
    /// and entry actions.
    Reentry { destination: S },
    /// Run an action without exiting or entering any state.
    Internal {
        action: InternalActionBehaviour<S, T>,
    },
    /// Swallow the trigger: no state change, no actions, no listeners.
    Ignored,
    /// Move to a destination computed from the fired arguments.
    Dynamic { selector: DynamicSelector<S> },
}

/// A behaviour registered on a state for one trigger, gated by a guard.
#[derive(Clone)]
pub(crate) struct TriggerBehaviour<S: State, T: Trigger> {
    pub(crate) trigger: T,
    pub(crate) guard: TransitionGuard,
    pub(crate) kind: TriggerBehaviourKind<S, T>,
}

impl<S: State, T: Trigger> TriggerBehaviour<S, T> {
    pub(crate) fn new(trigger: T, guard: TransitionGuard, kind: TriggerBehaviourKind<S, T>) -> Self {
        Self {
            trigger,
            guard,
            kind,
        }
    }

    pub(crate) fn unmet_guard_conditions(&self, args: &[TriggerArg]) -> Vec<String> {
        self.guard.unmet_conditions(args)
    }
}

/// Outcome of handler resolution: the chosen behaviour and, when it was
/// blocked, the guard descriptions that failed.
pub(crate) struct HandlerResult<S: State, T: Trigger> {
    pub(crate) behaviour: TriggerBehaviour<S, T>,
    pub(crate) unmet_guard_conditions: Vec<String>,
}
