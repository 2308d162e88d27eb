//! The per-state configuration record.

use std::collections::HashMap;

use crate::core::params::TriggerArg;
use crate::core::state::{State, Trigger};
use crate::error::TransitionError;
use crate::machine::actions::{
    ActivationActionBehaviour, EntryActionBehaviour, ExitActionBehaviour,
};
use crate::machine::behaviour::{HandlerResult, TriggerBehaviour};

/// Everything the machine knows about one state: its trigger behaviours,
/// action lists and position in the hierarchy.
///
/// Hierarchy links are plain state ids. The representation table owns every
/// record; superstate back-references and substate forward references are
/// resolved through it, so the hierarchy carries no ownership cycles.
pub(crate) struct StateRepresentation<S: State, T: Trigger> {
    pub(crate) state: S,
    /// Behaviours per trigger, in registration order. Several behaviours per
    /// trigger are legal as long as at most one has all guards met.
    pub(crate) trigger_behaviours: HashMap<T, Vec<TriggerBehaviour<S, T>>>,
    pub(crate) entry_actions: Vec<EntryActionBehaviour<S, T>>,
    pub(crate) exit_actions: Vec<ExitActionBehaviour<S, T>>,
    pub(crate) activate_actions: Vec<ActivationActionBehaviour>,
    pub(crate) deactivate_actions: Vec<ActivationActionBehaviour>,
    pub(crate) superstate: Option<S>,
    pub(crate) substates: Vec<S>,
    pub(crate) initial_transition_target: Option<S>,
    /// Set once activation actions have run; keeps activation idempotent.
    pub(crate) active: bool,
}

impl<S: State, T: Trigger> StateRepresentation<S, T> {
    pub(crate) fn new(state: S) -> Self {
        Self {
            state,
            trigger_behaviours: HashMap::new(),
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            activate_actions: Vec::new(),
            deactivate_actions: Vec::new(),
            superstate: None,
            substates: Vec::new(),
            initial_transition_target: None,
            active: false,
        }
    }

    pub(crate) fn add_trigger_behaviour(&mut self, behaviour: TriggerBehaviour<S, T>) {
        self.trigger_behaviours
            .entry(behaviour.trigger.clone())
            .or_default()
            .push(behaviour);
    }

    /// Resolve this state's own behaviours for `trigger`.
    ///
    /// Returns the single fully-met candidate, or the first guard-blocked
    /// candidate (carrying its unmet descriptions) for diagnostics, or `None`
    /// when the trigger has no behaviour here at all. Two or more fully-met
    /// candidates are a configuration error.
    pub(crate) fn try_find_local_handler(
        &self,
        trigger: &T,
        args: &[TriggerArg],
    ) -> Result<Option<HandlerResult<S, T>>, TransitionError> {
        let Some(candidates) = self.trigger_behaviours.get(trigger) else {
            return Ok(None);
        };

        let evaluated: Vec<(&TriggerBehaviour<S, T>, Vec<String>)> = candidates
            .iter()
            .map(|behaviour| (behaviour, behaviour.unmet_guard_conditions(args)))
            .collect();

        let met_count = evaluated
            .iter()
            .filter(|(_, unmet)| unmet.is_empty())
            .count();
        if met_count > 1 {
            return Err(TransitionError::MultiplePermittedTransitions {
                state: self.state.name().to_string(),
                trigger: trigger.name().to_string(),
            });
        }

        if let Some((behaviour, _)) = evaluated.iter().find(|(_, unmet)| unmet.is_empty()) {
            return Ok(Some(HandlerResult {
                behaviour: (*behaviour).clone(),
                unmet_guard_conditions: Vec::new(),
            }));
        }

        Ok(evaluated
            .into_iter()
            .next()
            .map(|(behaviour, unmet)| HandlerResult {
                behaviour: behaviour.clone(),
                unmet_guard_conditions: unmet,
            }))
    }

    /// Triggers with at least one fully-met behaviour on this state.
    pub(crate) fn permitted_local_triggers(&self, args: &[TriggerArg]) -> Vec<T> {
        self.trigger_behaviours
            .iter()
            .filter(|(_, candidates)| candidates.iter().any(|b| b.guard.is_met(args)))
            .map(|(trigger, _)| trigger.clone())
            .collect()
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::guard::TransitionGuard;
    use crate::machine::behaviour::TriggerBehaviourKind;
    use crate::{state_enum, trigger_enum};

    state_enum! {
        enum TestState {
            Start,
            Stop,
            Pause,
        }
    }

    trigger_enum! {
        enum TestTrigger {
            Toggle,
            Reset,
        }
    }

    fn transitioning(
        trigger: TestTrigger,
        destination: TestState,
        guard: TransitionGuard,
    ) -> TriggerBehaviour<TestState, TestTrigger> {
        TriggerBehaviour::new(trigger, guard, TriggerBehaviourKind::Transitioning { destination })
    }

    fn destination_of(behaviour: &TriggerBehaviour<TestState, TestTrigger>) -> Option<TestState> {
        match &behaviour.kind {
            TriggerBehaviourKind::Transitioning { destination } => Some(destination.clone()),
            _ => None,
        }
    }

    #[test]
    fn missing_trigger_yields_no_candidate() {
        let rep: StateRepresentation<TestState, TestTrigger> =
            StateRepresentation::new(TestState::Start);

        let result = rep.try_find_local_handler(&TestTrigger::Toggle, &[]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn single_met_candidate_is_selected() {
        let mut rep = StateRepresentation::new(TestState::Start);
        rep.add_trigger_behaviour(transitioning(
            TestTrigger::Toggle,
            TestState::Stop,
            TransitionGuard::empty(),
        ));

        let result = rep
            .try_find_local_handler(&TestTrigger::Toggle, &[])
            .unwrap()
            .expect("candidate expected");
        assert!(result.unmet_guard_conditions.is_empty());
        assert_eq!(destination_of(&result.behaviour), Some(TestState::Stop));
    }

    #[test]
    fn blocked_candidate_reports_unmet_guards() {
        let mut rep = StateRepresentation::new(TestState::Start);
        rep.add_trigger_behaviour(transitioning(
            TestTrigger::Toggle,
            TestState::Stop,
            TransitionGuard::single(|_| false, "switch armed"),
        ));

        let result = rep
            .try_find_local_handler(&TestTrigger::Toggle, &[])
            .unwrap()
            .expect("blocked candidate expected");
        assert_eq!(
            result.unmet_guard_conditions,
            vec!["switch armed".to_string()]
        );
    }

    #[test]
    fn guard_picks_between_competing_candidates() {
        let mut rep = StateRepresentation::new(TestState::Start);
        rep.add_trigger_behaviour(transitioning(
            TestTrigger::Toggle,
            TestState::Stop,
            TransitionGuard::single(|_| false, "stopped"),
        ));
        rep.add_trigger_behaviour(transitioning(
            TestTrigger::Toggle,
            TestState::Pause,
            TransitionGuard::single(|_| true, "paused"),
        ));

        let result = rep
            .try_find_local_handler(&TestTrigger::Toggle, &[])
            .unwrap()
            .expect("candidate expected");
        assert_eq!(destination_of(&result.behaviour), Some(TestState::Pause));
    }

    #[test]
    fn two_met_candidates_are_a_configuration_error() {
        let mut rep = StateRepresentation::new(TestState::Start);
        rep.add_trigger_behaviour(transitioning(
            TestTrigger::Toggle,
            TestState::Stop,
            TransitionGuard::empty(),
        ));
        rep.add_trigger_behaviour(transitioning(
            TestTrigger::Toggle,
            TestState::Pause,
            TransitionGuard::empty(),
        ));

        let result = rep.try_find_local_handler(&TestTrigger::Toggle, &[]);
        assert!(matches!(
            result,
            Err(TransitionError::MultiplePermittedTransitions { .. })
        ));
    }

    #[test]
    fn permitted_triggers_require_a_met_candidate() {
        let mut rep = StateRepresentation::new(TestState::Start);
        rep.add_trigger_behaviour(transitioning(
            TestTrigger::Toggle,
            TestState::Stop,
            TransitionGuard::empty(),
        ));
        rep.add_trigger_behaviour(transitioning(
            TestTrigger::Reset,
            TestState::Start,
            TransitionGuard::single(|_| false, "reset allowed"),
        ));

        let permitted = rep.permitted_local_triggers(&[]);
        assert_eq!(permitted, vec![TestTrigger::Toggle]);
    }
}
