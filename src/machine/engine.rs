//! The transition engine: handler resolution across the hierarchy, exit and
//! entry walks, initial-transition expansion and the firing-mode queue
//! discipline.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, trace};

use crate::core::params::TriggerArg;
use crate::core::state::{State, Trigger};
use crate::core::transition::Transition;
use crate::error::TransitionError;
use crate::machine::actions::{TriggerSink, UnhandledTriggerCallback};
use crate::machine::behaviour::{HandlerResult, TriggerBehaviourKind};
use crate::machine::{FiringMode, PendingFire, StateMachine};

impl<S: State, T: Trigger> StateMachine<S, T> {
    /// Resolve a handler for `trigger`, starting at `state` and ascending
    /// the superstate chain.
    ///
    /// Only a total miss falls through to the superstate: a guard-blocked
    /// local behaviour shadows anything an ancestor declares for the same
    /// trigger.
    pub(crate) fn find_handler(
        &self,
        state: &S,
        trigger: &T,
        args: &[TriggerArg],
    ) -> Result<Option<HandlerResult<S, T>>, TransitionError> {
        let mut cursor = state.clone();
        loop {
            let Some(rep) = self.representations.get(&cursor) else {
                return Ok(None);
            };
            if let Some(result) = rep.try_find_local_handler(trigger, args)? {
                return Ok(Some(result));
            }
            match &rep.superstate {
                Some(superstate) => cursor = superstate.clone(),
                None => return Ok(None),
            }
        }
    }

    /// True when `other` equals `state` or lies in `state`'s subtree.
    pub(crate) fn state_includes(&self, state: &S, other: &S) -> bool {
        if state == other {
            return true;
        }
        self.representations
            .get(state)
            .is_some_and(|rep| rep.substates.iter().any(|sub| self.state_includes(sub, other)))
    }

    /// True when `state` equals `other` or has it in its ancestor chain.
    pub(crate) fn state_is_included_in(&self, state: &S, other: &S) -> bool {
        let mut cursor = state.clone();
        loop {
            if cursor == *other {
                return true;
            }
            match self.superstate_of(&cursor) {
                Some(superstate) => cursor = superstate,
                None => return false,
            }
        }
    }

    fn superstate_of(&self, state: &S) -> Option<S> {
        self.representations
            .get(state)
            .and_then(|rep| rep.superstate.clone())
    }

    pub(crate) async fn internal_fire(
        &mut self,
        trigger: T,
        args: Vec<TriggerArg>,
    ) -> Result<(), TransitionError> {
        match self.firing_mode {
            FiringMode::Immediate => self.fire_trigger(trigger, args).await,
            FiringMode::Queued => self.fire_queued(trigger, args).await,
        }
    }

    /// Queued discipline: one transition in flight at a time, the queue
    /// drained to empty before the top-level fire returns. On an error the
    /// latch clears but unprocessed events stay queued.
    async fn fire_queued(&mut self, trigger: T, args: Vec<TriggerArg>) -> Result<(), TransitionError> {
        if self.firing {
            trace!(trigger = trigger.name(), "dispatch in flight, queueing trigger");
            self.event_queue.push_back(PendingFire { trigger, args });
            return Ok(());
        }
        self.firing = true;
        let mut result = self.fire_trigger(trigger, args).await;
        while result.is_ok() {
            let Some(next) = self.event_queue.pop_front() else {
                break;
            };
            result = self.fire_trigger(next.trigger, next.args).await;
        }
        self.firing = false;
        result
    }

    /// One complete dispatch: validate, resolve, run the variant.
    ///
    /// Boxed because immediate-mode fires issued from inside callbacks
    /// re-enter this function recursively.
    fn fire_trigger<'a>(
        &'a mut self,
        trigger: T,
        args: Vec<TriggerArg>,
    ) -> BoxFuture<'a, Result<(), TransitionError>> {
        Box::pin(async move {
            if let Some(parameters) = self.trigger_parameters.get(&trigger) {
                parameters.validate(&args)?;
            }

            let source = self.storage.get();
            self.representation_mut(source.clone());
            trace!(state = source.name(), trigger = trigger.name(), "resolving trigger");

            let Some(handler) = self.find_handler(&source, &trigger, &args)? else {
                return self.handle_unhandled(&source, &trigger, &[]).await;
            };
            if !handler.unmet_guard_conditions.is_empty() {
                return self
                    .handle_unhandled(&source, &trigger, &handler.unmet_guard_conditions)
                    .await;
            }

            let args = Arc::new(args);
            match handler.behaviour.kind {
                TriggerBehaviourKind::Ignored => {
                    trace!(state = source.name(), trigger = trigger.name(), "trigger ignored");
                    Ok(())
                }
                TriggerBehaviourKind::Internal { .. } => {
                    self.run_internal(source, trigger, args).await
                }
                TriggerBehaviourKind::Reentry { destination } => {
                    self.run_reentry(source, destination, trigger, args).await
                }
                TriggerBehaviourKind::Transitioning { destination } => {
                    self.run_transition(source, destination, trigger, args).await
                }
                TriggerBehaviourKind::Dynamic { selector } => {
                    let destination = selector(&args);
                    self.run_transition(source, destination, trigger, args).await
                }
            }
        })
    }

    async fn handle_unhandled(
        &mut self,
        state: &S,
        trigger: &T,
        unmet: &[String],
    ) -> Result<(), TransitionError> {
        debug!(state = state.name(), trigger = trigger.name(), "trigger unhandled");
        match &self.unhandled_trigger {
            UnhandledTriggerCallback::Default => {
                if unmet.is_empty() {
                    Err(TransitionError::NoPermittedTransitions {
                        state: state.name().to_string(),
                        trigger: trigger.name().to_string(),
                    })
                } else {
                    Err(TransitionError::GuardConditionsNotMet {
                        state: state.name().to_string(),
                        trigger: trigger.name().to_string(),
                        unmet: unmet.join(", "),
                    })
                }
            }
            UnhandledTriggerCallback::Sync(handler) => handler(state, trigger, unmet),
            UnhandledTriggerCallback::Suspending(handler) => handler(state, trigger, unmet).await,
        }
    }

    /// Internal transitions run their action without exiting or entering
    /// anything; the action may be declared on an ancestor.
    async fn run_internal(
        &mut self,
        source: S,
        trigger: T,
        args: Arc<Vec<TriggerArg>>,
    ) -> Result<(), TransitionError> {
        let transition = Transition::fired(source.clone(), source.clone(), trigger.clone(), args.clone());

        let mut cursor = source.clone();
        let action = loop {
            let missing = || TransitionError::MissingInternalAction {
                state: source.name().to_string(),
                trigger: trigger.name().to_string(),
            };
            let Some(rep) = self.representations.get(&cursor) else {
                return Err(missing());
            };
            if let Some(result) = rep.try_find_local_handler(&trigger, &args)? {
                match result.behaviour.kind {
                    TriggerBehaviourKind::Internal { action } => break action,
                    _ => return Err(missing()),
                }
            }
            match &rep.superstate {
                Some(superstate) => cursor = superstate.clone(),
                None => return Err(missing()),
            }
        };

        let mut sink = TriggerSink::new();
        action.execute(&transition, &args, &mut sink).await?;
        self.process_sink(sink).await
    }

    async fn run_transition(
        &mut self,
        source: S,
        destination: S,
        trigger: T,
        args: Arc<Vec<TriggerArg>>,
    ) -> Result<(), TransitionError> {
        let transition =
            Transition::fired(source.clone(), destination.clone(), trigger.clone(), args.clone());

        self.exit_walk(source.clone(), &transition).await?;
        self.storage.set(destination.clone());
        self.representation_mut(destination.clone());
        debug!(
            from = source.name(),
            to = destination.name(),
            trigger = trigger.name(),
            "state transition"
        );
        self.notify_transitioned(&transition).await?;
        self.enter_walk(destination, &transition, &args).await?;
        self.expand_initial_transitions(source, trigger, &args).await
    }

    async fn run_reentry(
        &mut self,
        source: S,
        destination: S,
        trigger: T,
        args: Arc<Vec<TriggerArg>>,
    ) -> Result<(), TransitionError> {
        // The reentry flag is forced even when the behaviour was resolved
        // from a substate, so both walks stay local: one exit at the actual
        // current state, one entry at the reentered state.
        let transition =
            Transition::reentry(source.clone(), destination.clone(), trigger.clone(), args.clone());
        self.exit_walk(source, &transition).await?;
        self.storage.set(destination.clone());
        self.representation_mut(destination.clone());
        debug!(
            from = transition.source().name(),
            to = destination.name(),
            trigger = trigger.name(),
            "reentry transition"
        );
        self.notify_transitioned(&transition).await?;
        // Reentry never expands initial transitions.
        self.enter_walk(destination, &transition, &args).await
    }

    /// Exit actions run innermost state first. The walk stops before any
    /// state whose subtree still contains the destination, and never exits
    /// the destination itself when it is an ancestor of the source.
    async fn exit_walk(
        &mut self,
        leaving: S,
        transition: &Transition<S, T>,
    ) -> Result<(), TransitionError> {
        if transition.is_reentry() {
            return self.run_exit_actions(leaving, transition).await;
        }
        let mut cursor = leaving;
        loop {
            if self.state_includes(&cursor, transition.destination()) {
                break;
            }
            self.run_exit_actions(cursor.clone(), transition).await?;
            match self.superstate_of(&cursor) {
                None => break,
                Some(superstate) => {
                    if superstate == *transition.destination() {
                        break;
                    }
                    cursor = superstate;
                }
            }
        }
        Ok(())
    }

    /// Entry actions run outermost state first. States whose subtree already
    /// contains the source are not entered again; initial transitions never
    /// ascend, the composite was entered by the transition preceding them.
    async fn enter_walk(
        &mut self,
        entering: S,
        transition: &Transition<S, T>,
        args: &[TriggerArg],
    ) -> Result<(), TransitionError> {
        if transition.is_reentry() {
            return self.run_entry_actions(entering, transition, args).await;
        }
        let mut chain = Vec::new();
        let mut cursor = Some(entering);
        while let Some(state) = cursor {
            if self.state_includes(&state, transition.source()) {
                break;
            }
            cursor = if transition.is_initial() {
                None
            } else {
                self.superstate_of(&state)
            };
            chain.push(state);
        }
        for state in chain.into_iter().rev() {
            self.run_entry_actions(state, transition, args).await?;
        }
        Ok(())
    }

    /// Descend into configured initial targets until a state without one is
    /// reached. Re-reads the committed state first: a trigger fired from an
    /// entry action may already have moved the machine elsewhere.
    async fn expand_initial_transitions(
        &mut self,
        original_source: S,
        trigger: T,
        args: &Arc<Vec<TriggerArg>>,
    ) -> Result<(), TransitionError> {
        let mut cursor = self.storage.get();
        loop {
            let Some(target) = self
                .representations
                .get(&cursor)
                .and_then(|rep| rep.initial_transition_target.clone())
            else {
                return Ok(());
            };
            if target == cursor || !self.state_includes(&cursor, &target) {
                return Err(TransitionError::InitialTransitionNotSubstate {
                    state: cursor.name().to_string(),
                    target: target.name().to_string(),
                });
            }
            trace!(
                composite = cursor.name(),
                target = target.name(),
                "expanding initial transition"
            );
            let transition = Transition::initial(
                original_source.clone(),
                target.clone(),
                trigger.clone(),
                args.clone(),
            );
            self.representation_mut(target.clone());
            self.enter_walk(target.clone(), &transition, args).await?;
            self.storage.set(target.clone());
            cursor = target;
        }
    }

    async fn run_entry_actions(
        &mut self,
        state: S,
        transition: &Transition<S, T>,
        args: &[TriggerArg],
    ) -> Result<(), TransitionError> {
        let actions = self
            .representations
            .get(&state)
            .map(|rep| rep.entry_actions.clone())
            .unwrap_or_default();
        for action in actions {
            if !action.applies_to(transition) {
                continue;
            }
            let mut sink = TriggerSink::new();
            action.execute(transition, args, &mut sink).await?;
            self.process_sink(sink).await?;
        }
        Ok(())
    }

    async fn run_exit_actions(
        &mut self,
        state: S,
        transition: &Transition<S, T>,
    ) -> Result<(), TransitionError> {
        let actions = self
            .representations
            .get(&state)
            .map(|rep| rep.exit_actions.clone())
            .unwrap_or_default();
        for action in actions {
            let mut sink = TriggerSink::new();
            action.execute(transition, &mut sink).await?;
            self.process_sink(sink).await?;
        }
        Ok(())
    }

    async fn notify_transitioned(
        &mut self,
        transition: &Transition<S, T>,
    ) -> Result<(), TransitionError> {
        if self.transition_listeners.is_empty() {
            return Ok(());
        }
        let listeners = self.transition_listeners.clone();
        for listener in listeners {
            let mut sink = TriggerSink::new();
            listener.invoke(transition, &mut sink).await?;
            self.process_sink(sink).await?;
        }
        Ok(())
    }

    /// Dispatch the fires a callback collected in its sink, honouring the
    /// firing mode.
    async fn process_sink(&mut self, sink: TriggerSink<T>) -> Result<(), TransitionError> {
        for (trigger, args) in sink.into_pending() {
            match self.firing_mode {
                FiringMode::Queued => self.event_queue.push_back(PendingFire { trigger, args }),
                FiringMode::Immediate => self.fire_trigger(trigger, args).await?,
            }
        }
        Ok(())
    }

    /// Activation runs root-down over the current state chain, skipping
    /// representations that are already active.
    pub(crate) async fn internal_activate(&mut self) -> Result<(), TransitionError> {
        let current = self.storage.get();
        self.representation_mut(current.clone());
        for state in self.ancestor_chain(&current).into_iter().rev() {
            let Some(rep) = self.representations.get(&state) else {
                continue;
            };
            if rep.active {
                continue;
            }
            let actions = rep.activate_actions.clone();
            for action in &actions {
                action.execute().await?;
            }
            if let Some(rep) = self.representations.get_mut(&state) {
                rep.active = true;
            }
        }
        Ok(())
    }

    /// Deactivation mirrors activation: current state first, then ancestors.
    pub(crate) async fn internal_deactivate(&mut self) -> Result<(), TransitionError> {
        let current = self.storage.get();
        for state in self.ancestor_chain(&current) {
            let Some(rep) = self.representations.get(&state) else {
                continue;
            };
            if !rep.active {
                continue;
            }
            let actions = rep.deactivate_actions.clone();
            for action in &actions {
                action.execute().await?;
            }
            if let Some(rep) = self.representations.get_mut(&state) {
                rep.active = false;
            }
        }
        Ok(())
    }

    /// The state itself followed by its ancestors up to the root.
    fn ancestor_chain(&self, state: &S) -> Vec<S> {
        let mut chain = Vec::new();
        let mut cursor = Some(state.clone());
        while let Some(state) = cursor {
            cursor = self.superstate_of(&state);
            chain.push(state);
        }
        chain
    }
}
