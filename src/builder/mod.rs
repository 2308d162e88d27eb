//! Fluent per-state configuration.
//!
//! [`StateMachine::configure`](crate::StateMachine::configure) returns a
//! [`StateConfiguration`] that registers trigger behaviours, actions and
//! hierarchy links for one state. Configuration itself is infallible;
//! structural problems (guard conflicts, bad initial-transition targets)
//! surface when the affected trigger fires.

pub mod macros;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::core::guard::{GuardCondition, TransitionGuard};
use crate::core::params::TriggerArg;
use crate::core::state::{State, Trigger};
use crate::core::transition::Transition;
use crate::machine::actions::{
    ActionResult, ActivationActionBehaviour, EntryActionBehaviour, ExitActionBehaviour,
    InternalActionBehaviour, TriggerSink,
};
use crate::machine::behaviour::{TriggerBehaviour, TriggerBehaviourKind};
use crate::machine::StateMachine;

/// Configuration builder for a single state.
pub struct StateConfiguration<'m, S: State, T: Trigger> {
    machine: &'m mut StateMachine<S, T>,
    state: S,
}

impl<'m, S: State, T: Trigger> StateConfiguration<'m, S, T> {
    pub(crate) fn new(machine: &'m mut StateMachine<S, T>, state: S) -> Self {
        Self { machine, state }
    }

    /// The state being configured.
    pub fn state(&self) -> &S {
        &self.state
    }

    fn add_behaviour(self, guard: TransitionGuard, kind: TriggerBehaviourKind<S, T>, trigger: T) -> Self {
        self.machine
            .representation_mut(self.state.clone())
            .add_trigger_behaviour(TriggerBehaviour::new(trigger, guard, kind));
        self
    }

    /// Permit `trigger` to transition to `destination`.
    pub fn permit(self, trigger: T, destination: S) -> Self {
        self.add_behaviour(
            TransitionGuard::empty(),
            TriggerBehaviourKind::Transitioning { destination },
            trigger,
        )
    }

    /// Permit `trigger` to transition to `destination` when `guard` holds.
    pub fn permit_if<F>(
        self,
        trigger: T,
        destination: S,
        guard: F,
        description: impl Into<String>,
    ) -> Self
    where
        F: Fn(&[TriggerArg]) -> bool + Send + Sync + 'static,
    {
        self.add_behaviour(
            TransitionGuard::single(guard, description),
            TriggerBehaviourKind::Transitioning { destination },
            trigger,
        )
    }

    /// Permit `trigger` to transition to `destination` when every listed
    /// condition holds.
    pub fn permit_if_all(self, trigger: T, destination: S, conditions: Vec<GuardCondition>) -> Self {
        self.add_behaviour(
            TransitionGuard::new(conditions),
            TriggerBehaviourKind::Transitioning { destination },
            trigger,
        )
    }

    /// Permit `trigger` to exit and reenter this state, running only its
    /// local exit and entry actions.
    pub fn permit_reentry(self, trigger: T) -> Self {
        let destination = self.state.clone();
        self.add_behaviour(
            TransitionGuard::empty(),
            TriggerBehaviourKind::Reentry { destination },
            trigger,
        )
    }

    /// Guarded variant of [`permit_reentry`](Self::permit_reentry).
    pub fn permit_reentry_if<F>(self, trigger: T, guard: F, description: impl Into<String>) -> Self
    where
        F: Fn(&[TriggerArg]) -> bool + Send + Sync + 'static,
    {
        let destination = self.state.clone();
        self.add_behaviour(
            TransitionGuard::single(guard, description),
            TriggerBehaviourKind::Reentry { destination },
            trigger,
        )
    }

    /// Permit `trigger` with a destination computed from the fired
    /// arguments.
    pub fn permit_dynamic<F>(self, trigger: T, selector: F) -> Self
    where
        F: Fn(&[TriggerArg]) -> S + Send + Sync + 'static,
    {
        self.add_behaviour(
            TransitionGuard::empty(),
            TriggerBehaviourKind::Dynamic {
                selector: Arc::new(selector),
            },
            trigger,
        )
    }

    /// Guarded variant of [`permit_dynamic`](Self::permit_dynamic).
    pub fn permit_dynamic_if<F, G>(
        self,
        trigger: T,
        selector: F,
        guard: G,
        description: impl Into<String>,
    ) -> Self
    where
        F: Fn(&[TriggerArg]) -> S + Send + Sync + 'static,
        G: Fn(&[TriggerArg]) -> bool + Send + Sync + 'static,
    {
        self.add_behaviour(
            TransitionGuard::single(guard, description),
            TriggerBehaviourKind::Dynamic {
                selector: Arc::new(selector),
            },
            trigger,
        )
    }

    /// Swallow `trigger` in this state: no transition, no actions, no
    /// listener notifications.
    pub fn ignore(self, trigger: T) -> Self {
        self.add_behaviour(TransitionGuard::empty(), TriggerBehaviourKind::Ignored, trigger)
    }

    /// Guarded variant of [`ignore`](Self::ignore).
    pub fn ignore_if<F>(self, trigger: T, guard: F, description: impl Into<String>) -> Self
    where
        F: Fn(&[TriggerArg]) -> bool + Send + Sync + 'static,
    {
        self.add_behaviour(
            TransitionGuard::single(guard, description),
            TriggerBehaviourKind::Ignored,
            trigger,
        )
    }

    /// Handle `trigger` by running `action` without exiting or entering any
    /// state.
    pub fn internal_transition<F>(self, trigger: T, action: F) -> Self
    where
        F: Fn(&Transition<S, T>, &[TriggerArg], &mut TriggerSink<T>) -> ActionResult
            + Send
            + Sync
            + 'static,
    {
        self.add_behaviour(
            TransitionGuard::empty(),
            TriggerBehaviourKind::Internal {
                action: InternalActionBehaviour::sync(action),
            },
            trigger,
        )
    }

    /// Guarded variant of [`internal_transition`](Self::internal_transition).
    pub fn internal_transition_if<F, G>(
        self,
        trigger: T,
        guard: G,
        description: impl Into<String>,
        action: F,
    ) -> Self
    where
        F: Fn(&Transition<S, T>, &[TriggerArg], &mut TriggerSink<T>) -> ActionResult
            + Send
            + Sync
            + 'static,
        G: Fn(&[TriggerArg]) -> bool + Send + Sync + 'static,
    {
        self.add_behaviour(
            TransitionGuard::single(guard, description),
            TriggerBehaviourKind::Internal {
                action: InternalActionBehaviour::sync(action),
            },
            trigger,
        )
    }

    /// Suspending variant of [`internal_transition`](Self::internal_transition).
    pub fn internal_transition_async<F>(self, trigger: T, action: F) -> Self
    where
        F: for<'a> Fn(
                &'a Transition<S, T>,
                &'a [TriggerArg],
                &'a mut TriggerSink<T>,
            ) -> BoxFuture<'a, ActionResult>
            + Send
            + Sync
            + 'static,
    {
        self.add_behaviour(
            TransitionGuard::empty(),
            TriggerBehaviourKind::Internal {
                action: InternalActionBehaviour::suspending(action),
            },
            trigger,
        )
    }

    /// Run `action` whenever this state is entered.
    pub fn on_entry<F>(self, action: F) -> Self
    where
        F: Fn(&Transition<S, T>, &[TriggerArg], &mut TriggerSink<T>) -> ActionResult
            + Send
            + Sync
            + 'static,
    {
        self.machine
            .representation_mut(self.state.clone())
            .entry_actions
            .push(EntryActionBehaviour::sync(action, None));
        self
    }

    /// Suspending variant of [`on_entry`](Self::on_entry).
    pub fn on_entry_async<F>(self, action: F) -> Self
    where
        F: for<'a> Fn(
                &'a Transition<S, T>,
                &'a [TriggerArg],
                &'a mut TriggerSink<T>,
            ) -> BoxFuture<'a, ActionResult>
            + Send
            + Sync
            + 'static,
    {
        self.machine
            .representation_mut(self.state.clone())
            .entry_actions
            .push(EntryActionBehaviour::suspending(action, None));
        self
    }

    /// Run `action` only when this state is entered via `trigger`.
    pub fn on_entry_from<F>(self, trigger: T, action: F) -> Self
    where
        F: Fn(&Transition<S, T>, &[TriggerArg], &mut TriggerSink<T>) -> ActionResult
            + Send
            + Sync
            + 'static,
    {
        self.machine
            .representation_mut(self.state.clone())
            .entry_actions
            .push(EntryActionBehaviour::sync(action, Some(trigger)));
        self
    }

    /// Suspending variant of [`on_entry_from`](Self::on_entry_from).
    pub fn on_entry_from_async<F>(self, trigger: T, action: F) -> Self
    where
        F: for<'a> Fn(
                &'a Transition<S, T>,
                &'a [TriggerArg],
                &'a mut TriggerSink<T>,
            ) -> BoxFuture<'a, ActionResult>
            + Send
            + Sync
            + 'static,
    {
        self.machine
            .representation_mut(self.state.clone())
            .entry_actions
            .push(EntryActionBehaviour::suspending(action, Some(trigger)));
        self
    }

    /// Run `action` whenever this state is exited.
    pub fn on_exit<F>(self, action: F) -> Self
    where
        F: Fn(&Transition<S, T>, &mut TriggerSink<T>) -> ActionResult + Send + Sync + 'static,
    {
        self.machine
            .representation_mut(self.state.clone())
            .exit_actions
            .push(ExitActionBehaviour::Sync(Arc::new(action)));
        self
    }

    /// Suspending variant of [`on_exit`](Self::on_exit).
    pub fn on_exit_async<F>(self, action: F) -> Self
    where
        F: for<'a> Fn(&'a Transition<S, T>, &'a mut TriggerSink<T>) -> BoxFuture<'a, ActionResult>
            + Send
            + Sync
            + 'static,
    {
        self.machine
            .representation_mut(self.state.clone())
            .exit_actions
            .push(ExitActionBehaviour::Suspending(Arc::new(action)));
        self
    }

    /// Run `action` when the machine is activated while in this state (or a
    /// substate of it).
    pub fn on_activate<F>(self, action: F) -> Self
    where
        F: Fn() -> ActionResult + Send + Sync + 'static,
    {
        self.machine
            .representation_mut(self.state.clone())
            .activate_actions
            .push(ActivationActionBehaviour::Sync(Arc::new(action)));
        self
    }

    /// Suspending variant of [`on_activate`](Self::on_activate).
    pub fn on_activate_async<F>(self, action: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, ActionResult> + Send + Sync + 'static,
    {
        self.machine
            .representation_mut(self.state.clone())
            .activate_actions
            .push(ActivationActionBehaviour::Suspending(Arc::new(action)));
        self
    }

    /// Run `action` when the machine is deactivated while in this state (or
    /// a substate of it).
    pub fn on_deactivate<F>(self, action: F) -> Self
    where
        F: Fn() -> ActionResult + Send + Sync + 'static,
    {
        self.machine
            .representation_mut(self.state.clone())
            .deactivate_actions
            .push(ActivationActionBehaviour::Sync(Arc::new(action)));
        self
    }

    /// Suspending variant of [`on_deactivate`](Self::on_deactivate).
    pub fn on_deactivate_async<F>(self, action: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, ActionResult> + Send + Sync + 'static,
    {
        self.machine
            .representation_mut(self.state.clone())
            .deactivate_actions
            .push(ActivationActionBehaviour::Suspending(Arc::new(action)));
        self
    }

    /// Make this state a substate of `superstate`. Both sides of the link
    /// are recorded so subtree checks stay symmetric.
    pub fn substate_of(self, superstate: S) -> Self {
        self.machine
            .representation_mut(self.state.clone())
            .superstate = Some(superstate.clone());
        let parent = self.machine.representation_mut(superstate);
        if !parent.substates.contains(&self.state) {
            parent.substates.push(self.state.clone());
        }
        self
    }

    /// On entering this state, automatically descend into `target`. The
    /// target must be a substate; this is checked when the transition into
    /// this state fires. Reconfiguring replaces the previous target.
    pub fn initial_transition(self, target: S) -> Self {
        self.machine
            .representation_mut(self.state.clone())
            .initial_transition_target = Some(target);
        self
    }
}
