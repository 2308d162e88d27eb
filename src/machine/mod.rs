//! The state machine facade: construction, configuration entry points,
//! inspection and firing.

pub mod actions;
pub(crate) mod behaviour;
mod engine;
pub(crate) mod representation;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::builder::StateConfiguration;
use crate::core::params::{IntoTriggerArgs, TriggerArg, TriggerWithParameters};
use crate::core::state::{State, Trigger};
use crate::core::transition::Transition;
use crate::error::TransitionError;
use crate::reflection::{StateInfo, StateMachineInfo, TransitionInfo};
use actions::{
    ActionResult, TransitionListener, TriggerSink, UnhandledTriggerCallback,
};
use behaviour::TriggerBehaviourKind;
use representation::StateRepresentation;

/// How triggers fired from inside actions and listeners are dispatched.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FiringMode {
    /// Dispatch nested fires as soon as the issuing callback returns,
    /// pre-empting the rest of the outer fire.
    Immediate,
    /// Append nested fires to a FIFO queue, drained after the in-flight
    /// transition completes. The default.
    Queued,
}

/// The current-state store: either a value owned by the machine or a
/// user-supplied accessor/mutator pair. The machine never caches the state
/// id outside of it.
enum StateStorage<S: State> {
    Internal(S),
    External {
        accessor: Box<dyn Fn() -> S + Send + Sync>,
        mutator: Box<dyn FnMut(S) + Send + Sync>,
    },
}

impl<S: State> StateStorage<S> {
    fn get(&self) -> S {
        match self {
            Self::Internal(state) => state.clone(),
            Self::External { accessor, .. } => accessor(),
        }
    }

    fn set(&mut self, next: S) {
        match self {
            Self::Internal(state) => *state = next,
            Self::External { mutator, .. } => mutator(next),
        }
    }
}

/// A trigger waiting in the queue.
pub(crate) struct PendingFire<T> {
    pub(crate) trigger: T,
    pub(crate) args: Vec<TriggerArg>,
}

/// A hierarchical state machine over state type `S` and trigger type `T`.
///
/// States are configured through [`configure`](Self::configure) and triggers
/// dispatched through the `fire` family. Synchronous and suspending actions
/// share a single engine; the synchronous facade simply refuses to suspend.
///
/// # Example
///
/// ```rust
/// use trellis::{state_enum, trigger_enum, StateMachine};
///
/// state_enum! {
///     enum Call {
///         OffHook,
///         Ringing,
///         Connected,
///     }
/// }
///
/// trigger_enum! {
///     enum Event {
///         Dial,
///         PickUp,
///     }
/// }
///
/// # fn main() -> Result<(), trellis::TransitionError> {
/// let mut phone = StateMachine::new(Call::OffHook);
/// phone.configure(Call::OffHook).permit(Event::Dial, Call::Ringing);
/// phone
///     .configure(Call::Ringing)
///     .permit(Event::PickUp, Call::Connected);
///
/// phone.fire(Event::Dial)?;
/// assert_eq!(phone.current_state(), Call::Ringing);
/// # Ok(())
/// # }
/// ```
pub struct StateMachine<S: State, T: Trigger> {
    representations: HashMap<S, StateRepresentation<S, T>>,
    trigger_parameters: HashMap<T, TriggerWithParameters<T>>,
    storage: StateStorage<S>,
    unhandled_trigger: UnhandledTriggerCallback<S, T>,
    transition_listeners: Vec<TransitionListener<S, T>>,
    firing_mode: FiringMode,
    event_queue: VecDeque<PendingFire<T>>,
    firing: bool,
}

impl<S: State, T: Trigger> StateMachine<S, T> {
    /// Create a machine starting in `initial`, in [`FiringMode::Queued`].
    pub fn new(initial: S) -> Self {
        Self::with_firing_mode(initial, FiringMode::Queued)
    }

    /// Create a machine starting in `initial` with an explicit firing mode.
    /// The mode is fixed for the machine's lifetime.
    pub fn with_firing_mode(initial: S, firing_mode: FiringMode) -> Self {
        Self::build(StateStorage::Internal(initial), firing_mode)
    }

    /// Create a machine whose current state lives outside of it. The
    /// accessor/mutator pair is the single source of truth; both are invoked
    /// only from the thread driving the machine.
    pub fn from_external_state<G, M>(accessor: G, mutator: M, firing_mode: FiringMode) -> Self
    where
        G: Fn() -> S + Send + Sync + 'static,
        M: FnMut(S) + Send + Sync + 'static,
    {
        Self::build(
            StateStorage::External {
                accessor: Box::new(accessor),
                mutator: Box::new(mutator),
            },
            firing_mode,
        )
    }

    fn build(storage: StateStorage<S>, firing_mode: FiringMode) -> Self {
        Self {
            representations: HashMap::new(),
            trigger_parameters: HashMap::new(),
            storage,
            unhandled_trigger: UnhandledTriggerCallback::Default,
            transition_listeners: Vec::new(),
            firing_mode,
            event_queue: VecDeque::new(),
            firing: false,
        }
    }

    /// The machine's firing mode.
    pub fn firing_mode(&self) -> FiringMode {
        self.firing_mode
    }

    /// The current state id, read from the state store.
    pub fn current_state(&self) -> S {
        self.storage.get()
    }

    /// True when the current state equals `state` or has it in its ancestor
    /// chain.
    pub fn is_in_state(&self, state: &S) -> bool {
        self.state_is_included_in(&self.current_state(), state)
    }

    /// Begin configuring `state`, creating its representation on first use.
    pub fn configure(&mut self, state: S) -> StateConfiguration<'_, S, T> {
        self.representation_mut(state.clone());
        StateConfiguration::new(self, state)
    }

    pub(crate) fn representation_mut(&mut self, state: S) -> &mut StateRepresentation<S, T> {
        self.representations
            .entry(state.clone())
            .or_insert_with(|| StateRepresentation::new(state))
    }

    /// Register the expected argument types for a trigger. Every subsequent
    /// fire of that trigger validates its arguments before anything else.
    pub fn set_trigger_parameters(
        &mut self,
        parameters: TriggerWithParameters<T>,
    ) -> Result<(), TransitionError> {
        let trigger = parameters.trigger().clone();
        if self.trigger_parameters.contains_key(&trigger) {
            return Err(TransitionError::TriggerParametersAlreadyConfigured {
                trigger: trigger.name().to_string(),
            });
        }
        self.trigger_parameters.insert(trigger, parameters);
        Ok(())
    }

    /// Whether firing `trigger` from the current state would cause any
    /// handled behaviour (guards evaluated with no arguments).
    ///
    /// Resolution can surface a guard-conflict configuration error, hence
    /// the `Result`.
    pub fn can_fire(&self, trigger: &T) -> Result<bool, TransitionError> {
        self.can_fire_with(trigger, &[])
    }

    /// [`can_fire`](Self::can_fire) with explicit arguments for the guards.
    pub fn can_fire_with(
        &self,
        trigger: &T,
        args: &[TriggerArg],
    ) -> Result<bool, TransitionError> {
        let current = self.current_state();
        Ok(self
            .find_handler(&current, trigger, args)?
            .map(|handler| handler.unmet_guard_conditions.is_empty())
            .unwrap_or(false))
    }

    /// The triggers with at least one fully-met behaviour on the current
    /// state or any of its ancestors.
    pub fn permitted_triggers(&self) -> Vec<T> {
        self.permitted_triggers_with(&[])
    }

    /// [`permitted_triggers`](Self::permitted_triggers) with explicit
    /// arguments for the guards.
    pub fn permitted_triggers_with(&self, args: &[TriggerArg]) -> Vec<T> {
        let mut seen = HashSet::new();
        let mut permitted = Vec::new();
        let mut cursor = Some(self.current_state());
        while let Some(state) = cursor {
            let Some(rep) = self.representations.get(&state) else {
                break;
            };
            for trigger in rep.permitted_local_triggers(args) {
                if seen.insert(trigger.clone()) {
                    permitted.push(trigger);
                }
            }
            cursor = rep.superstate.clone();
        }
        permitted
    }

    /// Register a transition listener. Listeners run in registration order
    /// after the state store commits and before entry actions.
    pub fn on_transitioned<F>(&mut self, listener: F)
    where
        F: Fn(&Transition<S, T>, &mut TriggerSink<T>) -> ActionResult + Send + Sync + 'static,
    {
        self.transition_listeners
            .push(TransitionListener::Sync(Arc::new(listener)));
    }

    /// Register a suspending transition listener.
    pub fn on_transitioned_async<F>(&mut self, listener: F)
    where
        F: for<'a> Fn(
                &'a Transition<S, T>,
                &'a mut TriggerSink<T>,
            ) -> BoxFuture<'a, ActionResult>
            + Send
            + Sync
            + 'static,
    {
        self.transition_listeners
            .push(TransitionListener::Suspending(Arc::new(listener)));
    }

    /// Replace the unhandled-trigger policy. The default fails the fire.
    pub fn on_unhandled_trigger<F>(&mut self, handler: F)
    where
        F: Fn(&S, &T, &[String]) -> ActionResult + Send + Sync + 'static,
    {
        self.unhandled_trigger = UnhandledTriggerCallback::Sync(Arc::new(handler));
    }

    /// Replace the unhandled-trigger policy with a suspending handler.
    pub fn on_unhandled_trigger_async<F>(&mut self, handler: F)
    where
        F: for<'a> Fn(&'a S, &'a T, &'a [String]) -> BoxFuture<'a, ActionResult>
            + Send
            + Sync
            + 'static,
    {
        self.unhandled_trigger = UnhandledTriggerCallback::Suspending(Arc::new(handler));
    }

    /// Fire a trigger without arguments.
    pub fn fire(&mut self, trigger: T) -> Result<(), TransitionError> {
        self.fire_with(trigger, Vec::new())
    }

    /// Fire a trigger with boxed arguments.
    ///
    /// Drives the engine synchronously; if any callback on the path
    /// suspends, the fire fails with
    /// [`TransitionError::SuspendedDuringSyncFire`].
    pub fn fire_with(&mut self, trigger: T, args: Vec<TriggerArg>) -> Result<(), TransitionError> {
        match self.internal_fire(trigger, args).now_or_never() {
            Some(result) => result,
            None => {
                // The abandoned dispatch may have left the queue latch set.
                self.firing = false;
                Err(TransitionError::SuspendedDuringSyncFire)
            }
        }
    }

    /// Fire a parameterised trigger with a tuple of one to three typed
    /// values, validated against the descriptor before dispatch.
    pub fn fire_params<P: IntoTriggerArgs>(
        &mut self,
        parameters: &TriggerWithParameters<T>,
        values: P,
    ) -> Result<(), TransitionError> {
        let args = values.into_args();
        parameters.validate(&args)?;
        self.fire_with(parameters.trigger().clone(), args)
    }

    /// Fire a trigger without arguments, allowing callbacks to suspend.
    pub async fn fire_async(&mut self, trigger: T) -> Result<(), TransitionError> {
        self.internal_fire(trigger, Vec::new()).await
    }

    /// Fire a trigger with boxed arguments, allowing callbacks to suspend.
    pub async fn fire_with_async(
        &mut self,
        trigger: T,
        args: Vec<TriggerArg>,
    ) -> Result<(), TransitionError> {
        self.internal_fire(trigger, args).await
    }

    /// Suspending variant of [`fire_params`](Self::fire_params).
    pub async fn fire_params_async<P: IntoTriggerArgs>(
        &mut self,
        parameters: &TriggerWithParameters<T>,
        values: P,
    ) -> Result<(), TransitionError> {
        let args = values.into_args();
        parameters.validate(&args)?;
        self.internal_fire(parameters.trigger().clone(), args).await
    }

    /// Run activation actions for the current state chain, root first.
    /// States already activated are skipped.
    pub fn activate(&mut self) -> Result<(), TransitionError> {
        self.internal_activate()
            .now_or_never()
            .unwrap_or(Err(TransitionError::SuspendedDuringSyncFire))
    }

    /// Suspending variant of [`activate`](Self::activate).
    pub async fn activate_async(&mut self) -> Result<(), TransitionError> {
        self.internal_activate().await
    }

    /// Run deactivation actions for the current state chain, innermost
    /// state first. States not currently active are skipped.
    pub fn deactivate(&mut self) -> Result<(), TransitionError> {
        self.internal_deactivate()
            .now_or_never()
            .unwrap_or(Err(TransitionError::SuspendedDuringSyncFire))
    }

    /// Suspending variant of [`deactivate`](Self::deactivate).
    pub async fn deactivate_async(&mut self) -> Result<(), TransitionError> {
        self.internal_deactivate().await
    }

    /// A read-only snapshot of the configured machine: every state, its
    /// place in the hierarchy and its fixed transitions. Deterministically
    /// ordered and serializable.
    pub fn info(&self) -> StateMachineInfo {
        let mut states: Vec<StateInfo> = self
            .representations
            .values()
            .map(|rep| {
                let mut transitions = Vec::new();
                let mut ignored_triggers = Vec::new();
                for (trigger, candidates) in &rep.trigger_behaviours {
                    for candidate in candidates {
                        match &candidate.kind {
                            TriggerBehaviourKind::Transitioning { destination }
                            | TriggerBehaviourKind::Reentry { destination } => {
                                transitions.push(TransitionInfo {
                                    trigger: trigger.name().to_string(),
                                    destination: destination.name().to_string(),
                                    guard_descriptions: candidate
                                        .guard
                                        .conditions()
                                        .iter()
                                        .map(|c| c.description().to_string())
                                        .collect(),
                                });
                            }
                            TriggerBehaviourKind::Ignored => {
                                ignored_triggers.push(trigger.name().to_string());
                            }
                            TriggerBehaviourKind::Internal { .. }
                            | TriggerBehaviourKind::Dynamic { .. } => {}
                        }
                    }
                }
                transitions.sort_by(|a, b| {
                    (a.trigger.as_str(), a.destination.as_str())
                        .cmp(&(b.trigger.as_str(), b.destination.as_str()))
                });
                ignored_triggers.sort();
                StateInfo {
                    state: rep.state.name().to_string(),
                    superstate: rep.superstate.as_ref().map(|s| s.name().to_string()),
                    substates: rep.substates.iter().map(|s| s.name().to_string()).collect(),
                    initial_transition_target: rep
                        .initial_transition_target
                        .as_ref()
                        .map(|s| s.name().to_string()),
                    transitions,
                    ignored_triggers,
                }
            })
            .collect();
        states.sort_by(|a, b| a.state.cmp(&b.state));
        StateMachineInfo { states }
    }
}
