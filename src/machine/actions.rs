//! Stored callbacks: entry/exit/activation actions, internal-transition
//! actions, transition listeners and the unhandled-trigger policy.
//!
//! Every callback family comes in a synchronous and a suspending flavour.
//! Suspending callbacks return a [`BoxFuture`]; the engine awaits them at
//! exactly those points, which is the machine's only form of suspension.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::core::params::TriggerArg;
use crate::core::state::{State, Trigger};
use crate::core::transition::Transition;
use crate::error::TransitionError;

/// The result type of every user callback. Failures propagate out of the
/// current fire unchanged; the engine does not retry or compensate.
pub type ActionResult = Result<(), TransitionError>;

/// Collects triggers fired from inside a callback.
///
/// Actions and listeners cannot call back into the machine directly, so the
/// engine hands them a sink instead. How the collected fires are dispatched
/// depends on the machine's [`FiringMode`](crate::FiringMode): immediately
/// when the issuing callback returns, or appended to the FIFO queue.
pub struct TriggerSink<T: Trigger> {
    pending: Vec<(T, Vec<TriggerArg>)>,
}

impl<T: Trigger> TriggerSink<T> {
    pub(crate) fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Fire a trigger without arguments.
    pub fn fire(&mut self, trigger: T) {
        self.pending.push((trigger, Vec::new()));
    }

    /// Fire a trigger with arguments.
    pub fn fire_with(&mut self, trigger: T, args: Vec<TriggerArg>) {
        self.pending.push((trigger, args));
    }

    pub(crate) fn into_pending(self) -> Vec<(T, Vec<TriggerArg>)> {
        self.pending
    }
}

pub(crate) type SyncActionFn<S, T> = Arc<
    dyn Fn(&Transition<S, T>, &[TriggerArg], &mut TriggerSink<T>) -> ActionResult + Send + Sync,
>;

pub(crate) type SuspendingActionFn<S, T> = Arc<
    dyn for<'a> Fn(
            &'a Transition<S, T>,
            &'a [TriggerArg],
            &'a mut TriggerSink<T>,
        ) -> BoxFuture<'a, ActionResult>
        + Send
        + Sync,
>;

/// A callback receiving the transition record and the fired arguments.
/// Used by entry actions and internal-transition actions.
#[derive(Clone)]
pub(crate) enum ActionCallback<S: State, T: Trigger> {
    Sync(SyncActionFn<S, T>),
    Suspending(SuspendingActionFn<S, T>),
}

impl<S: State, T: Trigger> ActionCallback<S, T> {
    pub(crate) async fn execute(
        &self,
        transition: &Transition<S, T>,
        args: &[TriggerArg],
        sink: &mut TriggerSink<T>,
    ) -> ActionResult {
        match self {
            Self::Sync(action) => action(transition, args, sink),
            Self::Suspending(action) => action(transition, args, sink).await,
        }
    }
}

/// An entry action, optionally scoped to a single trigger.
#[derive(Clone)]
pub(crate) struct EntryActionBehaviour<S: State, T: Trigger> {
    callback: ActionCallback<S, T>,
    trigger_filter: Option<T>,
}

impl<S: State, T: Trigger> EntryActionBehaviour<S, T> {
    pub(crate) fn sync<F>(action: F, trigger_filter: Option<T>) -> Self
    where
        F: Fn(&Transition<S, T>, &[TriggerArg], &mut TriggerSink<T>) -> ActionResult
            + Send
            + Sync
            + 'static,
    {
        Self {
            callback: ActionCallback::Sync(Arc::new(action)),
            trigger_filter,
        }
    }

    pub(crate) fn suspending<F>(action: F, trigger_filter: Option<T>) -> Self
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
        Self {
            callback: ActionCallback::Suspending(Arc::new(action)),
            trigger_filter,
        }
    }

    /// Trigger-scoped entry actions are a no-op for other triggers.
    pub(crate) fn applies_to(&self, transition: &Transition<S, T>) -> bool {
        self.trigger_filter
            .as_ref()
            .map_or(true, |scoped| scoped == transition.trigger())
    }

    pub(crate) async fn execute(
        &self,
        transition: &Transition<S, T>,
        args: &[TriggerArg],
        sink: &mut TriggerSink<T>,
    ) -> ActionResult {
        self.callback.execute(transition, args, sink).await
    }
}

/// The action attached to an internal transition.
#[derive(Clone)]
pub(crate) struct InternalActionBehaviour<S: State, T: Trigger> {
    callback: ActionCallback<S, T>,
}

impl<S: State, T: Trigger> InternalActionBehaviour<S, T> {
    pub(crate) fn sync<F>(action: F) -> Self
    where
        F: Fn(&Transition<S, T>, &[TriggerArg], &mut TriggerSink<T>) -> ActionResult
            + Send
            + Sync
            + 'static,
    {
        Self {
            callback: ActionCallback::Sync(Arc::new(action)),
        }
    }

    pub(crate) fn suspending<F>(action: F) -> Self
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
        Self {
            callback: ActionCallback::Suspending(Arc::new(action)),
        }
    }

    pub(crate) async fn execute(
        &self,
        transition: &Transition<S, T>,
        args: &[TriggerArg],
        sink: &mut TriggerSink<T>,
    ) -> ActionResult {
        self.callback.execute(transition, args, sink).await
    }
}

pub(crate) type SyncExitFn<S, T> =
    Arc<dyn Fn(&Transition<S, T>, &mut TriggerSink<T>) -> ActionResult + Send + Sync>;

pub(crate) type SuspendingExitFn<S, T> = Arc<
    dyn for<'a> Fn(&'a Transition<S, T>, &'a mut TriggerSink<T>) -> BoxFuture<'a, ActionResult>
        + Send
        + Sync,
>;

/// An exit action. Exit actions see the transition but not the arguments.
#[derive(Clone)]
pub(crate) enum ExitActionBehaviour<S: State, T: Trigger> {
    Sync(SyncExitFn<S, T>),
    Suspending(SuspendingExitFn<S, T>),
}

impl<S: State, T: Trigger> ExitActionBehaviour<S, T> {
    pub(crate) async fn execute(
        &self,
        transition: &Transition<S, T>,
        sink: &mut TriggerSink<T>,
    ) -> ActionResult {
        match self {
            Self::Sync(action) => action(transition, sink),
            Self::Suspending(action) => action(transition, sink).await,
        }
    }
}

/// An activation or deactivation action. Purely advisory: it never observes
/// or changes the current state.
#[derive(Clone)]
pub(crate) enum ActivationActionBehaviour {
    Sync(Arc<dyn Fn() -> ActionResult + Send + Sync>),
    Suspending(Arc<dyn Fn() -> BoxFuture<'static, ActionResult> + Send + Sync>),
}

impl ActivationActionBehaviour {
    pub(crate) async fn execute(&self) -> ActionResult {
        match self {
            Self::Sync(action) => action(),
            Self::Suspending(action) => action().await,
        }
    }
}

/// A transition listener, notified after the state commits and before entry
/// actions run.
#[derive(Clone)]
pub(crate) enum TransitionListener<S: State, T: Trigger> {
    Sync(SyncExitFn<S, T>),
    Suspending(SuspendingExitFn<S, T>),
}

impl<S: State, T: Trigger> TransitionListener<S, T> {
    pub(crate) async fn invoke(
        &self,
        transition: &Transition<S, T>,
        sink: &mut TriggerSink<T>,
    ) -> ActionResult {
        match self {
            Self::Sync(listener) => listener(transition, sink),
            Self::Suspending(listener) => listener(transition, sink).await,
        }
    }
}

/// The replaceable unhandled-trigger policy.
#[derive(Clone)]
pub(crate) enum UnhandledTriggerCallback<S: State, T: Trigger> {
    /// Fail the fire with `NoPermittedTransitions` or `GuardConditionsNotMet`.
    Default,
    Sync(Arc<dyn Fn(&S, &T, &[String]) -> ActionResult + Send + Sync>),
    Suspending(
        Arc<
            dyn for<'a> Fn(&'a S, &'a T, &'a [String]) -> BoxFuture<'a, ActionResult>
                + Send
                + Sync,
        >,
    ),
}
