//! Errors surfaced by configuration resolution, argument validation and
//! user callbacks.

use thiserror::Error;

/// Errors that can occur while firing a trigger.
///
/// State and trigger identifiers are reported by name so the error type stays
/// free of the machine's generic parameters.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// The current state (and its ancestors) have no behaviour at all for the
    /// fired trigger.
    #[error("no valid leaving transitions are permitted from state '{state}' for trigger '{trigger}'")]
    NoPermittedTransitions { state: String, trigger: String },

    /// A behaviour exists for the trigger but its guard conditions failed.
    /// `unmet` lists the failed guard descriptions joined with ", ".
    #[error("no valid leaving transitions are permitted from state '{state}' for trigger '{trigger}', guard conditions are not met: {unmet}")]
    GuardConditionsNotMet {
        state: String,
        trigger: String,
        unmet: String,
    },

    /// More than one behaviour for the same state and trigger had all of its
    /// guard conditions satisfied.
    #[error("multiple permitted exit transitions are allowed from state '{state}' for trigger '{trigger}', guard clauses must be mutually exclusive")]
    MultiplePermittedTransitions { state: String, trigger: String },

    /// An initial transition pointed at a state outside the composite
    /// state's own subtree.
    #[error("the target '{target}' for the initial transition is not a substate of '{state}'")]
    InitialTransitionNotSubstate { state: String, target: String },

    /// An internal transition was resolved but no action is attached to it.
    #[error("no action is assigned to the internal transition for trigger '{trigger}' in state '{state}'")]
    MissingInternalAction { state: String, trigger: String },

    /// A parameterised trigger was fired with the wrong number of arguments.
    #[error("trigger '{trigger}' expects {expected} argument(s) but {actual} were supplied")]
    WrongArgumentCount {
        trigger: String,
        expected: usize,
        actual: usize,
    },

    /// A parameterised trigger was fired with an argument of the wrong type.
    #[error("argument {index} for trigger '{trigger}' must be of type {expected}")]
    WrongArgumentType {
        trigger: String,
        index: usize,
        expected: &'static str,
    },

    /// Parameters for a trigger were registered twice.
    #[error("parameters for trigger '{trigger}' have already been configured")]
    TriggerParametersAlreadyConfigured { trigger: String },

    /// A suspending callback yielded while the machine was driven through the
    /// synchronous facade. Use the `_async` firing variants instead.
    #[error("an action suspended during a synchronous fire, use the asynchronous firing variants for machines with suspending actions")]
    SuspendedDuringSyncFire,

    /// A user-supplied action, guard resolver or listener failed.
    #[error("action failed: {0}")]
    ActionFailed(String),
}
