//! Transition records.
//!
//! A [`Transition`] is the immutable value describing one move between
//! states. It is created per fire, handed to exit/entry actions and
//! transition listeners, and never mutated afterwards.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::params::TriggerArg;
use crate::core::state::{State, Trigger};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum TransitionKind {
    /// Produced directly by a fired trigger.
    Fired,
    /// Produced by a reentry behaviour; treated as reentry even when the
    /// endpoints differ.
    Reentry,
    /// Produced by descending into a composite state's initial target.
    Initial,
}

/// Record of a single transition between states.
///
/// For initial transitions the source is the state the original fire started
/// from, not the composite state being descended out of.
#[derive(Clone)]
pub struct Transition<S: State, T: Trigger> {
    source: S,
    destination: S,
    trigger: T,
    args: Arc<Vec<TriggerArg>>,
    timestamp: DateTime<Utc>,
    kind: TransitionKind,
}

impl<S: State, T: Trigger> Transition<S, T> {
    pub(crate) fn fired(source: S, destination: S, trigger: T, args: Arc<Vec<TriggerArg>>) -> Self {
        Self {
            source,
            destination,
            trigger,
            args,
            timestamp: Utc::now(),
            kind: TransitionKind::Fired,
        }
    }

    pub(crate) fn reentry(
        source: S,
        destination: S,
        trigger: T,
        args: Arc<Vec<TriggerArg>>,
    ) -> Self {
        Self {
            source,
            destination,
            trigger,
            args,
            timestamp: Utc::now(),
            kind: TransitionKind::Reentry,
        }
    }

    pub(crate) fn initial(
        source: S,
        destination: S,
        trigger: T,
        args: Arc<Vec<TriggerArg>>,
    ) -> Self {
        Self {
            source,
            destination,
            trigger,
            args,
            timestamp: Utc::now(),
            kind: TransitionKind::Initial,
        }
    }

    /// The state the transition leaves.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The state the transition enters.
    pub fn destination(&self) -> &S {
        &self.destination
    }

    /// The trigger that caused the transition.
    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    /// The arguments the trigger was fired with.
    pub fn args(&self) -> &[TriggerArg] {
        &self.args
    }

    /// When the transition record was created.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// True when the transition leaves and reenters a state on purpose.
    ///
    /// Holds for any transition whose destination equals its source, and for
    /// transitions produced by a reentry behaviour even when it was resolved
    /// from a substate of the reentered state. Reentry transitions execute
    /// only local exit and entry actions.
    pub fn is_reentry(&self) -> bool {
        self.kind == TransitionKind::Reentry || self.source == self.destination
    }

    /// True for transitions produced by initial-transition expansion.
    pub fn is_initial(&self) -> bool {
        self.kind == TransitionKind::Initial
    }
}

impl<S: State, T: Trigger> fmt::Debug for Transition<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("trigger", &self.trigger)
            .field("args", &self.args.len())
            .field("timestamp", &self.timestamp)
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::arg;
    use crate::{state_enum, trigger_enum};

    state_enum! {
        enum TestState {
            Left,
            Right,
        }
    }

    trigger_enum! {
        enum TestTrigger {
            Swap,
        }
    }

    #[test]
    fn reentry_is_derived_from_endpoints() {
        let args = Arc::new(Vec::new());
        let crossing = Transition::fired(
            TestState::Left,
            TestState::Right,
            TestTrigger::Swap,
            args.clone(),
        );
        let looping =
            Transition::fired(TestState::Left, TestState::Left, TestTrigger::Swap, args);

        assert!(!crossing.is_reentry());
        assert!(looping.is_reentry());
    }

    #[test]
    fn reentry_transitions_force_the_flag_across_endpoints() {
        let args = Arc::new(Vec::new());
        let transition = Transition::reentry(
            TestState::Left,
            TestState::Right,
            TestTrigger::Swap,
            args,
        );

        assert!(transition.is_reentry());
        assert!(!transition.is_initial());
    }

    #[test]
    fn initial_transitions_are_marked() {
        let args = Arc::new(Vec::new());
        let fired = Transition::fired(
            TestState::Left,
            TestState::Right,
            TestTrigger::Swap,
            args.clone(),
        );
        let initial =
            Transition::initial(TestState::Left, TestState::Right, TestTrigger::Swap, args);

        assert!(!fired.is_initial());
        assert!(initial.is_initial());
    }

    #[test]
    fn arguments_are_shared_with_the_record() {
        let args = Arc::new(vec![arg(5u8)]);
        let transition = Transition::fired(
            TestState::Left,
            TestState::Right,
            TestTrigger::Swap,
            args,
        );

        assert_eq!(transition.args().len(), 1);
        assert_eq!(transition.args()[0].downcast_ref::<u8>(), Some(&5));
    }
}
