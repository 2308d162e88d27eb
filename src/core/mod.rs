//! Core vocabulary: identifier traits, guards, transition records and typed
//! trigger parameters.

pub mod guard;
pub mod params;
pub mod state;
pub mod transition;

pub use guard::{GuardCondition, GuardPredicate, TransitionGuard};
pub use params::{arg, IntoTriggerArgs, TriggerArg, TriggerWithParameters};
pub use state::{State, Trigger};
pub use transition::Transition;
