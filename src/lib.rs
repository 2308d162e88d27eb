//! Trellis: a hierarchical state machine library
//!
//! Trellis models the practical UML statechart subset: nested states with
//! entry/exit and activation actions, guarded transitions, internal and
//! reentry transitions, ignored triggers, initial transitions into composite
//! states and typed trigger parameters. The machine is generic over
//! user-supplied state and trigger identifier types.
//!
//! Triggers fired from inside actions obey the machine's
//! [`FiringMode`]: dispatched immediately, or queued FIFO and drained after
//! the in-flight transition completes. Actions come in synchronous and
//! suspending flavours over the same engine.
//!
//! # Core concepts
//!
//! - **States and triggers**: identifier types implementing [`State`] and
//!   [`Trigger`] (see [`state_enum!`] and [`trigger_enum!`]).
//! - **Configuration**: a fluent per-state builder returned by
//!   [`StateMachine::configure`].
//! - **Guards**: named pure predicates controlling each behaviour.
//! - **Hierarchy**: substates delegate unhandled triggers to their
//!   superstate; exits run inner to outer, entries outer to inner.
//!
//! # Example
//!
//! ```rust
//! use trellis::{state_enum, trigger_enum, StateMachine};
//!
//! state_enum! {
//!     enum Playback {
//!         Stopped,
//!         Playing,
//!         Paused,
//!     }
//! }
//!
//! trigger_enum! {
//!     enum Control {
//!         Play,
//!         Pause,
//!         Stop,
//!     }
//! }
//!
//! fn main() -> Result<(), trellis::TransitionError> {
//!     let mut deck = StateMachine::new(Playback::Stopped);
//!     deck.configure(Playback::Stopped)
//!         .permit(Control::Play, Playback::Playing);
//!     deck.configure(Playback::Playing)
//!         .permit(Control::Pause, Playback::Paused)
//!         .permit(Control::Stop, Playback::Stopped);
//!     deck.configure(Playback::Paused)
//!         .substate_of(Playback::Playing)
//!         .permit(Control::Play, Playback::Playing);
//!
//!     deck.fire(Control::Play)?;
//!     deck.fire(Control::Pause)?;
//!     assert_eq!(deck.current_state(), Playback::Paused);
//!     assert!(deck.is_in_state(&Playback::Playing));
//!
//!     // Paused is a substate of Playing, so Stop is delegated upwards.
//!     deck.fire(Control::Stop)?;
//!     assert_eq!(deck.current_state(), Playback::Stopped);
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod core;
pub mod error;
pub mod machine;
pub mod reflection;

pub use self::builder::StateConfiguration;
pub use self::core::guard::{GuardCondition, GuardPredicate, TransitionGuard};
pub use self::core::params::{arg, IntoTriggerArgs, TriggerArg, TriggerWithParameters};
pub use self::core::state::{State, Trigger};
pub use self::core::transition::Transition;
pub use self::error::TransitionError;
pub use self::machine::actions::{ActionResult, TriggerSink};
pub use self::machine::{FiringMode, StateMachine};
