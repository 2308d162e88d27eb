//! Identifier traits for state machine states and triggers.
//!
//! The machine is generic over both identifier types; they only need
//! equality, hashing and a display name for diagnostics.

use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state identifiers.
///
/// Identifiers are plain values: the machine hashes them to key its
/// per-state configuration table and clones them freely into transition
/// records. `name` feeds error messages and the reflection snapshot.
///
/// The [`state_enum!`](crate::state_enum) macro derives this trait for
/// unit-variant enums.
///
/// # Example
///
/// ```rust
/// use trellis::State;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Phase {
///     Idle,
///     Running,
/// }
///
/// impl State for Phase {
///     fn name(&self) -> &str {
///         match self {
///             Self::Idle => "Idle",
///             Self::Running => "Running",
///         }
///     }
/// }
/// ```
pub trait State: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Get the state's name for display and diagnostics.
    fn name(&self) -> &str;
}

/// Trait for trigger identifiers.
///
/// Mirrors [`State`]; the [`trigger_enum!`](crate::trigger_enum) macro
/// derives it for unit-variant enums.
pub trait Trigger: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Get the trigger's name for display and diagnostics.
    fn name(&self) -> &str;
}
