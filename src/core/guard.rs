//! Guard conditions for controlling trigger behaviours.
//!
//! Guards are pure predicates over the fired trigger's arguments. A
//! behaviour applies only when every condition of its guard is met; the
//! descriptions of failed conditions feed the unhandled-trigger diagnostics.

use std::sync::Arc;

use crate::core::params::TriggerArg;

/// Shared predicate over a fired trigger's arguments.
pub type GuardPredicate = Arc<dyn Fn(&[TriggerArg]) -> bool + Send + Sync>;

/// A named guard predicate.
///
/// The predicate must be pure: the engine may evaluate it more than once per
/// fire, first while resolving the handler and again when collecting unmet
/// descriptions for diagnostics.
#[derive(Clone)]
pub struct GuardCondition {
    predicate: GuardPredicate,
    description: String,
}

impl GuardCondition {
    /// Create a condition from a predicate and its description.
    ///
    /// # Example
    ///
    /// ```rust
    /// use trellis::GuardCondition;
    ///
    /// let positive = GuardCondition::new(|args| !args.is_empty(), "has arguments");
    /// assert!(!positive.is_met(&[]));
    /// ```
    pub fn new<F>(predicate: F, description: impl Into<String>) -> Self
    where
        F: Fn(&[TriggerArg]) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            description: description.into(),
        }
    }

    /// The condition's description, as reported in diagnostics.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Evaluate the predicate against the fired arguments.
    pub fn is_met(&self, args: &[TriggerArg]) -> bool {
        (self.predicate)(args)
    }
}

/// An ordered list of guard conditions attached to a trigger behaviour.
///
/// The empty guard is trivially met.
#[derive(Clone)]
pub struct TransitionGuard {
    conditions: Vec<GuardCondition>,
}

impl TransitionGuard {
    /// A guard with no conditions.
    pub fn empty() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// A guard from an ordered list of conditions.
    pub fn new(conditions: Vec<GuardCondition>) -> Self {
        Self { conditions }
    }

    /// A guard with a single condition.
    pub fn single<F>(predicate: F, description: impl Into<String>) -> Self
    where
        F: Fn(&[TriggerArg]) -> bool + Send + Sync + 'static,
    {
        Self {
            conditions: vec![GuardCondition::new(predicate, description)],
        }
    }

    /// The conditions in registration order.
    pub fn conditions(&self) -> &[GuardCondition] {
        &self.conditions
    }

    /// Descriptions of the conditions that fail for `args`, in registration
    /// order.
    pub fn unmet_conditions(&self, args: &[TriggerArg]) -> Vec<String> {
        self.conditions
            .iter()
            .filter(|condition| !condition.is_met(args))
            .map(|condition| condition.description().to_string())
            .collect()
    }

    /// True when every condition is met for `args`.
    pub fn is_met(&self, args: &[TriggerArg]) -> bool {
        self.conditions.iter().all(|condition| condition.is_met(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::arg;

    #[test]
    fn empty_guard_is_trivially_met() {
        let guard = TransitionGuard::empty();

        assert!(guard.is_met(&[]));
        assert!(guard.unmet_conditions(&[]).is_empty());
    }

    #[test]
    fn single_condition_blocks_when_false() {
        let guard = TransitionGuard::single(|_| false, "never");

        assert!(!guard.is_met(&[]));
        assert_eq!(guard.unmet_conditions(&[]), vec!["never".to_string()]);
    }

    #[test]
    fn unmet_conditions_preserve_registration_order() {
        let guard = TransitionGuard::new(vec![
            GuardCondition::new(|_| false, "first"),
            GuardCondition::new(|_| true, "second"),
            GuardCondition::new(|_| false, "third"),
        ]);

        assert_eq!(
            guard.unmet_conditions(&[]),
            vec!["first".to_string(), "third".to_string()]
        );
    }

    #[test]
    fn conditions_see_the_fired_arguments() {
        let guard = TransitionGuard::single(
            |args| args
                .first()
                .and_then(|a| a.downcast_ref::<u32>())
                .is_some_and(|n| *n > 10),
            "count above ten",
        );

        assert!(guard.is_met(&[arg(11u32)]));
        assert!(!guard.is_met(&[arg(3u32)]));
        assert!(!guard.is_met(&[]));
    }

    #[test]
    fn guard_evaluation_is_repeatable() {
        let guard = TransitionGuard::single(|args| args.is_empty(), "no arguments");

        assert_eq!(guard.is_met(&[]), guard.is_met(&[]));
        assert_eq!(guard.unmet_conditions(&[]), guard.unmet_conditions(&[]));
    }
}
