//! Typed trigger parameters.
//!
//! Trigger arguments travel through the engine as boxed [`Any`] values. A
//! [`TriggerWithParameters`] descriptor pins down the expected argument
//! types for a trigger so that a fire can be rejected before any state
//! changes.

use std::any::{type_name, Any, TypeId};

use crate::core::state::Trigger;
use crate::error::TransitionError;

/// A single trigger argument. Guards, dynamic destination selectors and
/// entry actions downcast these back to their concrete types.
pub type TriggerArg = Box<dyn Any + Send + Sync>;

/// Box a value as a trigger argument.
///
/// # Example
///
/// ```rust
/// use trellis::arg;
///
/// let boxed = arg(42u32);
/// assert_eq!(boxed.downcast_ref::<u32>(), Some(&42));
/// ```
pub fn arg<A: Any + Send + Sync>(value: A) -> TriggerArg {
    Box::new(value)
}

#[derive(Clone, Copy, Debug)]
struct ParameterSlot {
    type_id: TypeId,
    type_name: &'static str,
}

impl ParameterSlot {
    fn of<A: Any>() -> Self {
        Self {
            type_id: TypeId::of::<A>(),
            type_name: type_name::<A>(),
        }
    }
}

/// Associates a trigger with an ordered list of expected argument types.
///
/// Registering a descriptor with
/// [`StateMachine::set_trigger_parameters`](crate::StateMachine::set_trigger_parameters)
/// makes every fire of that trigger validate its arguments first.
#[derive(Clone, Debug)]
pub struct TriggerWithParameters<T> {
    trigger: T,
    slots: Vec<ParameterSlot>,
}

impl<T: Trigger> TriggerWithParameters<T> {
    /// Describe a trigger taking one argument of type `A0`.
    pub fn one<A0: Any + Send + Sync>(trigger: T) -> Self {
        Self {
            trigger,
            slots: vec![ParameterSlot::of::<A0>()],
        }
    }

    /// Describe a trigger taking two arguments of types `A0` and `A1`.
    pub fn two<A0: Any + Send + Sync, A1: Any + Send + Sync>(trigger: T) -> Self {
        Self {
            trigger,
            slots: vec![ParameterSlot::of::<A0>(), ParameterSlot::of::<A1>()],
        }
    }

    /// Describe a trigger taking three arguments of types `A0`, `A1` and `A2`.
    pub fn three<A0: Any + Send + Sync, A1: Any + Send + Sync, A2: Any + Send + Sync>(
        trigger: T,
    ) -> Self {
        Self {
            trigger,
            slots: vec![
                ParameterSlot::of::<A0>(),
                ParameterSlot::of::<A1>(),
                ParameterSlot::of::<A2>(),
            ],
        }
    }

    /// The underlying trigger.
    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    /// The number of expected arguments.
    pub fn arity(&self) -> usize {
        self.slots.len()
    }

    /// Check an actual argument list against the expected arity and types.
    pub fn validate(&self, args: &[TriggerArg]) -> Result<(), TransitionError> {
        if args.len() != self.slots.len() {
            return Err(TransitionError::WrongArgumentCount {
                trigger: self.trigger.name().to_string(),
                expected: self.slots.len(),
                actual: args.len(),
            });
        }
        for (index, (supplied, slot)) in args.iter().zip(&self.slots).enumerate() {
            if supplied.as_ref().type_id() != slot.type_id {
                return Err(TransitionError::WrongArgumentType {
                    trigger: self.trigger.name().to_string(),
                    index,
                    expected: slot.type_name,
                });
            }
        }
        Ok(())
    }
}

/// Conversion from a tuple of values into a boxed argument list, used by the
/// typed firing facade.
pub trait IntoTriggerArgs {
    /// Box the tuple elements in order.
    fn into_args(self) -> Vec<TriggerArg>;
}

impl<A0: Any + Send + Sync> IntoTriggerArgs for (A0,) {
    fn into_args(self) -> Vec<TriggerArg> {
        vec![Box::new(self.0)]
    }
}

impl<A0: Any + Send + Sync, A1: Any + Send + Sync> IntoTriggerArgs for (A0, A1) {
    fn into_args(self) -> Vec<TriggerArg> {
        vec![Box::new(self.0), Box::new(self.1)]
    }
}

impl<A0: Any + Send + Sync, A1: Any + Send + Sync, A2: Any + Send + Sync> IntoTriggerArgs
    for (A0, A1, A2)
{
    fn into_args(self) -> Vec<TriggerArg> {
        vec![Box::new(self.0), Box::new(self.1), Box::new(self.2)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger_enum;

    trigger_enum! {
        enum TestTrigger {
            Assign,
        }
    }

    #[test]
    fn validate_accepts_matching_arguments() {
        let descriptor = TriggerWithParameters::two::<String, u32>(TestTrigger::Assign);
        let args = vec![arg("worker".to_string()), arg(3u32)];

        assert!(descriptor.validate(&args).is_ok());
    }

    #[test]
    fn validate_rejects_wrong_arity() {
        let descriptor = TriggerWithParameters::one::<String>(TestTrigger::Assign);
        let args = vec![arg("worker".to_string()), arg(3u32)];

        let result = descriptor.validate(&args);
        assert!(matches!(
            result,
            Err(TransitionError::WrongArgumentCount {
                expected: 1,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_wrong_type() {
        let descriptor = TriggerWithParameters::one::<String>(TestTrigger::Assign);
        let args = vec![arg(3u32)];

        let result = descriptor.validate(&args);
        assert!(matches!(
            result,
            Err(TransitionError::WrongArgumentType { index: 0, .. })
        ));
    }

    #[test]
    fn validate_checks_boxed_value_not_the_box() {
        let descriptor = TriggerWithParameters::one::<u32>(TestTrigger::Assign);

        assert!(descriptor.validate(&[arg(7u32)]).is_ok());
        assert!(descriptor.validate(&[arg(7i64)]).is_err());
    }

    #[test]
    fn tuples_convert_in_order() {
        let args = ("left".to_string(), 2u32, true).into_args();

        assert_eq!(args.len(), 3);
        assert_eq!(args[0].downcast_ref::<String>().map(String::as_str), Some("left"));
        assert_eq!(args[1].downcast_ref::<u32>(), Some(&2));
        assert_eq!(args[2].downcast_ref::<bool>(), Some(&true));
    }
}
