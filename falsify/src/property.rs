//! Predicate outcomes and panic-safe evaluation.

use std::any::Any;
use std::fmt::Display;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::PropertyFailure;
use crate::value::Value;

/// Result types a predicate may return
///
/// `false` and `Err(_)` falsify the predicate; `true`, `()` and `Ok(())`
/// satisfy it.
pub trait PropertyOutcome {
    fn into_outcome(self) -> Result<(), PropertyFailure>;
}

impl PropertyOutcome for bool {
    fn into_outcome(self) -> Result<(), PropertyFailure> {
        if self {
            Ok(())
        } else {
            Err(PropertyFailure::new("Property returned false"))
        }
    }
}

impl PropertyOutcome for () {
    fn into_outcome(self) -> Result<(), PropertyFailure> {
        Ok(())
    }
}

impl<E: Display> PropertyOutcome for Result<(), E> {
    fn into_outcome(self) -> Result<(), PropertyFailure> {
        self.map_err(|err| PropertyFailure::new(err.to_string()))
    }
}

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run `f`, turning a panic into its message
pub fn catch_panic<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

/// Evaluate a predicate on arguments; a panic counts as a failure
pub fn evaluate<F, R>(predicate: &F, args: &[Value]) -> Result<(), PropertyFailure>
where
    F: Fn(&[Value]) -> R + ?Sized,
    R: PropertyOutcome,
{
    match catch_panic(|| predicate(args).into_outcome()) {
        Ok(outcome) => outcome,
        Err(message) => Err(PropertyFailure::new(format!("panicked: {}", message))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes() {
        assert!(true.into_outcome().is_ok());
        assert_eq!(
            false.into_outcome(),
            Err(PropertyFailure::new("Property returned false"))
        );
        assert!(().into_outcome().is_ok());
        let failed: Result<(), String> = Err("too big".to_string());
        assert_eq!(failed.into_outcome(), Err(PropertyFailure::new("too big")));
    }

    #[test]
    fn test_evaluate_catches_panics() {
        let predicate = |args: &[Value]| -> bool {
            let x = args[0].as_int().unwrap_or(0);
            if x > 3 {
                panic!("x was {}", x);
            }
            true
        };
        assert!(evaluate(&predicate, &[Value::Int(1)]).is_ok());
        let failure = evaluate(&predicate, &[Value::Int(7)]).unwrap_err();
        assert_eq!(failure.message, "panicked: x was 7");
    }

    #[test]
    fn test_catch_panic() {
        assert_eq!(catch_panic(|| 4), Ok(4));
        let caught: Result<(), String> = catch_panic(|| panic!("boom"));
        assert_eq!(caught, Err("boom".to_string()));
    }
}
