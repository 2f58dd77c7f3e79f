//! Named conditions a target must keep on creation and after every step.

use std::fmt;

use falsify::property::catch_panic;

type Check<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// A named condition over the target
pub struct Invariant<T> {
    name: String,
    check: Check<T>,
}

impl<T> Invariant<T> {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Box::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the condition, turning a panic into a violation
    pub fn verify(&self, target: &T) -> Result<(), InvariantViolation> {
        match catch_panic(|| (self.check)(target)) {
            Ok(true) => Ok(()),
            Ok(false) => Err(InvariantViolation::broken(&self.name)),
            Err(message) => Err(InvariantViolation {
                invariant: self.name.clone(),
                panic: Some(message),
            }),
        }
    }
}

impl<T> fmt::Debug for Invariant<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Invariant").field(&self.name).finish()
    }
}

/// Verify `invariants` in declaration order, stopping at the first violation
pub fn verify_all<T>(invariants: &[Invariant<T>], target: &T) -> Result<(), InvariantViolation> {
    invariants
        .iter()
        .try_for_each(|invariant| invariant.verify(target))
}

/// The invariant that stopped holding, and the panic message if checking it panicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    pub invariant: String,
    pub panic: Option<String>,
}

impl InvariantViolation {
    /// A plain `false` from the named invariant
    pub fn broken(invariant: impl Into<String>) -> Self {
        Self {
            invariant: invariant.into(),
            panic: None,
        }
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.panic {
            None => write!(f, "invariant {} does not hold", self.invariant),
            Some(message) => write!(f, "invariant {} panicked: {}", self.invariant, message),
        }
    }
}

impl std::error::Error for InvariantViolation {}
