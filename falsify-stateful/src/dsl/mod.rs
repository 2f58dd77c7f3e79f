//! Declarative stateful tests driven by the falsify search loop

use std::fmt;
use std::sync::Mutex;

use falsify::property::catch_panic;
use falsify::{Descriptor, Falsifier, FalsifyError, PropertyFailure, PropertyOutcome, Value};
use log::{debug, info, trace};

use crate::invariants::{self, Invariant, InvariantViolation};
use crate::operations::{Invocation, OperationSequence, Step};

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// A stateful property test
///
/// Declares how to build a fresh target, the steps that can be applied to it
/// and the invariants it must keep. Every replay starts from a new target, so
/// candidate sequences never share state.
pub struct StatefulTest<T> {
    name: String,
    factory: Factory<T>,
    steps: Vec<Step<T>>,
    invariants: Vec<Invariant<T>>,
}

impl<T: 'static> StatefulTest<T> {
    /// Create a test whose targets are built by `factory`
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            name: "stateful test".to_string(),
            factory: Box::new(factory),
            steps: Vec::new(),
            invariants: Vec::new(),
        }
    }

    /// Name used in logs and reports
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a step taking one argument per descriptor in `args`
    pub fn step<F, R>(self, name: impl Into<String>, args: Vec<Descriptor>, action: F) -> Self
    where
        F: Fn(&mut T, &[Value]) -> R + Send + Sync + 'static,
        R: PropertyOutcome,
    {
        self.with_step(Step::new(name, args, action))
    }

    /// Declare a step that is skipped whenever `precondition` is false
    pub fn step_with_precondition<P, F, R>(
        self,
        name: impl Into<String>,
        args: Vec<Descriptor>,
        precondition: P,
        action: F,
    ) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
        F: Fn(&mut T, &[Value]) -> R + Send + Sync + 'static,
        R: PropertyOutcome,
    {
        self.with_step(Step::new(name, args, action).with_precondition(precondition))
    }

    /// Add a prepared step; a step with the same name is replaced in place
    pub fn with_step(mut self, step: Step<T>) -> Self {
        match self.steps.iter().position(|s| s.name() == step.name()) {
            Some(idx) => {
                debug!("replacing step {} of {}", step.name(), self.name);
                self.steps[idx] = step;
            }
            None => self.steps.push(step),
        }
        self
    }

    /// Add an invariant checked on the fresh target and after every step
    pub fn invariant<F>(mut self, name: impl Into<String>, check_fn: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.invariants.push(Invariant::new(name, check_fn));
        self
    }

    pub fn steps(&self) -> &[Step<T>] {
        &self.steps
    }

    pub fn invariants(&self) -> &[Invariant<T>] {
        &self.invariants
    }

    /// `list(one_of(tagged(name, tuple(args)) for each step))`
    pub fn descriptor(&self) -> Descriptor {
        Descriptor::list(Descriptor::one_of(self.steps.iter().map(Step::descriptor)))
    }

    fn find_step(&self, name: &str) -> Option<&Step<T>> {
        self.steps.iter().find(|step| step.name() == name)
    }

    fn check_invariants(&self, target: &T) -> Result<(), FailureReason> {
        invariants::verify_all(&self.invariants, target).map_err(FailureReason::Invariant)
    }

    /// Execute a sequence against a fresh target
    ///
    /// Steps whose precondition is false are skipped. Returns the final
    /// target, or the first step outcome, panic or invariant violation that
    /// failed the sequence.
    pub fn replay(&self, sequence: &OperationSequence) -> Result<T, StatefulTestFailure> {
        let mut target = catch_panic(|| (self.factory)())
            .map_err(|message| StatefulTestFailure::initial(FailureReason::Panicked(message)))?;
        self.check_invariants(&target)
            .map_err(StatefulTestFailure::initial)?;

        for (index, invocation) in sequence.iter().enumerate() {
            let fail = |reason| StatefulTestFailure {
                operation_index: Some(index),
                invocation: Some(invocation.clone()),
                reason,
            };

            let Some(step) = self.find_step(&invocation.step) else {
                return Err(fail(FailureReason::UnknownStep(invocation.step.clone())));
            };
            if invocation.args.len() != step.args().len() {
                return Err(fail(FailureReason::Arity {
                    step: invocation.step.clone(),
                    expected: step.args().len(),
                    found: invocation.args.len(),
                }));
            }

            match catch_panic(|| step.is_enabled(&target)) {
                Ok(true) => {}
                Ok(false) => {
                    trace!("skipping {} at index {}: precondition false", invocation, index);
                    continue;
                }
                Err(message) => return Err(fail(FailureReason::Panicked(message))),
            }

            match catch_panic(|| step.execute(&mut target, &invocation.args)) {
                Ok(Ok(())) => {}
                Ok(Err(failure)) => return Err(fail(FailureReason::Step(failure))),
                Err(message) => return Err(fail(FailureReason::Panicked(message))),
            }

            self.check_invariants(&target).map_err(fail)?;
        }

        Ok(target)
    }

    /// Search for a failing operation sequence with the default configuration
    pub fn breaking_example(&self) -> Result<OperationSequence, FalsifyError> {
        self.breaking_example_with(&Falsifier::default())
    }

    /// Search for a failing operation sequence and simplify it
    ///
    /// The sequence is generated from [`descriptor`](Self::descriptor), so
    /// simplification drops steps and simplifies step arguments. Returns
    /// `Unfalsifiable` when every replay succeeds, and a contract violation
    /// when a generated sequence names an unknown step or is malformed.
    pub fn breaking_example_with(
        &self,
        falsifier: &Falsifier,
    ) -> Result<OperationSequence, FalsifyError> {
        let falsifier = falsifier.clone().named(self.name.clone());
        let descriptor = self.descriptor();
        let violation: Mutex<Option<FalsifyError>> = Mutex::new(None);
        let record = |value: &Value, reason: String| {
            violation
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .get_or_insert_with(|| {
                    FalsifyError::contract_violation(&descriptor, Some(value), reason)
                });
        };

        info!(
            "looking for a breaking example of {} over {} steps",
            self.name,
            self.steps.len()
        );
        let predicate = |args: &[Value]| -> Result<(), StatefulTestFailure> {
            let Some(value) = args.first() else {
                return Ok(());
            };
            let sequence = match OperationSequence::from_value(value) {
                Ok(sequence) => sequence,
                Err(reason) => {
                    record(value, reason);
                    return Ok(());
                }
            };
            match self.replay(&sequence) {
                Ok(_) => Ok(()),
                Err(failure) if failure.reason.is_malformed() => {
                    record(value, failure.to_string());
                    Ok(())
                }
                Err(failure) => Err(failure),
            }
        };
        let result = falsifier.run(predicate, std::slice::from_ref(&descriptor));

        if let Some(err) = violation
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
        {
            return Err(err);
        }
        let falsified = result?;
        let Some(minimal) = falsified.minimal.first() else {
            return Err(FalsifyError::contract_violation(
                &descriptor,
                None,
                "no operation sequence in the counterexample",
            ));
        };
        let sequence = OperationSequence::from_value(minimal)
            .map_err(|reason| FalsifyError::contract_violation(&descriptor, Some(minimal), reason))?;
        info!(
            "{} broken by {} after {} simplification steps",
            self.name, sequence, falsified.shrink_steps
        );
        Ok(sequence)
    }
}

impl<T> fmt::Debug for StatefulTest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatefulTest")
            .field("name", &self.name)
            .field("steps", &self.steps)
            .field("invariants", &self.invariants)
            .finish()
    }
}

/// Search for a failing operation sequence of `test` with the default configuration
pub fn breaking_example<T: 'static>(
    test: &StatefulTest<T>,
) -> Result<OperationSequence, FalsifyError> {
    test.breaking_example()
}

/// Why a replay failed
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// The step reported a failed postcondition
    Step(PropertyFailure),
    /// A step, its precondition or the factory panicked
    Panicked(String),
    Invariant(InvariantViolation),
    /// The sequence names a step that was never declared
    UnknownStep(String),
    /// The invocation carries the wrong number of arguments
    Arity {
        step: String,
        expected: usize,
        found: usize,
    },
}

impl FailureReason {
    /// True when the sequence itself does not fit the declared steps
    pub fn is_malformed(&self) -> bool {
        matches!(self, FailureReason::UnknownStep(_) | FailureReason::Arity { .. })
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Step(failure) => write!(f, "{}", failure),
            FailureReason::Panicked(message) => write!(f, "panicked: {}", message),
            FailureReason::Invariant(violation) => write!(f, "{}", violation),
            FailureReason::UnknownStep(step) => write!(f, "unknown step {}", step),
            FailureReason::Arity {
                step,
                expected,
                found,
            } => write!(
                f,
                "step {} takes {} arguments but was given {}",
                step, expected, found
            ),
        }
    }
}

/// Represents a failure in a stateful test
#[derive(Debug, Clone, PartialEq)]
pub struct StatefulTestFailure {
    /// Index of the failing invocation; `None` when the fresh target failed
    pub operation_index: Option<usize>,
    pub invocation: Option<Invocation>,
    pub reason: FailureReason,
}

impl StatefulTestFailure {
    fn initial(reason: FailureReason) -> Self {
        Self {
            operation_index: None,
            invocation: None,
            reason,
        }
    }
}

impl fmt::Display for StatefulTestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stateful test failed: {}", self.reason)?;
        if let Some(idx) = self.operation_index {
            write!(f, "\n  At operation index: {}", idx)?;
        }
        if let Some(ref invocation) = self.invocation {
            write!(f, "\n  Operation: {}", invocation)?;
        }
        Ok(())
    }
}

impl std::error::Error for StatefulTestFailure {}
