//! Step declarations and the operation sequences generated from them

use std::fmt;

use falsify::{Descriptor, PropertyFailure, PropertyOutcome, Value};

type Action<T> = Box<dyn Fn(&mut T, &[Value]) -> Result<(), PropertyFailure> + Send + Sync>;
type Precondition<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// A named operation against a target of type `T`
///
/// The action receives the live target and one argument per descriptor in
/// `args`. It is expected to check its own postconditions: returning `false`,
/// an `Err` or panicking fails the sequence being replayed.
pub struct Step<T> {
    name: String,
    args: Vec<Descriptor>,
    precondition: Option<Precondition<T>>,
    action: Action<T>,
}

impl<T> Step<T> {
    pub fn new<F, R>(name: impl Into<String>, args: Vec<Descriptor>, action: F) -> Self
    where
        F: Fn(&mut T, &[Value]) -> R + Send + Sync + 'static,
        R: PropertyOutcome,
    {
        Self {
            name: name.into(),
            args,
            precondition: None,
            action: Box::new(move |target: &mut T, values: &[Value]| {
                action(target, values).into_outcome()
            }),
        }
    }

    /// Only run this step when `precondition` holds for the current target
    pub fn with_precondition<P>(mut self, precondition: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.precondition = Some(Box::new(precondition));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Descriptor] {
        &self.args
    }

    /// `tagged(name, tuple(args))`
    pub fn descriptor(&self) -> Descriptor {
        Descriptor::tagged(self.name.clone(), Descriptor::tuple(self.args.clone()))
    }

    pub fn is_enabled(&self, target: &T) -> bool {
        self.precondition
            .as_ref()
            .is_none_or(|precondition| precondition(target))
    }

    pub fn execute(&self, target: &mut T, args: &[Value]) -> Result<(), PropertyFailure> {
        (self.action)(target, args)
    }
}

impl<T> fmt::Debug for Step<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("has_precondition", &self.precondition.is_some())
            .finish()
    }
}

/// One step call with its arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Invocation {
    pub step: String,
    pub args: Vec<Value>,
}

impl Invocation {
    pub fn new(step: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            step: step.into(),
            args,
        }
    }

    /// Read an invocation from its `tagged(step, tuple(args))` value
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Tagged(step, payload) => match payload.as_ref() {
                Value::Tuple(args) => Ok(Self::new(step.clone(), args.clone())),
                other => Err(format!(
                    "arguments of step {} are not a tuple: {}",
                    step, other
                )),
            },
            other => Err(format!("not a step invocation: {}", other)),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::tagged(self.step.clone(), Value::Tuple(self.args.clone()))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

/// An ordered list of step invocations
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OperationSequence {
    invocations: Vec<Invocation>,
}

impl OperationSequence {
    /// Create a new empty sequence
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(invocations: Vec<Invocation>) -> Self {
        Self { invocations }
    }

    /// Read a sequence from a generated list of invocation values
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::List(items) => items
                .iter()
                .map(Invocation::from_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::from_vec),
            other => Err(format!("not an operation sequence: {}", other)),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::List(self.invocations.iter().map(Invocation::to_value).collect())
    }

    pub fn push(&mut self, invocation: Invocation) {
        self.invocations.push(invocation);
    }

    pub fn invocations(&self) -> &[Invocation] {
        &self.invocations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Invocation> {
        self.invocations.iter()
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }
}

impl<'a> IntoIterator for &'a OperationSequence {
    type Item = &'a Invocation;
    type IntoIter = std::slice::Iter<'a, Invocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Invocation> for OperationSequence {
    fn from_iter<I: IntoIterator<Item = Invocation>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl fmt::Display for OperationSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_descriptor() {
        let step = Step::new(
            "push",
            vec![Descriptor::Int],
            |target: &mut Vec<i64>, args: &[Value]| target.push(args[0].as_int().unwrap_or(0)),
        );
        assert_eq!(
            step.descriptor(),
            Descriptor::tagged("push", Descriptor::tuple([Descriptor::Int]))
        );
        assert_eq!(step.descriptor().to_string(), "push(int)");
    }

    #[test]
    fn test_precondition_gates_step() {
        let step = Step::new("pop", vec![], |target: &mut Vec<i64>, _: &[Value]| {
            target.pop().is_some()
        })
        .with_precondition(|target: &Vec<i64>| !target.is_empty());
        assert!(!step.is_enabled(&vec![]));
        assert!(step.is_enabled(&vec![1]));

        let mut target = vec![1];
        assert!(step.execute(&mut target, &[]).is_ok());
        assert!(step.execute(&mut target, &[]).is_err());
    }

    #[test]
    fn test_sequence_from_value() {
        let value = Value::List(vec![
            Value::tagged("add", Value::Tuple(vec![Value::Int(3)])),
            Value::tagged("clear", Value::Tuple(vec![])),
        ]);
        let sequence = OperationSequence::from_value(&value).unwrap();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.invocations()[0], Invocation::new("add", vec![Value::Int(3)]));
        assert_eq!(sequence.to_value(), value);
        assert_eq!(sequence.to_string(), "[add(3), clear()]");
    }

    #[test]
    fn test_malformed_sequences_are_rejected() {
        assert!(OperationSequence::from_value(&Value::Int(1)).is_err());
        let untagged = Value::List(vec![Value::Tuple(vec![])]);
        assert!(OperationSequence::from_value(&untagged).is_err());
        let bare_payload = Value::List(vec![Value::tagged("add", Value::Int(3))]);
        let err = OperationSequence::from_value(&bare_payload).unwrap_err();
        assert!(err.contains("not a tuple"));
    }
}
