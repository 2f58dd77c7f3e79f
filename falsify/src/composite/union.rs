//! Disjunctions of strategies and named variants.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::composite::member_flags;
use crate::descriptor::Descriptor;
use crate::error::ProduceError;
use crate::strategy::{FlagSet, Simplifications, Strategy, StrategyRef};
use crate::value::Value;

/// Strategy for a value drawn from one of several arms
///
/// A value is attributed to the first arm that accepts it. Complexity and
/// simplification are delegated to that arm, and a candidate is only kept if
/// it is still attributed to the same arm, so simplification never jumps
/// between arms.
#[derive(Debug, Clone)]
pub struct OneOfStrategy {
    descriptor: Descriptor,
    arms: Vec<StrategyRef>,
}

impl OneOfStrategy {
    pub fn new(arms: Vec<StrategyRef>) -> Self {
        Self {
            descriptor: Descriptor::one_of(arms.iter().map(|arm| arm.descriptor().clone())),
            arms,
        }
    }

    /// Index of the arm a value is attributed to
    pub fn attribute(&self, value: &Value) -> Option<usize> {
        self.arms
            .iter()
            .position(|arm| arm.could_have_produced(value))
    }
}

impl Strategy for OneOfStrategy {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn produce(
        &self,
        rng: &mut dyn RngCore,
        size: f64,
        active: &FlagSet,
    ) -> Result<Value, ProduceError> {
        if self.arms.is_empty() {
            return Err(ProduceError::exhausted(&self.descriptor, "no arms"));
        }
        let chosen = rng.gen_range(0..self.arms.len());
        if let Ok(value) = self.arms[chosen].produce(rng, size, active) {
            return Ok(value);
        }
        let mut fallback: Vec<usize> =
            (0..self.arms.len()).filter(|idx| *idx != chosen).collect();
        fallback.shuffle(rng);
        for idx in fallback {
            if let Ok(value) = self.arms[idx].produce(rng, size, active) {
                return Ok(value);
            }
        }
        Err(ProduceError::exhausted(&self.descriptor, "every arm is exhausted"))
    }

    fn flags(&self) -> FlagSet {
        member_flags(&self.arms)
    }

    fn could_have_produced(&self, value: &Value) -> bool {
        self.attribute(value).is_some()
    }

    fn complexity(&self, value: &Value) -> f64 {
        self.attribute(value)
            .map(|idx| self.arms[idx].complexity(value))
            .unwrap_or(0.0)
    }

    fn simplify<'a>(&'a self, value: &Value) -> Simplifications<'a> {
        let Some(idx) = self.attribute(value) else {
            return Box::new(std::iter::empty());
        };
        Box::new(
            self.arms[idx]
                .simplify(value)
                .filter(move |candidate| self.attribute(candidate) == Some(idx)),
        )
    }

    fn parts<'a, 'v>(&'a self, value: &'v Value) -> Vec<(&'a dyn Strategy, &'v Value)> {
        self.attribute(value)
            .map(|idx| (self.arms[idx].as_ref() as &dyn Strategy, value))
            .into_iter()
            .collect()
    }
}

/// Strategy wrapping a payload strategy under a variant name
#[derive(Debug, Clone)]
pub struct TaggedStrategy {
    descriptor: Descriptor,
    tag: String,
    inner: StrategyRef,
}

impl TaggedStrategy {
    pub fn new(tag: impl Into<String>, inner: StrategyRef) -> Self {
        let tag = tag.into();
        Self {
            descriptor: Descriptor::tagged(tag.clone(), inner.descriptor().clone()),
            tag,
            inner,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn payload<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        match value.tag() {
            Some((tag, payload)) if tag == self.tag => Some(payload),
            _ => None,
        }
    }
}

impl Strategy for TaggedStrategy {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn produce(
        &self,
        rng: &mut dyn RngCore,
        size: f64,
        active: &FlagSet,
    ) -> Result<Value, ProduceError> {
        let payload = self.inner.produce(rng, size, active)?;
        Ok(Value::tagged(self.tag.clone(), payload))
    }

    fn flags(&self) -> FlagSet {
        self.inner.flags()
    }

    fn could_have_produced(&self, value: &Value) -> bool {
        self.payload(value)
            .is_some_and(|payload| self.inner.could_have_produced(payload))
    }

    fn complexity(&self, value: &Value) -> f64 {
        self.payload(value)
            .map(|payload| self.inner.complexity(payload))
            .unwrap_or(0.0)
    }

    fn simplify<'a>(&'a self, value: &Value) -> Simplifications<'a> {
        match self.payload(value) {
            Some(payload) => Box::new(
                self.inner
                    .simplify(payload)
                    .map(move |simpler| Value::tagged(self.tag.clone(), simpler)),
            ),
            None => Box::new(std::iter::empty()),
        }
    }

    fn parts<'a, 'v>(&'a self, value: &'v Value) -> Vec<(&'a dyn Strategy, &'v Value)> {
        self.payload(value)
            .map(|payload| (self.inner.as_ref() as &dyn Strategy, payload))
            .into_iter()
            .collect()
    }
}
