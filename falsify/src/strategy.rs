//! The strategy abstraction: produce, measure, validate and simplify values.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use rand::{Rng, RngCore};

use crate::descriptor::Descriptor;
use crate::error::ProduceError;
use crate::value::Value;

/// Upper bound on generated collection lengths
pub const MAX_COLLECTION_LEN: usize = 4096;

/// An opaque production hint a strategy declares it understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Flag(&'static str);

impl Flag {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Flags understood by the built-in strategies
pub mod flags {
    use super::Flag;

    pub const INT_NON_NEGATIVE: Flag = Flag::new("int.non_negative");
    pub const INT_SMALL: Flag = Flag::new("int.small");
    pub const FLOAT_NON_NEGATIVE: Flag = Flag::new("float.non_negative");
    pub const FLOAT_INTEGRAL: Flag = Flag::new("float.integral");
    pub const TEXT_ALLOW_EMPTY: Flag = Flag::new("text.allow_empty");
    pub const TEXT_LOWERCASE: Flag = Flag::new("text.lowercase");
    pub const SEQ_ALLOW_EMPTY: Flag = Flag::new("seq.allow_empty");
    pub const SET_ALLOW_EMPTY: Flag = Flag::new("set.allow_empty");
    pub const MAP_ALLOW_EMPTY: Flag = Flag::new("map.allow_empty");
}

pub type FlagSet = BTreeSet<Flag>;

/// Lazily produced simplification candidates
pub type Simplifications<'a> = Box<dyn Iterator<Item = Value> + 'a>;

/// Shared handle to a resolved strategy
pub type StrategyRef = Arc<dyn Strategy>;

/// A generation and simplification policy for one value space
///
/// Implementations hold no mutable state: all entropy comes from the `rng`
/// handed to [`produce`](Strategy::produce), so a strategy can be shared
/// freely between threads. Every implementation must satisfy:
///
/// 1. `produce` only yields values accepted by `could_have_produced`.
/// 2. `complexity` and `simplify` never panic on accepted values.
/// 3. Larger sizes never lower the expected complexity of produced values.
/// 4. Every simplification is no more complex than its source.
/// 5. `simplify` yields no duplicates and never the source itself.
/// 6. Following simplifications can never lead back to an earlier value.
pub trait Strategy: Send + Sync {
    /// The descriptor this strategy was resolved from
    fn descriptor(&self) -> &Descriptor;

    /// Produce a value of roughly `size` complexity, biased by `flags`
    fn produce(
        &self,
        rng: &mut dyn RngCore,
        size: f64,
        flags: &FlagSet,
    ) -> Result<Value, ProduceError>;

    /// Flags this strategy (or any member strategy) reacts to
    fn flags(&self) -> FlagSet {
        FlagSet::new()
    }

    /// Whether `value` belongs to this strategy's value space. Must be total.
    fn could_have_produced(&self, value: &Value) -> bool;

    /// Non-negative measure used to order this strategy's own values
    fn complexity(&self, value: &Value) -> f64;

    /// Candidates simpler than `value`, in a deterministic order
    fn simplify<'a>(&'a self, value: &Value) -> Simplifications<'a>;

    /// Member strategies paired with the parts of `value` they own
    ///
    /// Contract violations are reported against the innermost member at
    /// fault, found by walking these pairs. Leaf strategies own no parts.
    fn parts<'a, 'v>(&'a self, _value: &'v Value) -> Vec<(&'a dyn Strategy, &'v Value)> {
        Vec::new()
    }
}

impl fmt::Debug for dyn Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Strategy({})", self.descriptor())
    }
}

/// Pick a random subset of `available`, each flag with probability one half
pub fn sample_flags(rng: &mut dyn RngCore, available: &FlagSet) -> FlagSet {
    available
        .iter()
        .copied()
        .filter(|_| rng.gen_bool(0.5))
        .collect()
}

/// Draw a collection length with mean `size` from a geometric distribution
pub(crate) fn collection_length(rng: &mut dyn RngCore, size: f64, allow_empty: bool) -> usize {
    let length = if size <= 0.0 {
        0
    } else {
        // P(length >= k) = p^k, which gives a mean of exactly `size`
        let p = size / (size + 1.0);
        let u = 1.0 - rng.r#gen::<f64>();
        let drawn = (u.ln() / p.ln()).floor();
        if drawn.is_finite() && drawn >= 0.0 {
            (drawn as usize).min(MAX_COLLECTION_LEN)
        } else {
            MAX_COLLECTION_LEN
        }
    };
    if length == 0 && !allow_empty { 1 } else { length }
}

/// Drop duplicates and the source value from a candidate stream
pub(crate) fn distinct<'a>(
    source: &Value,
    candidates: impl Iterator<Item = Value> + 'a,
) -> Simplifications<'a> {
    let mut seen = HashSet::new();
    seen.insert(source.clone());
    Box::new(candidates.filter(move |candidate| seen.insert(candidate.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_sample_flags_is_subset() {
        let mut rng = StdRng::seed_from_u64(7);
        let available: FlagSet = [flags::INT_SMALL, flags::SEQ_ALLOW_EMPTY, flags::TEXT_LOWERCASE]
            .into_iter()
            .collect();
        for _ in 0..50 {
            let chosen = sample_flags(&mut rng, &available);
            assert!(chosen.is_subset(&available));
        }
    }

    #[test]
    fn test_collection_length_respects_allow_empty() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            assert_eq!(collection_length(&mut rng, 0.0, true), 0);
            assert_eq!(collection_length(&mut rng, 0.0, false), 1);
            assert!(collection_length(&mut rng, 3.0, false) >= 1);
        }
    }

    #[test]
    fn test_collection_length_mean_tracks_size() {
        let mut rng = StdRng::seed_from_u64(3);
        let samples = 4000;
        let mean = |rng: &mut StdRng, size: f64| {
            (0..samples)
                .map(|_| collection_length(rng, size, true) as f64)
                .sum::<f64>()
                / samples as f64
        };
        let small = mean(&mut rng, 2.0);
        let large = mean(&mut rng, 8.0);
        assert!((small - 2.0).abs() < 0.5, "mean at size 2 was {}", small);
        assert!(large > small);
    }

    #[test]
    fn test_distinct_drops_source_and_duplicates() {
        let source = Value::Int(3);
        let candidates = vec![Value::Int(0), Value::Int(3), Value::Int(1), Value::Int(0)];
        let result: Vec<Value> = distinct(&source, candidates.into_iter()).collect();
        assert_eq!(result, vec![Value::Int(0), Value::Int(1)]);
    }
}
