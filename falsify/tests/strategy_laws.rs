//! Laws every resolved strategy must obey, fuzzed over many descriptor shapes.

use std::collections::HashSet;

use falsify::strategy::sample_flags;
use falsify::{Descriptor, Registry, Strategy, StrategyRef, Value};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const SIZES: [f64; 6] = [0.0, 1.0, 2.0, 4.0, 8.0, 16.0];

fn shapes() -> Vec<Descriptor> {
    vec![
        Descriptor::Bool,
        Descriptor::Int,
        Descriptor::Float,
        Descriptor::Text,
        Descriptor::int_range(-5, 20),
        Descriptor::int_range(10, 20),
        Descriptor::just(3i64),
        Descriptor::tuple([Descriptor::Int, Descriptor::Text]),
        Descriptor::list(Descriptor::Int),
        Descriptor::set(Descriptor::int_range(0, 50)),
        Descriptor::map(Descriptor::Text, Descriptor::Bool),
        Descriptor::set(Descriptor::Float),
        Descriptor::map(
            Descriptor::one_of([Descriptor::Text, Descriptor::Float]),
            Descriptor::list(Descriptor::Float),
        ),
        Descriptor::one_of([
            Descriptor::Int,
            Descriptor::Text,
            Descriptor::list(Descriptor::Bool),
        ]),
        Descriptor::tagged("point", Descriptor::tuple([Descriptor::Int, Descriptor::Int])),
        Descriptor::list(Descriptor::one_of([
            Descriptor::tagged("add", Descriptor::tuple([Descriptor::Int])),
            Descriptor::tagged("clear", Descriptor::tuple([])),
        ])),
    ]
}

/// Produce a batch of values for `strategy` across every size
fn produce_batch(strategy: &StrategyRef, seed: u64, per_size: usize) -> Vec<Value> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let available = strategy.flags();
    let mut values = Vec::new();
    for size in SIZES {
        for _ in 0..per_size {
            let active = sample_flags(&mut rng, &available);
            if let Ok(value) = strategy.produce(&mut rng, size, &active) {
                values.push(value);
            }
        }
    }
    values
}

#[test]
fn test_produced_values_are_accepted() {
    let registry = Registry::new();
    for descriptor in shapes() {
        let strategy = registry.resolve(&descriptor).unwrap();
        let values = produce_batch(&strategy, 1, 25);
        assert!(!values.is_empty(), "{} produced nothing", descriptor);
        for value in values {
            assert!(
                strategy.could_have_produced(&value),
                "{} rejected its own value {}",
                descriptor,
                value
            );
        }
    }
}

#[test]
fn test_simplifications_are_no_more_complex_and_distinct() {
    let registry = Registry::new();
    for descriptor in shapes() {
        let strategy = registry.resolve(&descriptor).unwrap();
        for value in produce_batch(&strategy, 2, 10) {
            let complexity = strategy.complexity(&value);
            assert!(complexity.is_finite() && complexity >= 0.0);

            let mut seen = HashSet::new();
            for candidate in strategy.simplify(&value).take(500) {
                assert!(
                    strategy.could_have_produced(&candidate),
                    "{}: {} simplified to foreign value {}",
                    descriptor,
                    value,
                    candidate
                );
                assert!(
                    strategy.complexity(&candidate) <= complexity,
                    "{}: {} simplified to more complex {}",
                    descriptor,
                    value,
                    candidate
                );
                assert_ne!(candidate, value, "{}: simplify yielded its source", descriptor);
                assert!(
                    seen.insert(candidate.clone()),
                    "{}: duplicate candidate {} for {}",
                    descriptor,
                    candidate,
                    value
                );
            }
        }
    }
}

#[test]
fn test_simplification_chains_never_cycle() {
    let registry = Registry::new();
    for descriptor in shapes() {
        let strategy = registry.resolve(&descriptor).unwrap();
        for value in produce_batch(&strategy, 3, 5) {
            let mut visited = HashSet::new();
            let mut current = value;
            for _ in 0..1000 {
                assert!(
                    visited.insert(current.clone()),
                    "{}: simplification revisited {}",
                    descriptor,
                    current
                );
                // follow the last candidate to exercise the slowest descent
                match strategy.simplify(&current).take(50).last() {
                    Some(next) => current = next,
                    None => break,
                }
            }
        }
    }
}

#[test]
fn test_mean_complexity_grows_with_size() {
    let registry = Registry::new();
    let growing = [
        Descriptor::Int,
        Descriptor::Float,
        Descriptor::Text,
        Descriptor::list(Descriptor::Int),
        Descriptor::int_range(-1000, 1000),
    ];
    for descriptor in growing {
        let strategy = registry.resolve(&descriptor).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let available = strategy.flags();
        let mut means = Vec::new();
        for size in [1.0, 4.0, 16.0] {
            let mut total = 0.0;
            let mut count = 0;
            for _ in 0..400 {
                let active = sample_flags(&mut rng, &available);
                if let Ok(value) = strategy.produce(&mut rng, size, &active) {
                    total += strategy.complexity(&value);
                    count += 1;
                }
            }
            means.push(total / count as f64);
        }
        assert!(
            means.windows(2).all(|pair| pair[0] <= pair[1]),
            "{}: mean complexity {:?} is not ascending",
            descriptor,
            means
        );
    }
}

#[test]
fn test_resolution_is_deterministic() {
    let first = Registry::new();
    let second = Registry::new();
    let descriptor = Descriptor::map(
        Descriptor::Text,
        Descriptor::list(Descriptor::one_of([Descriptor::Int, Descriptor::Float])),
    );
    let a = first.resolve(&descriptor).unwrap();
    let b = second.resolve(&descriptor).unwrap();
    assert_eq!(a.flags(), b.flags());
    assert_eq!(produce_batch(&a, 5, 10), produce_batch(&b, 5, 10));
}
