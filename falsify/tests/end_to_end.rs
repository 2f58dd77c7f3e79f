//! End-to-end searches through the public entry points.

use falsify::{
    Descriptor, Falsifier, FalsifyConfig, FalsifyError, ParallelConfig, Registry, Value, falsify,
    falsify_with_config,
};

fn seeded(seed: u64) -> FalsifyConfig {
    FalsifyConfig::default().with_seed(seed)
}

fn floats(args: &[Value]) -> (f64, f64, f64) {
    let get = |idx: usize| args[idx].as_float().unwrap_or(0.0);
    (get(0), get(1), get(2))
}

fn associative(args: &[Value]) -> bool {
    let (x, y, z) = floats(args);
    (x + y) + z == x + (y + z)
}

#[test]
fn test_float_addition_is_not_associative() {
    let descriptors = [Descriptor::Float, Descriptor::Float, Descriptor::Float];
    let result = falsify_with_config(associative, &descriptors, seeded(17)).unwrap();

    let (x, y, z) = floats(&result.minimal);
    assert_ne!((x + y) + z, x + (y + z));

    let registry = Registry::new();
    let strategy = registry.resolve(&Descriptor::tuple(descriptors)).unwrap();
    let original = Value::Tuple(result.original.clone());
    assert!(result.complexity <= strategy.complexity(&original));

    // the minimal witness is a fixed point: no simplification still falsifies
    let minimal = Value::Tuple(result.minimal.clone());
    for candidate in strategy.simplify(&minimal) {
        match &candidate {
            Value::Tuple(args) => assert!(associative(args), "{} still falsifies", candidate),
            other => panic!("unexpected candidate {}", other),
        }
    }
}

#[test]
fn test_float_witnesses_are_fixed_points_across_seeds() {
    let descriptors = [Descriptor::Float, Descriptor::Float, Descriptor::Float];
    let strategy = Registry::new()
        .resolve(&Descriptor::tuple(descriptors.clone()))
        .unwrap();
    for seed in 0..20 {
        let config = seeded(seed);
        let rounds = config.max_simplify_rounds;
        let result = falsify_with_config(associative, &descriptors, config).unwrap();
        assert!(
            result.shrink_steps < rounds / 4,
            "seed {} needed {} simplification rounds",
            seed,
            result.shrink_steps
        );
        let minimal = Value::Tuple(result.minimal.clone());
        for candidate in strategy.simplify(&minimal) {
            match &candidate {
                Value::Tuple(args) => assert!(
                    associative(args),
                    "seed {}: {} still falsifies below {}",
                    seed,
                    candidate,
                    minimal
                ),
                other => panic!("unexpected candidate {}", other),
            }
        }
    }
}

#[test]
fn test_sum_counterexample_is_deletion_minimal() {
    let predicate = |args: &[Value]| {
        let xs = args[0].items().unwrap_or(&[]);
        xs.iter().filter_map(Value::as_int).sum::<i64>() < 100
    };
    let result =
        falsify_with_config(predicate, &[Descriptor::list(Descriptor::Int)], seeded(5)).unwrap();

    let xs: Vec<i64> = result.minimal[0]
        .items()
        .unwrap()
        .iter()
        .filter_map(Value::as_int)
        .collect();
    assert!(xs.iter().sum::<i64>() >= 100);
    for skip in 0..xs.len() {
        let rest: i64 = xs
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != skip)
            .map(|(_, x)| x)
            .sum();
        assert!(rest < 100, "dropping index {} of {:?} still falsifies", skip, xs);
    }
}

#[test]
fn test_commutative_addition_is_unfalsifiable() {
    let err = falsify(
        |args: &[Value]| {
            let x = args[0].as_int().unwrap_or(0);
            x.wrapping_add(1) == 1i64.wrapping_add(x)
        },
        &[Descriptor::Int],
    )
    .unwrap_err();
    match err {
        FalsifyError::Unfalsifiable {
            attempts, skipped, ..
        } => {
            assert_eq!(attempts, 200);
            assert_eq!(skipped, 0);
        }
        other => panic!("expected Unfalsifiable, got {}", other),
    }
}

#[test]
fn test_named_predicate_in_unfalsifiable_report() {
    let err = Falsifier::new(seeded(1).with_max_attempts(20))
        .named("always_true")
        .run(|_: &[Value]| true, &[Descriptor::Bool])
        .unwrap_err();
    assert_eq!(err.to_string(), "Unable to falsify always_true after 20 attempts");
}

#[test]
fn test_minimal_text_counterexample() {
    let result = falsify_with_config(
        |args: &[Value]| args[0].as_text().is_some_and(|s| !s.contains('z')),
        &[Descriptor::Text],
        seeded(23).with_max_attempts(500),
    )
    .unwrap();
    assert_eq!(result.minimal, vec![Value::Text("z".to_string())]);
}

#[test]
fn test_minimal_tuple_counterexample() {
    let result = falsify_with_config(
        |args: &[Value]| {
            let a = args[0].as_int().unwrap_or(0);
            let b = args[1].as_bool().unwrap_or(false);
            !(b && a > 5)
        },
        &[Descriptor::Int, Descriptor::Bool],
        seeded(8),
    )
    .unwrap();
    assert_eq!(result.minimal, vec![Value::Int(6), Value::Bool(true)]);
    assert!(result.summary().starts_with("Falsified with (6, true)"));
}

#[test]
fn test_panicking_predicate_is_a_falsification() {
    let result = falsify_with_config(
        |args: &[Value]| {
            let xs = args[0].items().unwrap_or(&[]);
            assert!(xs.len() < 3, "too many items");
        },
        &[Descriptor::list(Descriptor::Bool)],
        seeded(2),
    )
    .unwrap();
    assert_eq!(result.minimal[0].items().map(<[Value]>::len), Some(3));
    assert!(result.failure.message.contains("too many items"));
}

#[test]
fn test_result_predicate_message_is_kept() {
    let result = falsify_with_config(
        |args: &[Value]| -> Result<(), String> {
            match args[0].as_int() {
                Some(x) if x >= 3 => Err(format!("{} is at least 3", x)),
                _ => Ok(()),
            }
        },
        &[Descriptor::int_range(0, 100)],
        seeded(4),
    )
    .unwrap();
    assert_eq!(result.minimal, vec![Value::Int(3)]);
    assert_eq!(result.failure.message, "3 is at least 3");
    assert!(result.detailed_report().contains("Minimal input: (3)"));
}

#[test]
fn test_parallel_search_finds_same_minimum() {
    let predicate = |args: &[Value]| args[0].as_int().is_none_or(|x| x < 10);
    let config = seeded(12).with_parallel(ParallelConfig::with_threads(4));
    let result = falsify_with_config(predicate, &[Descriptor::Int], config).unwrap();
    assert_eq!(result.minimal, vec![Value::Int(10)]);
    assert_eq!(result.attempts, 200);
}

#[test]
fn test_set_and_map_counterexamples() {
    let result = falsify_with_config(
        |args: &[Value]| args[0].items().is_none_or(|xs| xs.len() < 2),
        &[Descriptor::set(Descriptor::int_range(0, 1000))],
        seeded(6),
    )
    .unwrap();
    assert_eq!(result.minimal, vec![Value::set_from([Value::Int(0), Value::Int(1)])]);

    let result = falsify_with_config(
        |args: &[Value]| {
            args[0]
                .entries()
                .is_none_or(|entries| entries.iter().all(|(_, v)| v.as_bool() != Some(true)))
        },
        &[Descriptor::map(Descriptor::Int, Descriptor::Bool)],
        seeded(6),
    )
    .unwrap();
    assert_eq!(
        result.minimal,
        vec![Value::map_from([(Value::Int(0), Value::Bool(true))])]
    );
}
