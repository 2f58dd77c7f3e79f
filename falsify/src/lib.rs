#![allow(clippy::result_large_err)]

//! # Falsify - Counterexample Search and Minimization
//!
//! Falsify searches for inputs that falsify a predicate and then simplifies
//! the counterexample it found to a locally minimal one. Inputs are described
//! by [`Descriptor`]s, which a [`Registry`] resolves to [`Strategy`]s that
//! know how to produce, measure, validate and simplify values.
//!
//! ## Quick Start
//!
//! ```rust
//! use falsify::{Descriptor, FalsifyConfig, Value, falsify_with_config};
//!
//! let result = falsify_with_config(
//!     |args: &[Value]| {
//!         let xs = args[0].items().unwrap_or(&[]);
//!         xs.iter().filter_map(Value::as_int).sum::<i64>() < 100
//!     },
//!     &[Descriptor::list(Descriptor::int_range(0, 1000))],
//!     FalsifyConfig::default().with_seed(7),
//! )
//! .unwrap();
//!
//! println!("{}", result.summary());
//! ```

pub mod composite;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod execution;
mod parallel;
pub mod primitives;
pub mod property;
pub mod registry;
pub mod rng;
pub mod shrink;
pub mod strategy;
pub mod value;

pub use composite::{
    ListStrategy, MapStrategy, OneOfStrategy, SetStrategy, TaggedStrategy, TupleStrategy,
};
pub use config::{ConfigError, FalsifyConfig, ParallelConfig};
pub use descriptor::{Descriptor, DescriptorKind};
pub use error::{Falsified, FalsifyError, ProduceError, PropertyFailure};
pub use execution::{Falsifier, falsify, falsify_with_config};
pub use primitives::{
    BoolStrategy, FloatStrategy, IntRangeStrategy, IntStrategy, JustStrategy, TextStrategy,
};
pub use property::PropertyOutcome;
pub use registry::{Registry, Rule};
pub use strategy::{Flag, FlagSet, Simplifications, Strategy, StrategyRef, flags};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = FalsifyConfig::default();
        assert_eq!(config.max_attempts, 200);
        assert_eq!(config.max_simplify_rounds, 2000);
        assert_eq!(
            config.size_schedule,
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 6.0, 8.0, 12.0, 16.0, 24.0, 32.0]
        );
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_reexports_resolve() {
        let registry = Registry::new();
        let strategy = registry.resolve(&Descriptor::Bool).unwrap();
        assert!(strategy.could_have_produced(&Value::Bool(true)));
    }
}
