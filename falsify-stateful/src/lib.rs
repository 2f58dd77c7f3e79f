//! # Falsify Stateful
//!
//! Stateful property testing on top of `falsify`: declare how to build a
//! target, the steps that can be applied to it and the invariants it must
//! keep, and let the search loop find and simplify a sequence of steps that
//! breaks it.
//!
//! A sequence is just another generated value. Its descriptor is a list of
//! one-of over the declared steps, each step tagged with its name and
//! carrying a tuple of arguments, so simplification drops steps and
//! simplifies their arguments with the ordinary composite rules.
//!
//! ## Quick Example
//!
//! ```rust
//! use falsify::{Descriptor, Falsifier, FalsifyConfig, Value};
//! use falsify_stateful::prelude::*;
//!
//! // A stack whose pop forgets to remove the top element
//! #[derive(Debug, Default)]
//! struct Stack {
//!     items: Vec<i64>,
//! }
//!
//! let test = StatefulTest::new(Stack::default)
//!     .step("push", vec![Descriptor::Int], |s: &mut Stack, args: &[Value]| {
//!         s.items.push(args[0].as_int().unwrap_or(0));
//!     })
//!     .step_with_precondition(
//!         "pop",
//!         vec![],
//!         |s: &Stack| !s.items.is_empty(),
//!         |s: &mut Stack, _: &[Value]| {
//!             let before = s.items.len();
//!             let _top = s.items.last();
//!             s.items.len() + 1 == before
//!         },
//!     );
//!
//! let falsifier = Falsifier::new(FalsifyConfig::default().with_seed(1));
//! let sequence = test.breaking_example_with(&falsifier).unwrap();
//! assert_eq!(sequence.len(), 2);
//! assert!(test.replay(&sequence).is_err());
//! ```

pub mod dsl;
pub mod invariants;
pub mod operations;

pub use dsl::{FailureReason, StatefulTest, StatefulTestFailure, breaking_example};
pub use invariants::{Invariant, InvariantViolation};
pub use operations::{Invocation, OperationSequence, Step};

/// Re-exports for convenient imports
pub mod prelude {
    pub use crate::dsl::*;
    pub use crate::invariants::*;
    pub use crate::operations::*;
}
