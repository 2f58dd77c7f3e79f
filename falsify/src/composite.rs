//! Strategies for structured values, built from member strategies.
//!
//! Composites never inspect their members beyond the [`Strategy`] trait:
//! they aggregate member complexities, union member flags and simplify one
//! member at a time. Simplification order is deterministic for every
//! composite.
//!
//! [`Strategy`]: crate::strategy::Strategy

pub mod collections;
pub mod tuple;
pub mod union;

pub use collections::{ListStrategy, MapStrategy, SetStrategy};
pub use tuple::TupleStrategy;
pub use union::{OneOfStrategy, TaggedStrategy};

use crate::strategy::{FlagSet, StrategyRef};

/// Union of the flags of every member
pub(crate) fn member_flags<'a>(members: impl IntoIterator<Item = &'a StrategyRef>) -> FlagSet {
    members
        .into_iter()
        .flat_map(|member| member.flags())
        .collect()
}
