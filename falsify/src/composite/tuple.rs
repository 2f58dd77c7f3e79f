//! Fixed-arity tuples of independent members.

use std::rc::Rc;

use rand::RngCore;

use crate::composite::member_flags;
use crate::descriptor::Descriptor;
use crate::error::ProduceError;
use crate::strategy::{FlagSet, Simplifications, Strategy, StrategyRef, distinct};
use crate::value::Value;

/// Strategy for positional, heterogeneous tuples
#[derive(Debug, Clone)]
pub struct TupleStrategy {
    descriptor: Descriptor,
    members: Vec<StrategyRef>,
}

impl TupleStrategy {
    pub fn new(members: Vec<StrategyRef>) -> Self {
        let descriptor =
            Descriptor::tuple(members.iter().map(|member| member.descriptor().clone()));
        Self {
            descriptor,
            members,
        }
    }

    pub fn members(&self) -> &[StrategyRef] {
        &self.members
    }
}

impl Strategy for TupleStrategy {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn produce(
        &self,
        rng: &mut dyn RngCore,
        size: f64,
        active: &FlagSet,
    ) -> Result<Value, ProduceError> {
        let items = self
            .members
            .iter()
            .map(|member| member.produce(rng, size, active))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Tuple(items))
    }

    fn flags(&self) -> FlagSet {
        member_flags(&self.members)
    }

    fn could_have_produced(&self, value: &Value) -> bool {
        match value {
            Value::Tuple(items) => {
                items.len() == self.members.len()
                    && self
                        .members
                        .iter()
                        .zip(items)
                        .all(|(member, item)| member.could_have_produced(item))
            }
            _ => false,
        }
    }

    fn complexity(&self, value: &Value) -> f64 {
        match value {
            Value::Tuple(items) => self
                .members
                .iter()
                .zip(items)
                .map(|(member, item)| member.complexity(item))
                .sum(),
            _ => 0.0,
        }
    }

    fn simplify<'a>(&'a self, value: &Value) -> Simplifications<'a> {
        let items = match value {
            Value::Tuple(items) if items.len() == self.members.len() => Rc::new(items.clone()),
            _ => return Box::new(std::iter::empty()),
        };
        let candidates = self
            .members
            .iter()
            .enumerate()
            .flat_map(move |(idx, member)| {
                let items = Rc::clone(&items);
                member.simplify(&items[idx]).map(move |simpler| {
                    let mut replaced = items.to_vec();
                    replaced[idx] = simpler;
                    Value::Tuple(replaced)
                })
            });
        distinct(value, candidates)
    }

    fn parts<'a, 'v>(&'a self, value: &'v Value) -> Vec<(&'a dyn Strategy, &'v Value)> {
        match value {
            Value::Tuple(items) if items.len() == self.members.len() => self
                .members
                .iter()
                .map(|member| member.as_ref() as &dyn Strategy)
                .zip(items)
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{BoolStrategy, IntStrategy};
    use crate::strategy::flags;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;

    fn pair() -> TupleStrategy {
        TupleStrategy::new(vec![Arc::new(IntStrategy::new()), Arc::new(BoolStrategy::new())])
    }

    #[test]
    fn test_descriptor_and_flags() {
        let strategy = pair();
        assert_eq!(
            strategy.descriptor(),
            &Descriptor::tuple([Descriptor::Int, Descriptor::Bool])
        );
        assert!(strategy.flags().contains(&flags::INT_SMALL));
    }

    #[test]
    fn test_produce_is_accepted() {
        let strategy = pair();
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        for size in [0.0, 4.0, 16.0] {
            let value = strategy.produce(&mut rng, size, &FlagSet::new()).unwrap();
            assert!(strategy.could_have_produced(&value));
        }
        assert!(!strategy.could_have_produced(&Value::Tuple(vec![Value::Int(1)])));
    }

    #[test]
    fn test_simplify_position_by_position() {
        let strategy = pair();
        let value = Value::Tuple(vec![Value::Int(2), Value::Bool(true)]);
        let simpler: Vec<Value> = strategy.simplify(&value).collect();
        assert_eq!(
            simpler,
            vec![
                Value::Tuple(vec![Value::Int(0), Value::Bool(true)]),
                Value::Tuple(vec![Value::Int(1), Value::Bool(true)]),
                Value::Tuple(vec![Value::Int(2), Value::Bool(false)]),
            ]
        );
        assert_eq!(strategy.complexity(&value), 3f64.log2() + 1.0);
    }
}
