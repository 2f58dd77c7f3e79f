//! Variable-length collections: lists, sets and maps.

use std::rc::Rc;

use rand::RngCore;

use crate::descriptor::Descriptor;
use crate::error::ProduceError;
use crate::shrink;
use crate::strategy::{
    FlagSet, Simplifications, Strategy, StrategyRef, collection_length, distinct, flags,
};
use crate::value::Value;

/// Every single-position replacement of `items` by a simplification of that position
fn replaced_items<'a>(
    element: &'a StrategyRef,
    items: Rc<Vec<Value>>,
) -> impl Iterator<Item = (usize, Value, Rc<Vec<Value>>)> + 'a {
    (0..items.len()).flat_map(move |idx| {
        let items = Rc::clone(&items);
        element
            .simplify(&items[idx])
            .map(move |simpler| (idx, simpler, Rc::clone(&items)))
    })
}

fn is_strictly_ascending<T: Ord>(items: impl IntoIterator<Item = T>) -> bool {
    let mut previous: Option<T> = None;
    for item in items {
        if let Some(prev) = &previous
            && *prev >= item
        {
            return false;
        }
        previous = Some(item);
    }
    true
}

/// Strategy for homogeneous lists
#[derive(Debug, Clone)]
pub struct ListStrategy {
    descriptor: Descriptor,
    element: StrategyRef,
}

impl ListStrategy {
    pub fn new(element: StrategyRef) -> Self {
        Self {
            descriptor: Descriptor::list(element.descriptor().clone()),
            element,
        }
    }
}

impl Strategy for ListStrategy {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn produce(
        &self,
        rng: &mut dyn RngCore,
        size: f64,
        active: &FlagSet,
    ) -> Result<Value, ProduceError> {
        let len = collection_length(rng, size, active.contains(&flags::SEQ_ALLOW_EMPTY));
        let items = (0..len)
            .map(|_| self.element.produce(rng, size, active))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::List(items))
    }

    fn flags(&self) -> FlagSet {
        let mut available = self.element.flags();
        available.insert(flags::SEQ_ALLOW_EMPTY);
        available
    }

    fn could_have_produced(&self, value: &Value) -> bool {
        match value {
            Value::List(items) => items.iter().all(|item| self.element.could_have_produced(item)),
            _ => false,
        }
    }

    fn complexity(&self, value: &Value) -> f64 {
        match value {
            Value::List(items) => {
                items.len() as f64
                    + items
                        .iter()
                        .map(|item| self.element.complexity(item))
                        .sum::<f64>()
            }
            _ => 0.0,
        }
    }

    fn simplify<'a>(&'a self, value: &Value) -> Simplifications<'a> {
        let items = match value {
            Value::List(items) if !items.is_empty() => Rc::new(items.clone()),
            _ => return Box::new(std::iter::empty()),
        };
        let structural = shrink::deletions(Rc::clone(&items)).map(Value::List);
        let replacements =
            replaced_items(&self.element, items).map(|(idx, simpler, items)| {
                let mut replaced = items.to_vec();
                replaced[idx] = simpler;
                Value::List(replaced)
            });
        distinct(value, structural.chain(replacements))
    }

    fn parts<'a, 'v>(&'a self, value: &'v Value) -> Vec<(&'a dyn Strategy, &'v Value)> {
        match value {
            Value::List(items) => items
                .iter()
                .map(|item| (self.element.as_ref() as &dyn Strategy, item))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Strategy for sets, kept as strictly ascending element vectors
#[derive(Debug, Clone)]
pub struct SetStrategy {
    descriptor: Descriptor,
    element: StrategyRef,
}

impl SetStrategy {
    pub fn new(element: StrategyRef) -> Self {
        Self {
            descriptor: Descriptor::set(element.descriptor().clone()),
            element,
        }
    }
}

impl Strategy for SetStrategy {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn produce(
        &self,
        rng: &mut dyn RngCore,
        size: f64,
        active: &FlagSet,
    ) -> Result<Value, ProduceError> {
        let len = collection_length(rng, size, active.contains(&flags::SET_ALLOW_EMPTY));
        let items = (0..len)
            .map(|_| self.element.produce(rng, size, active))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::set_from(items))
    }

    fn flags(&self) -> FlagSet {
        let mut available = self.element.flags();
        available.insert(flags::SET_ALLOW_EMPTY);
        available
    }

    fn could_have_produced(&self, value: &Value) -> bool {
        match value {
            Value::Set(items) => {
                is_strictly_ascending(items.iter())
                    && items.iter().all(|item| self.element.could_have_produced(item))
            }
            _ => false,
        }
    }

    fn complexity(&self, value: &Value) -> f64 {
        match value {
            // members re-sort when replaced, so the total must not depend on position
            Value::Set(items) => {
                items.len() as f64
                    + shrink::unordered_sum(
                        items.iter().map(|item| self.element.complexity(item)),
                    )
            }
            _ => 0.0,
        }
    }

    fn simplify<'a>(&'a self, value: &Value) -> Simplifications<'a> {
        let items = match value {
            Value::Set(items) if !items.is_empty() => Rc::new(items.clone()),
            _ => return Box::new(std::iter::empty()),
        };
        let structural = shrink::deletions(Rc::clone(&items)).map(Value::Set);
        // a replacement equal to another member would merge two elements; skip it
        let replacements =
            replaced_items(&self.element, items).filter_map(|(idx, simpler, items)| {
                let mut rest = items.to_vec();
                rest.remove(idx);
                let pos = rest.binary_search(&simpler).err()?;
                rest.insert(pos, simpler);
                Some(Value::Set(rest))
            });
        distinct(value, structural.chain(replacements))
    }

    fn parts<'a, 'v>(&'a self, value: &'v Value) -> Vec<(&'a dyn Strategy, &'v Value)> {
        match value {
            Value::Set(items) => items
                .iter()
                .map(|item| (self.element.as_ref() as &dyn Strategy, item))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Strategy for maps with unique, ascending keys
#[derive(Debug, Clone)]
pub struct MapStrategy {
    descriptor: Descriptor,
    key: StrategyRef,
    value: StrategyRef,
}

impl MapStrategy {
    pub fn new(key: StrategyRef, value: StrategyRef) -> Self {
        Self {
            descriptor: Descriptor::map(key.descriptor().clone(), value.descriptor().clone()),
            key,
            value,
        }
    }
}

impl Strategy for MapStrategy {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn produce(
        &self,
        rng: &mut dyn RngCore,
        size: f64,
        active: &FlagSet,
    ) -> Result<Value, ProduceError> {
        let len = collection_length(rng, size, active.contains(&flags::MAP_ALLOW_EMPTY));
        let mut entries = Vec::with_capacity(len);
        for _ in 0..len {
            let key = self.key.produce(rng, size, active)?;
            let value = self.value.produce(rng, size, active)?;
            entries.push((key, value));
        }
        Ok(Value::map_from(entries))
    }

    fn flags(&self) -> FlagSet {
        let mut available = self.key.flags();
        available.extend(self.value.flags());
        available.insert(flags::MAP_ALLOW_EMPTY);
        available
    }

    fn could_have_produced(&self, value: &Value) -> bool {
        match value {
            Value::Map(entries) => {
                is_strictly_ascending(entries.iter().map(|(k, _)| k))
                    && entries.iter().all(|(k, v)| {
                        self.key.could_have_produced(k) && self.value.could_have_produced(v)
                    })
            }
            _ => false,
        }
    }

    fn complexity(&self, value: &Value) -> f64 {
        match value {
            Value::Map(entries) => {
                entries.len() as f64
                    + shrink::unordered_sum(
                        entries
                            .iter()
                            .map(|(k, v)| self.key.complexity(k) + self.value.complexity(v)),
                    )
            }
            _ => 0.0,
        }
    }

    fn simplify<'a>(&'a self, value: &Value) -> Simplifications<'a> {
        let entries = match value {
            Value::Map(entries) if !entries.is_empty() => Rc::new(entries.clone()),
            _ => return Box::new(std::iter::empty()),
        };
        let structural = shrink::deletions(Rc::clone(&entries)).map(Value::Map);

        let for_values = Rc::clone(&entries);
        let values = (0..entries.len()).flat_map(move |idx| {
            let entries = Rc::clone(&for_values);
            self.value.simplify(&entries[idx].1).map(move |simpler| {
                let mut replaced = entries.to_vec();
                replaced[idx].1 = simpler;
                Value::Map(replaced)
            })
        });

        let keys = (0..entries.len()).flat_map(move |idx| {
            let entries = Rc::clone(&entries);
            self.key.simplify(&entries[idx].0).filter_map(move |simpler| {
                let mut rest = entries.to_vec();
                let (_, kept) = rest.remove(idx);
                let pos = rest.binary_search_by(|(k, _)| k.cmp(&simpler)).err()?;
                rest.insert(pos, (simpler, kept));
                Some(Value::Map(rest))
            })
        });

        distinct(value, structural.chain(values).chain(keys))
    }

    fn parts<'a, 'v>(&'a self, value: &'v Value) -> Vec<(&'a dyn Strategy, &'v Value)> {
        match value {
            Value::Map(entries) => entries
                .iter()
                .flat_map(|(k, v)| [
                    (self.key.as_ref() as &dyn Strategy, k),
                    (self.value.as_ref() as &dyn Strategy, v),
                ])
                .collect(),
            _ => Vec::new(),
        }
    }
}
