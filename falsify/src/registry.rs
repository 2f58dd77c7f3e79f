//! Resolution of descriptors to shared strategies.
//!
//! A [`Registry`] consults user rules before the built-in rules. Rules are
//! tried newest first, exact-descriptor rules before kind-wide rules, and a
//! child registry falls back to its parent's chain before the built-ins.
//! Resolved strategies are cached by structural descriptor equality.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use log::debug;

use crate::composite::{
    ListStrategy, MapStrategy, OneOfStrategy, SetStrategy, TaggedStrategy, TupleStrategy,
};
use crate::descriptor::{Descriptor, DescriptorKind};
use crate::error::FalsifyError;
use crate::primitives::{
    BoolStrategy, FloatStrategy, IntRangeStrategy, IntStrategy, JustStrategy, TextStrategy,
};
use crate::strategy::StrategyRef;

/// A user resolution rule
///
/// Receives the registry resolution started from, so nested resolution sees
/// rules defined on child registries. Returning `Ok(None)` declines and defers
/// to the next rule in the chain.
pub type Rule =
    dyn Fn(&Registry, &Descriptor) -> Result<Option<StrategyRef>, FalsifyError> + Send + Sync;

enum Matcher {
    Exact(Descriptor),
    Kind(DescriptorKind),
}

struct Definition {
    matcher: Matcher,
    rule: Arc<Rule>,
}

#[derive(Default)]
struct Cache {
    epoch: u64,
    entries: HashMap<Descriptor, StrategyRef>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Maps descriptors to strategies through user rules and built-in rules
pub struct Registry {
    definitions: RwLock<Vec<Definition>>,
    generation: AtomicU64,
    parent: Option<Arc<Registry>>,
    cache: Mutex<Cache>,
}

impl Registry {
    /// Create a registry with no user rules
    pub fn new() -> Self {
        Self {
            definitions: RwLock::new(Vec::new()),
            generation: AtomicU64::new(0),
            parent: None,
            cache: Mutex::new(Cache::default()),
        }
    }

    /// Create a registry that falls back to `parent`'s rules
    ///
    /// Rules defined on the parent later on are visible through the child.
    pub fn child(parent: Arc<Registry>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new()
        }
    }

    pub fn parent(&self) -> Option<&Arc<Registry>> {
        self.parent.as_ref()
    }

    /// Define a rule for descriptors structurally equal to `descriptor`
    pub fn define_for<F>(&self, descriptor: Descriptor, rule: F)
    where
        F: Fn(&Registry, &Descriptor) -> Result<Option<StrategyRef>, FalsifyError>
            + Send
            + Sync
            + 'static,
    {
        self.define(Matcher::Exact(descriptor), Arc::new(rule));
    }

    /// Define a rule for every descriptor of the given kind
    pub fn define_for_kind<F>(&self, kind: DescriptorKind, rule: F)
    where
        F: Fn(&Registry, &Descriptor) -> Result<Option<StrategyRef>, FalsifyError>
            + Send
            + Sync
            + 'static,
    {
        self.define(Matcher::Kind(kind), Arc::new(rule));
    }

    fn define(&self, matcher: Matcher, rule: Arc<Rule>) {
        self.definitions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Definition { matcher, rule });
        self.generation.fetch_add(1, Ordering::SeqCst);
        lock(&self.cache).entries.clear();
    }

    /// Changes whenever a rule is defined anywhere along the parent chain
    fn epoch(&self) -> u64 {
        let own = self.generation.load(Ordering::SeqCst);
        own + self.parent.as_ref().map_or(0, |parent| parent.epoch())
    }

    /// Matching rules along the chain, in the order they are consulted
    fn rules_for(&self, descriptor: &Descriptor) -> Vec<Arc<Rule>> {
        let mut rules = Vec::new();
        let mut current = Some(self);
        while let Some(registry) = current {
            let definitions = registry
                .definitions
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let exact = definitions.iter().rev().filter(|definition| {
                matches!(&definition.matcher, Matcher::Exact(d) if d == descriptor)
            });
            let kind = definitions.iter().rev().filter(|definition| {
                matches!(&definition.matcher, Matcher::Kind(k) if *k == descriptor.kind())
            });
            rules.extend(exact.chain(kind).map(|definition| Arc::clone(&definition.rule)));
            current = registry.parent.as_deref();
        }
        rules
    }

    /// Resolve a descriptor to its strategy
    ///
    /// Resolving structurally equal descriptors returns the same shared
    /// strategy until a new rule is defined.
    pub fn resolve(&self, descriptor: &Descriptor) -> Result<StrategyRef, FalsifyError> {
        let epoch = self.epoch();
        {
            let mut cache = lock(&self.cache);
            if cache.epoch != epoch {
                cache.entries.clear();
                cache.epoch = epoch;
            }
            if let Some(strategy) = cache.entries.get(descriptor) {
                return Ok(Arc::clone(strategy));
            }
        }

        // the cache lock is released here: rules resolve nested descriptors
        let strategy = self.build(descriptor)?;

        let mut cache = lock(&self.cache);
        if cache.epoch == epoch {
            let cached = cache
                .entries
                .entry(descriptor.clone())
                .or_insert(strategy);
            return Ok(Arc::clone(cached));
        }
        Ok(strategy)
    }

    /// Resolve every descriptor in order
    pub fn resolve_all(&self, descriptors: &[Descriptor]) -> Result<Vec<StrategyRef>, FalsifyError> {
        descriptors.iter().map(|d| self.resolve(d)).collect()
    }

    fn build(&self, descriptor: &Descriptor) -> Result<StrategyRef, FalsifyError> {
        for rule in self.rules_for(descriptor) {
            if let Some(strategy) = rule(self, descriptor)? {
                debug!("resolved {} through a user rule", descriptor);
                return Ok(strategy);
            }
        }
        builtin(self, descriptor)?.ok_or_else(|| FalsifyError::unresolvable(descriptor))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules = self
            .definitions
            .read()
            .map(|definitions| definitions.len())
            .unwrap_or(0);
        f.debug_struct("Registry")
            .field("rules", &rules)
            .field("parent", &self.parent)
            .finish()
    }
}

/// Built-in rules by descriptor shape
fn builtin(
    registry: &Registry,
    descriptor: &Descriptor,
) -> Result<Option<StrategyRef>, FalsifyError> {
    let strategy: StrategyRef = match descriptor {
        Descriptor::Bool => Arc::new(BoolStrategy::new()),
        Descriptor::Int => Arc::new(IntStrategy::new()),
        Descriptor::Float => Arc::new(FloatStrategy::new()),
        Descriptor::Text => Arc::new(TextStrategy::new()),
        Descriptor::IntRange { low, high } => Arc::new(IntRangeStrategy::new(*low, *high)),
        Descriptor::Just(value) => Arc::new(JustStrategy::new(value.clone())),
        Descriptor::Tuple(members) => Arc::new(TupleStrategy::new(registry.resolve_all(members)?)),
        Descriptor::List(element) => Arc::new(ListStrategy::new(registry.resolve(element)?)),
        Descriptor::Set(element) => Arc::new(SetStrategy::new(registry.resolve(element)?)),
        Descriptor::Map(key, value) => Arc::new(MapStrategy::new(
            registry.resolve(key)?,
            registry.resolve(value)?,
        )),
        Descriptor::OneOf(arms) => Arc::new(OneOfStrategy::new(registry.resolve_all(arms)?)),
        Descriptor::Tagged(tag, payload) => {
            Arc::new(TaggedStrategy::new(tag.clone(), registry.resolve(payload)?))
        }
        Descriptor::Named(_) => return Ok(None),
    };
    Ok(Some(strategy))
}
