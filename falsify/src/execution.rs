//! The falsification search loop and counterexample simplification.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use rand::RngCore;

use crate::config::FalsifyConfig;
use crate::descriptor::Descriptor;
use crate::error::{Falsified, FalsifyError, PropertyFailure};
use crate::parallel;
use crate::property::{PropertyOutcome, catch_panic, evaluate};
use crate::registry::Registry;
use crate::rng::{create_seeded_rng, resolve_seed};
use crate::strategy::{FlagSet, Strategy, sample_flags};
use crate::value::Value;

/// A falsifying value together with its complexity
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub value: Value,
    pub complexity: f64,
    pub failure: PropertyFailure,
}

/// Result of one produce-and-evaluate attempt
pub(crate) enum Attempt {
    Skipped,
    Passed,
    Falsified(Candidate),
}

/// Tally of a search phase
#[derive(Debug, Default)]
pub(crate) struct SearchOutcome {
    pub best: Option<Candidate>,
    pub attempts: usize,
    pub skipped: usize,
}

impl SearchOutcome {
    pub fn record(&mut self, attempt: Attempt) {
        self.attempts += 1;
        match attempt {
            Attempt::Skipped => self.skipped += 1,
            Attempt::Passed => {}
            Attempt::Falsified(candidate) => self.offer(candidate),
        }
    }

    /// Keep `candidate` only if it is strictly simpler than the current best
    pub fn offer(&mut self, candidate: Candidate) {
        let simpler = self
            .best
            .as_ref()
            .is_none_or(|best| candidate.complexity < best.complexity);
        if simpler {
            debug!(
                "new best counterexample {} (complexity {:.3})",
                candidate.value, candidate.complexity
            );
            self.best = Some(candidate);
        }
    }

    pub fn merge(&mut self, other: SearchOutcome) {
        self.attempts += other.attempts;
        self.skipped += other.skipped;
        if let Some(candidate) = other.best {
            self.offer(candidate);
        }
    }
}

fn violation(strategy: &dyn Strategy, value: Option<&Value>, reason: String) -> FalsifyError {
    FalsifyError::contract_violation(strategy.descriptor(), value, reason)
}

/// Upper bound on candidates drawn from a member while looking for a panic
const PANIC_SCAN_LIMIT: usize = 10_000;

/// The innermost member under `strategy` whose part of `value` is `faulty`
///
/// Falls back to `strategy` itself when no member is at fault.
fn culprit<'a, 'v>(
    strategy: &'a dyn Strategy,
    value: &'v Value,
    faulty: &dyn Fn(&dyn Strategy, &Value) -> bool,
) -> (&'a dyn Strategy, &'v Value) {
    let parts = catch_panic(|| strategy.parts(value)).unwrap_or_default();
    match parts.into_iter().find(|(member, part)| faulty(*member, part)) {
        Some((member, part)) => culprit(member, part, faulty),
        None => (strategy, value),
    }
}

/// The innermost member whose own simplification of its part raised complexity
fn inflating_culprit<'a, 'v>(
    strategy: &'a dyn Strategy,
    source: &'v Value,
    candidate: &'v Value,
) -> (&'a dyn Strategy, &'v Value, &'v Value) {
    let Ok((before, after)) = catch_panic(|| (strategy.parts(source), strategy.parts(candidate)))
    else {
        return (strategy, source, candidate);
    };
    if before.len() == after.len() {
        let mut changed = before
            .iter()
            .zip(&after)
            .filter(|((_, old), (_, new))| old != new);
        if let (Some(((member, old), (other, new))), None) = (changed.next(), changed.next())
            && std::ptr::addr_eq(*member, *other)
            && catch_panic(|| member.complexity(new) > member.complexity(old)).unwrap_or(false)
        {
            return inflating_culprit(*member, *old, *new);
        }
    }
    (strategy, source, candidate)
}

fn rejects(strategy: &dyn Strategy, value: &Value) -> bool {
    !matches!(catch_panic(|| strategy.could_have_produced(value)), Ok(true))
}

fn bad_complexity(strategy: &dyn Strategy, value: &Value) -> bool {
    !catch_panic(|| strategy.complexity(value))
        .is_ok_and(|complexity| complexity.is_finite() && complexity >= 0.0)
}

fn simplify_panics(strategy: &dyn Strategy, value: &Value) -> bool {
    catch_panic(|| strategy.simplify(value).take(PANIC_SCAN_LIMIT).count()).is_err()
}

/// `could_have_produced`, with a rejection or panic reported as a contract violation
fn check_accepts(strategy: &dyn Strategy, value: &Value, context: &str) -> Result<(), FalsifyError> {
    if !rejects(strategy, value) {
        return Ok(());
    }
    let (at_fault, part) = culprit(strategy, value, &rejects);
    let reason = match catch_panic(|| at_fault.could_have_produced(part)) {
        Err(message) => format!("could_have_produced panicked: {}", message),
        Ok(_) => format!("{} a value it does not accept", context),
    };
    Err(violation(at_fault, Some(part), reason))
}

/// `complexity`, required to be finite and non-negative
fn checked_complexity(strategy: &dyn Strategy, value: &Value) -> Result<f64, FalsifyError> {
    if let Ok(complexity) = catch_panic(|| strategy.complexity(value))
        && complexity.is_finite()
        && complexity >= 0.0
    {
        return Ok(complexity);
    }
    let (at_fault, part) = culprit(strategy, value, &bad_complexity);
    let reason = match catch_panic(|| at_fault.complexity(part)) {
        Err(message) => format!("complexity panicked: {}", message),
        Ok(complexity) => format!("complexity {} is not finite and non-negative", complexity),
    };
    Err(violation(at_fault, Some(part), reason))
}

/// A panic raised while simplifying `value`, charged to the member that panics
fn simplify_panicked(strategy: &dyn Strategy, value: &Value, message: String) -> FalsifyError {
    let (at_fault, part) = culprit(strategy, value, &simplify_panics);
    let message = catch_panic(|| at_fault.simplify(part).take(PANIC_SCAN_LIMIT).count())
        .err()
        .unwrap_or(message);
    violation(at_fault, Some(part), format!("simplify panicked: {}", message))
}

/// A simplification that raised complexity, charged to the member that raised it
fn complexity_raised(strategy: &dyn Strategy, source: &Value, candidate: &Value) -> FalsifyError {
    let (at_fault, source, candidate) = inflating_culprit(strategy, source, candidate);
    let measure = |value: &Value| catch_panic(|| at_fault.complexity(value)).unwrap_or(f64::NAN);
    violation(
        at_fault,
        Some(candidate),
        format!(
            "simplification of {} raised complexity from {} to {}",
            source,
            measure(source),
            measure(candidate)
        ),
    )
}

/// Predicate arguments held by an argument tuple
fn arguments(value: &Value) -> &[Value] {
    match value {
        Value::Tuple(items) => items,
        other => std::slice::from_ref(other),
    }
}

/// Produce one value at `size` and evaluate the predicate on it
pub(crate) fn attempt<F, R>(
    strategy: &dyn Strategy,
    predicate: &F,
    rng: &mut dyn RngCore,
    size: f64,
    available: &FlagSet,
) -> Result<Attempt, FalsifyError>
where
    F: Fn(&[Value]) -> R + ?Sized,
    R: PropertyOutcome,
{
    let active = sample_flags(rng, available);
    let produced = catch_panic(|| strategy.produce(rng, size, &active))
        .map_err(|message| violation(strategy, None, format!("produce panicked: {}", message)))?;
    let value = match produced {
        Ok(value) => value,
        Err(err) => {
            debug!("skipping attempt: {}", err);
            return Ok(Attempt::Skipped);
        }
    };
    check_accepts(strategy, &value, "produced")?;
    let complexity = checked_complexity(strategy, &value)?;
    match evaluate(predicate, arguments(&value)) {
        Ok(()) => Ok(Attempt::Passed),
        Err(failure) => Ok(Attempt::Falsified(Candidate {
            value,
            complexity,
            failure,
        })),
    }
}

fn search_sequential<F, R>(
    strategy: &dyn Strategy,
    predicate: &F,
    config: &FalsifyConfig,
    seed: u64,
) -> Result<SearchOutcome, FalsifyError>
where
    F: Fn(&[Value]) -> R + ?Sized,
    R: PropertyOutcome,
{
    let mut rng = create_seeded_rng(seed);
    let available = strategy.flags();
    let mut outcome = SearchOutcome::default();
    let mut current_size = None;
    for index in 0..config.max_attempts {
        let size = config.size_for_attempt(index);
        if current_size != Some(size) {
            debug!("searching at size {}", size);
            current_size = Some(size);
        }
        outcome.record(attempt(strategy, predicate, &mut rng, size, &available)?);
    }
    Ok(outcome)
}

/// Simplify a counterexample until no candidate still falsifies the predicate
///
/// Returns the locally minimal candidate and the number of adopted steps.
fn simplify_counterexample<F, R>(
    strategy: &dyn Strategy,
    predicate: &F,
    config: &FalsifyConfig,
    start: Candidate,
) -> Result<(Candidate, usize), FalsifyError>
where
    F: Fn(&[Value]) -> R + ?Sized,
    R: PropertyOutcome,
{
    let mut current = start;
    let mut steps = 0;
    while steps < config.max_simplify_rounds {
        let mut candidates = catch_panic(|| strategy.simplify(&current.value))
            .map_err(|message| simplify_panicked(strategy, &current.value, message))?;
        let mut adopted = None;
        loop {
            let next = catch_panic(|| candidates.next())
                .map_err(|message| simplify_panicked(strategy, &current.value, message))?;
            let Some(candidate) = next else {
                break;
            };
            check_accepts(strategy, &candidate, "simplified to")?;
            let complexity = checked_complexity(strategy, &candidate)?;
            if complexity > current.complexity {
                return Err(complexity_raised(strategy, &current.value, &candidate));
            }
            if let Err(failure) = evaluate(predicate, arguments(&candidate)) {
                adopted = Some(Candidate {
                    value: candidate,
                    complexity,
                    failure,
                });
                break;
            }
        }
        match adopted {
            Some(simpler) => {
                debug!("simplified to {} (complexity {:.3})", simpler.value, simpler.complexity);
                current = simpler;
                steps += 1;
            }
            None => return Ok((current, steps)),
        }
    }
    warn!(
        "stopped simplifying after {} rounds; the counterexample may not be minimal",
        steps
    );
    Ok((current, steps))
}

/// Searches for and minimizes counterexamples to a predicate
#[derive(Debug, Clone)]
pub struct Falsifier {
    config: FalsifyConfig,
    registry: Arc<Registry>,
    name: String,
}

impl Default for Falsifier {
    fn default() -> Self {
        Self::new(FalsifyConfig::default())
    }
}

impl Falsifier {
    pub fn new(config: FalsifyConfig) -> Self {
        Self {
            config,
            registry: Arc::new(Registry::new()),
            name: "predicate".to_string(),
        }
    }

    /// Resolve descriptors through `registry` instead of a fresh one
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    /// Name used for the predicate in reports
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn config(&self) -> &FalsifyConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Search for arguments matching `descriptors` that falsify `predicate`
    ///
    /// Spends the whole attempt budget, then simplifies the simplest
    /// falsifying input found to a local minimum.
    pub fn run<F, R>(
        &self,
        predicate: F,
        descriptors: &[Descriptor],
    ) -> Result<Falsified, FalsifyError>
    where
        F: Fn(&[Value]) -> R + Sync,
        R: PropertyOutcome,
    {
        self.config.validate()?;
        let strategy = self.registry.resolve(&Descriptor::tuple(descriptors.to_vec()))?;
        let seed = resolve_seed(self.config.seed);
        info!(
            "falsifying {} over {} with seed {}",
            self.name,
            strategy.descriptor(),
            seed
        );

        let search_start = Instant::now();
        let outcome = if self.config.parallel.enabled && self.config.parallel.num_threads > 1 {
            parallel::search(strategy.as_ref(), &predicate, &self.config, seed)?
        } else {
            search_sequential(strategy.as_ref(), &predicate, &self.config, seed)?
        };
        let search_duration = search_start.elapsed();

        if outcome.skipped * 2 > outcome.attempts {
            warn!(
                "{} of {} attempts skipped because production was exhausted",
                outcome.skipped, outcome.attempts
            );
        }
        let Some(best) = outcome.best else {
            info!("{} held for {} attempts", self.name, outcome.attempts);
            return Err(FalsifyError::unfalsifiable(
                self.name.clone(),
                outcome.attempts,
                outcome.skipped,
            ));
        };
        info!(
            "falsified {} with {}; simplifying",
            self.name, best.value
        );

        let shrink_start = Instant::now();
        let original = arguments(&best.value).to_vec();
        let (minimal, shrink_steps) =
            simplify_counterexample(strategy.as_ref(), &predicate, &self.config, best)?;
        let shrink_duration = shrink_start.elapsed();
        info!(
            "simplified {} counterexample to {} in {} steps",
            self.name, minimal.value, shrink_steps
        );

        Ok(Falsified {
            original,
            minimal: arguments(&minimal.value).to_vec(),
            complexity: minimal.complexity,
            failure: minimal.failure,
            attempts: outcome.attempts,
            shrink_steps,
            search_duration,
            shrink_duration,
        })
    }
}

/// Falsify `predicate` with the default configuration
pub fn falsify<F, R>(predicate: F, descriptors: &[Descriptor]) -> Result<Falsified, FalsifyError>
where
    F: Fn(&[Value]) -> R + Sync,
    R: PropertyOutcome,
{
    Falsifier::default().run(predicate, descriptors)
}

/// Falsify `predicate` with a custom configuration
pub fn falsify_with_config<F, R>(
    predicate: F,
    descriptors: &[Descriptor],
    config: FalsifyConfig,
) -> Result<Falsified, FalsifyError>
where
    F: Fn(&[Value]) -> R + Sync,
    R: PropertyOutcome,
{
    Falsifier::new(config).run(predicate, descriptors)
}
