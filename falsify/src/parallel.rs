//! Parallel search: the attempt budget split across scoped worker threads.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::config::FalsifyConfig;
use crate::error::FalsifyError;
use crate::execution::{SearchOutcome, attempt};
use crate::property::PropertyOutcome;
use crate::rng::worker_rng;
use crate::strategy::Strategy;
use crate::value::Value;

/// Attempt indices handled by one worker, interleaved so every worker walks
/// the size schedule in ascending order
fn worker_attempts(
    worker: usize,
    num_threads: usize,
    max_attempts: usize,
) -> impl Iterator<Item = usize> {
    (worker..max_attempts).step_by(num_threads)
}

/// Run the search phase on `config.parallel.num_threads` workers
///
/// Worker `w` uses an RNG seeded with `seed + w`. The shared best is only
/// replaced by a strictly simpler candidate. A contract violation in any
/// worker stops the others and is returned.
pub(crate) fn search<F, R>(
    strategy: &dyn Strategy,
    predicate: &F,
    config: &FalsifyConfig,
    seed: u64,
) -> Result<SearchOutcome, FalsifyError>
where
    F: Fn(&[Value]) -> R + Sync + ?Sized,
    R: PropertyOutcome,
{
    let num_threads = config.parallel.num_threads.max(1);
    let shared = Mutex::new(SearchOutcome::default());
    let failure: Mutex<Option<FalsifyError>> = Mutex::new(None);
    let abort = AtomicBool::new(false);
    let available = strategy.flags();

    debug!("searching on {} workers", num_threads);
    let scoped = crossbeam::scope(|s| {
        for worker in 0..num_threads {
            let shared = &shared;
            let failure = &failure;
            let abort = &abort;
            let available = &available;
            s.spawn(move |_| {
                let mut rng = worker_rng(seed, worker);
                let mut local = SearchOutcome::default();
                for index in worker_attempts(worker, num_threads, config.max_attempts) {
                    if abort.load(Ordering::SeqCst) {
                        break;
                    }
                    let size = config.size_for_attempt(index);
                    match attempt(strategy, predicate, &mut rng, size, available) {
                        Ok(result) => local.record(result),
                        Err(err) => {
                            abort.store(true, Ordering::SeqCst);
                            let mut slot = failure.lock().unwrap_or_else(|p| p.into_inner());
                            slot.get_or_insert(err);
                            break;
                        }
                    }
                }
                shared
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .merge(local);
            });
        }
    });

    if scoped.is_err() {
        return Err(FalsifyError::contract_violation(
            strategy.descriptor(),
            None,
            "a search worker panicked",
        ));
    }
    if let Some(err) = failure.into_inner().unwrap_or_else(|p| p.into_inner()) {
        return Err(err);
    }
    Ok(shared.into_inner().unwrap_or_else(|p| p.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParallelConfig;
    use crate::descriptor::Descriptor;
    use crate::registry::Registry;

    #[test]
    fn test_worker_attempts_cover_budget_once() {
        let mut all: Vec<usize> = (0..3).flat_map(|w| worker_attempts(w, 3, 10)).collect();
        all.sort();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
        assert_eq!(worker_attempts(1, 3, 10).collect::<Vec<_>>(), vec![1, 4, 7]);
    }

    #[test]
    fn test_parallel_search_spends_budget() {
        let registry = Registry::new();
        let strategy = registry
            .resolve(&Descriptor::tuple([Descriptor::Int]))
            .unwrap();
        let config = FalsifyConfig::default()
            .with_seed(99)
            .with_parallel(ParallelConfig::with_threads(4));
        let predicate = |args: &[Value]| args[0].as_int().is_some_and(|x| x.abs() < 100);
        let outcome = search(strategy.as_ref(), &predicate, &config, 99).unwrap();
        assert_eq!(outcome.attempts, 200);
        let best = outcome.best.expect("large integers are produced");
        assert!(best.value.items().unwrap()[0].as_int().unwrap().abs() >= 100);
    }
}
