//! Multi-threaded MCTS driver.
//!
//! Two strategies, selected by [`ParallelMode`]:
//!
//! - **Shared tree**: every worker iterates on the caller's tree. A worker
//!   must hold the permit of the root child it works below; when another
//!   worker already holds it, the iteration is abandoned and retried.
//! - **Independent trees**: worker 0 grows the caller's tree, the others grow
//!   private trees from the same root state. Once the deadline passes the
//!   private trees are merged into the caller's tree.
//!
//! Workers run on scoped threads and are all joined before `run` returns, so
//! the caller can read [`MctsTree::choose_move`] right away.

use std::panic;
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

use engine_core::{CancelToken, SearchError, TransitionSystem, Watchdog};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::debug;

use crate::config::ParallelMode;
use crate::search::{Iteration, Locking, SearchStats};
use crate::tree::MctsTree;

/// Entry points of the concurrent driver.
pub struct ParallelSearch;

impl ParallelSearch {
    /// Search `tree` on `config.threads` workers until `deadline` minus the
    /// configured safety margin.
    pub fn run<T: TransitionSystem>(
        tree: &mut MctsTree<T>,
        deadline: Instant,
    ) -> Result<SearchStats, SearchError> {
        let token = CancelToken::new();
        let watchdog = Watchdog::arm(deadline, tree.config.safety_margin, token.clone());
        let result = Self::run_until(tree, &token);
        watchdog.disarm();
        result
    }

    /// Search `tree` on `config.threads` workers until `token` is cancelled.
    ///
    /// A definition error in any worker cancels the token, stops the others
    /// and is returned once every worker has been joined.
    pub fn run_until<T: TransitionSystem>(
        tree: &mut MctsTree<T>,
        token: &CancelToken,
    ) -> Result<SearchStats, SearchError> {
        if tree.root.is_terminal() {
            return Ok(tree.search_stats());
        }

        let started = Instant::now();
        let threads = tree.config.threads.max(1);
        let mode = tree.config.mode;
        // Drawn from the tree's own stream so consecutive turns differ
        let base_seed: u64 = tree.rng.gen();

        match mode {
            ParallelMode::SharedTree => run_shared(tree, token, threads, base_seed)?,
            ParallelMode::IndependentTrees => run_independent(tree, token, threads, base_seed)?,
        }

        let stats = tree.search_stats();
        debug!(
            ?mode,
            threads,
            iterations = stats.iterations,
            retries = stats.retries,
            root_visits = tree.root.visits(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Parallel MCTS search complete"
        );
        Ok(stats)
    }
}

fn run_shared<T: TransitionSystem>(
    tree: &MctsTree<T>,
    token: &CancelToken,
    threads: usize,
    base_seed: u64,
) -> Result<(), SearchError> {
    thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|worker| {
                scope.spawn(move || {
                    let mut rng = ChaCha20Rng::seed_from_u64(base_seed.wrapping_add(worker as u64));
                    while !token.is_cancelled() {
                        match tree.iterate(&mut rng, Locking::RootPermits) {
                            Ok(Iteration::Completed(_)) => {}
                            Ok(Iteration::Retry) => thread::yield_now(),
                            Err(err) => {
                                token.cancel();
                                return Err(err);
                            }
                        }
                    }
                    Ok(())
                })
            })
            .collect();
        join_all(handles)
    })
}

fn run_independent<T: TransitionSystem>(
    tree: &mut MctsTree<T>,
    token: &CancelToken,
    threads: usize,
    base_seed: u64,
) -> Result<(), SearchError> {
    let mut helpers: Vec<MctsTree<T>> = (1..threads)
        .map(|worker| {
            MctsTree::new(
                Arc::clone(&tree.system),
                tree.agent.clone(),
                tree.root.state().clone(),
                tree.config
                    .clone()
                    .with_seed(base_seed.wrapping_add(worker as u64)),
            )
        })
        .collect();

    let main = &mut *tree;
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(threads);
        handles.push(scope.spawn(move || cancel_on_error(token, main.search_until(token))));
        for helper in helpers.iter_mut() {
            handles.push(scope.spawn(move || cancel_on_error(token, helper.search_until(token))));
        }
        join_all(handles)
    })?;

    for helper in &helpers {
        tree.merge(helper);
    }
    Ok(())
}

fn cancel_on_error(
    token: &CancelToken,
    result: Result<SearchStats, SearchError>,
) -> Result<(), SearchError> {
    if result.is_err() {
        token.cancel();
    }
    result.map(drop)
}

/// Join every worker, returning the first error. Worker panics are
/// re-raised on the calling thread.
fn join_all(handles: Vec<ScopedJoinHandle<'_, Result<(), SearchError>>>) -> Result<(), SearchError> {
    let mut outcome = Ok(());
    for handle in handles {
        match handle.join() {
            Ok(result) => {
                if outcome.is_ok() {
                    outcome = result;
                }
            }
            Err(payload) => panic::resume_unwind(payload),
        }
    }
    outcome
}
