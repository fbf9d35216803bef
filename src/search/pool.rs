//! Partition worker pool
//!
//! A fixed number of workers on a private rayon pool pull item indices from
//! one atomic cursor until it runs past the end. `run` returns after every
//! worker has finished, which is the barrier between phases. The first
//! fatal error stops all workers at their next pull and is returned.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Mutex, PoisonError};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{Result, SearchError};

pub struct PartitionPool {
    pool: ThreadPool,
    threads: usize,
}

impl PartitionPool {
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("seedjoin-{}", i))
            .build()?;
        Ok(Self { pool, threads })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `f` inside the pool so nested rayon iterators use its threads.
    pub fn install<R, F>(&self, f: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        self.pool.install(f)
    }

    /// Process items `0..n`. Each worker builds its state with `init(worker)`
    /// and hands it to `work` for every item it pulls; the states of all
    /// workers are returned.
    pub fn run<S, I, W>(&self, n: usize, init: I, work: W) -> Result<Vec<S>>
    where
        S: Send,
        I: Fn(usize) -> S + Sync,
        W: Fn(&mut S, usize) -> Result<()> + Sync,
    {
        let workers = self.threads.min(n.max(1));
        let cursor = AtomicUsize::new(0);
        let abort = AtomicBool::new(false);
        let failure: Mutex<Option<SearchError>> = Mutex::new(None);
        let mut states: Vec<Option<S>> = (0..workers).map(|_| None).collect();

        self.pool.scope(|scope| {
            for (worker, slot) in states.iter_mut().enumerate() {
                let (cursor, abort, failure) = (&cursor, &abort, &failure);
                let (init, work) = (&init, &work);
                scope.spawn(move |_| {
                    let mut state = init(worker);
                    while !abort.load(AtomicOrdering::Relaxed) {
                        let i = cursor.fetch_add(1, AtomicOrdering::Relaxed);
                        if i >= n {
                            break;
                        }
                        if let Err(e) = work(&mut state, i) {
                            abort.store(true, AtomicOrdering::Relaxed);
                            let mut first = failure.lock().unwrap_or_else(PoisonError::into_inner);
                            if first.is_none() {
                                *first = Some(e);
                            }
                            break;
                        }
                    }
                    *slot = Some(state);
                });
            }
        });

        if let Some(e) = failure.into_inner().unwrap_or_else(PoisonError::into_inner) {
            return Err(e);
        }
        Ok(states.into_iter().flatten().collect())
    }
}
