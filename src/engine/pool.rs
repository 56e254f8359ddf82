//! Bounded worker pool for blocking decode tasks

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::debug;

use crate::error::{MontageError, MontageResult};

/// Runs one blocking task per item on at most `max_workers` threads at a time.
///
/// Results come back in input order whatever order the tasks finish in. The
/// first failing task ends the run with its error; tasks already running are
/// left to finish and their results are dropped.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    max_workers: usize,
}

impl WorkerPool {
    /// Create a pool; zero is treated as one worker
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    /// Number of workers used for `items` units of work
    pub fn workers_for(&self, items: usize) -> usize {
        items.min(self.max_workers).max(1)
    }

    /// Run `task` over every item
    pub async fn run<I, T, F>(&self, items: Vec<I>, task: F) -> MontageResult<Vec<T>>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> MontageResult<T> + Send + Sync + 'static,
    {
        let total = items.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let workers = self.workers_for(total);
        debug!("Running {} tasks on {} workers", total, workers);

        let task = Arc::new(task);
        let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();
        let mut pending = items.into_iter().enumerate();
        let mut join_set = JoinSet::new();

        loop {
            while join_set.len() < workers {
                let Some((index, item)) = pending.next() else {
                    break;
                };
                let task = Arc::clone(&task);
                join_set.spawn_blocking(move || (index, task(item)));
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };
            let (index, result) = joined.map_err(|e| MontageError::Worker {
                message: e.to_string(),
            })?;
            slots[index] = Some(result?);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| MontageError::Worker {
                    message: format!("no result for task {index}"),
                })
            })
            .collect()
    }
}
