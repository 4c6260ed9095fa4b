//! Unbounded fan-out with submission-order results.
//!
//! Every task is spawned up front; there is no concurrency cap and no
//! backpressure. Results come back in the order the arguments were
//! submitted, whatever order the tasks finish in.

use std::collections::VecDeque;
use std::future::Future;

use common::Error;
use tokio::task::JoinHandle;

/// Handles for a batch of spawned tasks, drained in submission order.
#[derive(Debug)]
pub struct TaskBatch<T> {
    handles: VecDeque<JoinHandle<Result<T, Error>>>,
}

/// Spawn `operation(args)` for every argument set at once.
///
/// Must be called from within a Tokio runtime.
pub fn run_many<A, T, F, Fut>(operation: F, argument_sets: impl IntoIterator<Item = A>) -> TaskBatch<T>
where
    F: Fn(A) -> Fut,
    Fut: Future<Output = Result<T, Error>> + Send + 'static,
    T: Send + 'static,
{
    let handles = argument_sets
        .into_iter()
        .map(|args| tokio::spawn(operation(args)))
        .collect();
    TaskBatch { handles }
}

impl<T> TaskBatch<T> {
    /// Tasks not yet retrieved.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for the next task in submission order.
    ///
    /// A failed task yields its error here; later tasks keep running.
    pub async fn next(&mut self) -> Option<Result<T, Error>> {
        let handle = self.handles.pop_front()?;
        Some(match handle.await {
            Ok(result) => result,
            Err(join_error) => Err(Error::Task(join_error.to_string())),
        })
    }

    /// Wait for every task, failing at the first failed position in
    /// submission order.
    pub async fn collect_all(mut self) -> Result<Vec<T>, Error> {
        let mut results = Vec::with_capacity(self.len());
        while let Some(result) = self.next().await {
            results.push(result?);
        }
        Ok(results)
    }
}
