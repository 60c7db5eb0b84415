//! Bounded concurrency executor
//!
//! A fixed pool of workers claims input indices from a shared atomic counter
//! until none remain. Each result lands at its input's position, and a failing
//! (or panicking) task only affects its own slot.

use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Why a task produced no value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskFailure {
    #[error("{0}")]
    Failed(String),

    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Runs `task` over every input with at most `limit` tasks in flight
///
/// The output has the same length and order as `inputs`, whatever order the
/// tasks complete in. `min(limit, inputs.len())` workers are started; a limit
/// of zero is treated as one.
///
/// # Example
///
/// ```
/// use reel_dates::pipeline::run_with_concurrency;
///
/// # tokio_test_block_on(async {
/// let doubled = run_with_concurrency(vec![1, 2, 3], 2, |n: i32| async move {
///     if n == 2 { Err("two") } else { Ok(n * 2) }
/// })
/// .await;
/// assert_eq!(doubled[0], Ok(2));
/// assert!(doubled[1].is_err());
/// assert_eq!(doubled[2], Ok(6));
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
pub async fn run_with_concurrency<I, T, E, F, Fut>(
    inputs: Vec<I>,
    limit: usize,
    task: F,
) -> Vec<Result<T, TaskFailure>>
where
    I: Clone,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    if inputs.is_empty() {
        return Vec::new();
    }

    let workers = limit.max(1).min(inputs.len());
    let next_index = AtomicUsize::new(0);
    tracing::debug!(
        "Starting {} workers for {} inputs (limit {})",
        workers,
        inputs.len(),
        limit
    );

    let worker_runs = (0..workers).map(|worker| {
        let next_index = &next_index;
        let inputs = &inputs;
        let task = &task;

        async move {
            let mut completed = Vec::new();
            loop {
                let index = next_index.fetch_add(1, Ordering::SeqCst);
                let Some(input) = inputs.get(index) else {
                    break;
                };

                let input = input.clone();
                let outcome = AssertUnwindSafe(async move { task(input).await })
                    .catch_unwind()
                    .await;

                let result = match outcome {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(err)) => Err(TaskFailure::Failed(err.to_string())),
                    Err(panic) => Err(TaskFailure::Panicked(panic_message(panic.as_ref()))),
                };
                completed.push((index, result));
            }
            tracing::trace!("Worker {} finished {} inputs", worker, completed.len());
            completed
        }
    });

    let batches = join_all(worker_runs).await;

    let mut slots: Vec<Option<Result<T, TaskFailure>>> = inputs.iter().map(|_| None).collect();
    for (index, result) in batches.into_iter().flatten() {
        slots[index] = Some(result);
    }

    slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| Err(TaskFailure::Failed("task was never run".to_string())))
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
