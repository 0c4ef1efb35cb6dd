//! Bounded task pool
//!
//! Accepts any number of submissions, runs at most `max_concurrency` of them
//! at once and starts queued work in submission order as slots free.

use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{debug, error};

/// Default pool width when no human is playing
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Why a submission produced no value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("Task panicked: {0}")]
    Panicked(String),

    #[error("Task was dropped before completion")]
    Dropped,
}

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub max_concurrency: usize,
    pub running: usize,
    pub queued: usize,
}

#[derive(Default)]
struct PoolState {
    running: usize,
    queue: VecDeque<Job>,
}

struct PoolInner {
    max: usize,
    state: Mutex<PoolState>,
}

impl PoolInner {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // Jobs never run under the lock, so a poisoned guard still holds consistent counters
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// FIFO limiter over spawned tokio tasks
#[derive(Clone)]
pub struct TaskPool {
    inner: Arc<PoolInner>,
}

impl std::fmt::Debug for TaskPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPool")
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

impl TaskPool {
    /// Create a pool; a width of 0 is treated as 1
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                max: max_concurrency.max(1),
                state: Mutex::new(PoolState::default()),
            }),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.inner.max
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.inner.lock();
        PoolStats {
            max_concurrency: self.inner.max,
            running: state.running,
            queued: state.queue.len(),
        }
    }

    /// Submit a task; it starts now if a slot is free, otherwise after
    /// every earlier submission has started.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let outcome = AssertUnwindSafe(task)
                .catch_unwind()
                .await
                .map_err(|panic| {
                    let message = panic_message(panic.as_ref());
                    error!(panic = %message, "Pooled task panicked");
                    PoolError::Panicked(message)
                });
            // Receiver may have been dropped; the task still ran to completion
            let _ = tx.send(outcome);
        });

        let start_now = {
            let mut state = self.inner.lock();
            if state.running < self.inner.max {
                state.running += 1;
                Some(job)
            } else {
                state.queue.push_back(job);
                debug!(queued = state.queue.len(), running = state.running, "Task queued");
                None
            }
        };

        if let Some(job) = start_now {
            debug!("Task started immediately");
            Self::spawn_driver(self.inner.clone(), job);
        }

        TaskHandle { rx }
    }

    /// One driver per occupied slot: run a job, then keep pulling from
    /// the queue until it is empty and the slot is released.
    fn spawn_driver(inner: Arc<PoolInner>, first: Job) {
        tokio::spawn(async move {
            let mut job = first;
            loop {
                job.await;
                let next = {
                    let mut state = inner.lock();
                    let next = state.queue.pop_front();
                    if next.is_none() {
                        state.running -= 1;
                    }
                    next
                };
                match next {
                    Some(queued) => job = queued,
                    None => break,
                }
            }
        });
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Resolves with the submitted task's output
#[derive(Debug)]
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<Result<T, PoolError>>,
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, PoolError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(PoolError::Dropped)),
            Poll::Pending => Poll::Pending,
        }
    }
}
