//! Bounded worker pool for hash computations.
//!
//! A fixed number of OS threads drain a shared FIFO queue of fallible jobs.
//! Submission above the limit queues; it is never dropped or rejected. The pool
//! records the first error any job returns and hands it back from [`WorkerPool::wait`].
//! Failing jobs do not cancel their siblings: in-flight work runs to completion
//! and the caller discards its output on failure.

use crate::error::GenerateError;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::debug;

type Job = Box<dyn FnOnce() -> Result<(), GenerateError> + Send + 'static>;

struct PoolState {
    jobs: VecDeque<Job>,
    shutting_down: bool,
    first_error: Option<GenerateError>,
}

struct Shared {
    state: Mutex<PoolState>,
    work_available: Condvar,
}

/// Fixed-size pool of worker threads executing fallible jobs.
pub struct WorkerPool {
    shared: Arc<Shared>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn a pool with `workers` threads (minimum 1).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                jobs: VecDeque::new(),
                shutting_down: false,
                first_error: None,
            }),
            work_available: Condvar::new(),
        });

        let handles = (0..workers)
            .map(|worker_id| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || worker_loop(worker_id, shared))
            })
            .collect();

        Self { shared, handles }
    }

    /// Enqueue a job. Never blocks; work above the concurrency limit waits in
    /// the queue until a worker is free.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() -> Result<(), GenerateError> + Send + 'static,
    {
        let mut state = self.shared.state.lock();
        state.jobs.push_back(Box::new(job));
        drop(state);
        self.shared.work_available.notify_one();
    }

    /// Drain the queue, join all workers, and return the first error any job
    /// reported. Consumes the pool; no further submission is possible.
    pub fn wait(mut self) -> Result<(), GenerateError> {
        {
            let mut state = self.shared.state.lock();
            state.shutting_down = true;
        }
        self.shared.work_available.notify_all();

        let mut panicked = false;
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                panicked = true;
            }
        }

        let mut state = self.shared.state.lock();
        if let Some(err) = state.first_error.take() {
            return Err(err);
        }
        if panicked {
            return Err(GenerateError::WorkerPanic);
        }
        Ok(())
    }
}

fn worker_loop(worker_id: usize, shared: Arc<Shared>) {
    debug!(worker_id, "Worker started");
    loop {
        let job = {
            let mut state = shared.state.lock();
            loop {
                if let Some(job) = state.jobs.pop_front() {
                    break job;
                }
                if state.shutting_down {
                    debug!(worker_id, "Worker stopped");
                    return;
                }
                shared.work_available.wait(&mut state);
            }
        };

        if let Err(err) = job() {
            let mut state = shared.state.lock();
            if state.first_error.is_none() {
                state.first_error = Some(err);
            }
        }
    }
}
