//! Fixed-size hashing worker pool
//!
//! Each worker owns one [`HashScratch`] (read buffer plus streaming
//! context), created on the worker's first task and reused for every task
//! after that. Scratch state never leaves its thread.

use crate::error::{ChecksumError, Result};
use crate::hash::{HashAlgorithm, HashScratch};
use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::thread;

type Job = Box<dyn FnOnce(&mut HashScratch) + Send + 'static>;

/// Default worker count: half the logical CPUs, at least one
pub fn default_threads() -> usize {
    (num_cpus::get() / 2).max(1)
}

/// Handle to the result of a submitted task
#[derive(Debug)]
pub struct TaskHandle<T> {
    receiver: Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Block until the task has run and return its output
    pub fn wait(self) -> Result<T> {
        self.receiver.recv().map_err(|_| {
            ChecksumError::ThreadPoolError("Worker exited before finishing task".to_string())
        })
    }
}

/// Pool of hashing threads fed from one job queue
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `threads` workers hashing with `algorithm`
    pub fn new(threads: usize, algorithm: HashAlgorithm, seed: u64) -> Result<Self> {
        let threads = threads.max(1);
        let (sender, receiver) = unbounded::<Job>();
        let mut workers = Vec::with_capacity(threads);

        for worker_id in 0..threads {
            let jobs = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("treesum-worker-{}", worker_id))
                .spawn(move || {
                    let mut scratch: Option<HashScratch> = None;
                    for job in jobs.iter() {
                        let scratch = scratch.get_or_insert_with(|| HashScratch::new(algorithm, seed));
                        // A panicking task drops its result sender, which the handle reports.
                        if panic::catch_unwind(AssertUnwindSafe(|| job(scratch))).is_err() {
                            tracing::error!("Worker {} recovered from a panicking task", worker_id);
                        }
                    }
                    tracing::debug!("Worker {} shutting down", worker_id);
                })
                .map_err(|e| ChecksumError::ThreadPoolError(format!("Failed to spawn worker: {}", e)))?;
            workers.push(handle);
        }

        tracing::debug!(threads, algorithm = %algorithm, "Worker pool started");

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Number of worker threads
    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Queue a task; its output is delivered through the returned handle
    pub fn submit<T, F>(&self, task: F) -> Result<TaskHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut HashScratch) -> T + Send + 'static,
    {
        let (result_tx, result_rx) = bounded(1);
        let job: Job = Box::new(move |scratch| {
            // The handle may have been dropped; the result is then discarded.
            let _ = result_tx.send(task(scratch));
        });

        self.sender
            .as_ref()
            .ok_or_else(|| ChecksumError::ThreadPoolError("Pool is shut down".to_string()))?
            .send(job)
            .map_err(|_| ChecksumError::ThreadPoolError("Failed to submit task".to_string()))?;

        Ok(TaskHandle {
            receiver: result_rx,
        })
    }

    /// Close the queue and wait for every queued task to finish
    pub fn join(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        drop(self.sender.take());
        let mut panicked = 0;
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                panicked += 1;
            }
        }
        if panicked > 0 {
            return Err(ChecksumError::ThreadPoolError(format!(
                "{} worker(s) panicked",
                panicked
            )));
        }
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::error!(error = %e, "Worker pool shutdown failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::AlgorithmRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn algorithm() -> HashAlgorithm {
        AlgorithmRegistry::standard().by_name("XXH64").unwrap()
    }

    #[test]
    fn test_results_resolve_in_submission_order() {
        let pool = WorkerPool::new(4, algorithm(), 0).unwrap();
        let handles: Vec<_> = (0..50u64)
            .map(|i| {
                pool.submit(move |_| {
                    // Later tasks finish first.
                    thread::sleep(Duration::from_micros((50 - i) * 20));
                    i * 2
                })
                .unwrap()
            })
            .collect();

        let results: Vec<u64> = handles.into_iter().map(|h| h.wait().unwrap()).collect();
        assert_eq!(results, (0..50u64).map(|i| i * 2).collect::<Vec<_>>());
        pool.join().unwrap();
    }

    #[test]
    fn test_join_drains_all_tasks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(3, algorithm(), 0).unwrap();
        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            let _ = pool
                .submit(move |_| {
                    counter.fetch_add(1, Ordering::Relaxed);
                })
                .unwrap();
        }
        pool.join().unwrap();
        assert_eq!(counter.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn test_scratch_is_per_worker_and_reused() {
        let pool = WorkerPool::new(1, algorithm(), 0).unwrap();
        let first = pool
            .submit(|scratch| scratch as *const HashScratch as usize)
            .unwrap()
            .wait()
            .unwrap();
        let second = pool
            .submit(|scratch| scratch as *const HashScratch as usize)
            .unwrap()
            .wait()
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(pool.threads(), 1);
    }

    #[test]
    fn test_panicking_task_reports_error_and_worker_survives() {
        let pool = WorkerPool::new(1, algorithm(), 0).unwrap();
        let handle = pool.submit(|_| -> u32 { panic!("boom") }).unwrap();
        assert!(handle.wait().is_err());

        let after = pool.submit(|_| 7u32).unwrap();
        assert_eq!(after.wait().unwrap(), 7);
        pool.join().unwrap();
    }
}
