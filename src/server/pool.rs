//! Worker pools that run one connection per task.
//!
//! The configured thread count picks the policy: 0 gives a
//! [`CachedThreadPool`] (a thread per task), N > 0 a [`FixedThreadPool`] of
//! exactly N threads sharing an unbounded queue.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

const THREAD_PREFIX: &str = "executor-thread";

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("worker pool is shut down")]
    ShutDown,
    #[error("can not spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub trait WorkerPool: Send + Sync {
    fn execute(&self, job: Job) -> Result<(), PoolError>;

    /// Stops accepting jobs. Jobs already running finish on their own.
    fn shutdown(&self);
}

/// Picks the pool policy for a configured thread count.
pub fn from_thread_count(thread_count: usize) -> Result<Box<dyn WorkerPool>, PoolError> {
    if thread_count == 0 {
        Ok(Box::new(CachedThreadPool::new()))
    } else {
        Ok(Box::new(FixedThreadPool::new(thread_count)?))
    }
}

fn run_job(job: Job) {
    if catch_unwind(AssertUnwindSafe(job)).is_err() {
        tracing::error!(thread = thread::current().name().unwrap_or("?"), "Worker job panicked");
    }
}

pub struct FixedThreadPool {
    sender: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

impl FixedThreadPool {
    pub fn new(size: usize) -> Result<Self, PoolError> {
        let (sender, receiver) = channel::unbounded::<Job>();
        let workers = (1..=size)
            .map(|n| spawn_worker(n, receiver.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(threads = size, "Fixed worker pool started");

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Shuts down and waits for queued jobs to drain.
    pub fn join(&self) {
        self.shutdown();
        let workers = std::mem::take(&mut *self.workers.lock().unwrap_or_else(|p| p.into_inner()));
        for worker in workers {
            let _ = worker.join();
        }
    }
}

fn spawn_worker(n: usize, jobs: Receiver<Job>) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("{THREAD_PREFIX}-{n}"))
        .spawn(move || {
            while let Ok(job) = jobs.recv() {
                run_job(job);
            }
        })
}

impl WorkerPool for FixedThreadPool {
    fn execute(&self, job: Job) -> Result<(), PoolError> {
        let guard = self.sender.lock().unwrap_or_else(|p| p.into_inner());
        match guard.as_ref() {
            Some(sender) => sender.send(job).map_err(|_| PoolError::ShutDown),
            None => Err(PoolError::ShutDown),
        }
    }

    fn shutdown(&self) {
        // Dropping the sender lets workers exit once the queue is empty.
        self.sender.lock().unwrap_or_else(|p| p.into_inner()).take();
    }
}

impl Drop for FixedThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawns a new named thread for every job; threads exit when their job does.
#[derive(Debug, Default)]
pub struct CachedThreadPool {
    counter: AtomicUsize,
    closed: AtomicBool,
}

impl CachedThreadPool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkerPool for CachedThreadPool {
    fn execute(&self, job: Job) -> Result<(), PoolError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PoolError::ShutDown);
        }
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        thread::Builder::new()
            .name(format!("{THREAD_PREFIX}-{n}"))
            .spawn(move || run_job(job))?;
        Ok(())
    }

    fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn fixed_pool_runs_every_job_on_named_threads() {
        let pool = FixedThreadPool::new(2).unwrap();
        let (tx, rx) = channel::unbounded();
        for i in 0..10 {
            let tx = tx.clone();
            pool.execute(Box::new(move || {
                let name = thread::current().name().unwrap_or_default().to_string();
                tx.send((i, name)).unwrap();
            }))
            .unwrap();
        }
        pool.join();

        let results: Vec<(i32, String)> = rx.try_iter().collect();
        assert_eq!(results.len(), 10);
        assert!(results.iter().all(|(_, name)| name == "executor-thread-1" || name == "executor-thread-2"));
        assert_eq!(pool.size(), 2);
    }

    fn boom() {
        panic!("boom");
    }

    #[test]
    fn panicking_job_does_not_kill_the_worker() {
        let pool = FixedThreadPool::new(1).unwrap();
        let done = Arc::new(AtomicBool::new(false));
        pool.execute(Box::new(boom)).unwrap();
        let flag = Arc::clone(&done);
        pool.execute(Box::new(move || flag.store(true, Ordering::SeqCst))).unwrap();
        pool.join();
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn shut_down_pools_refuse_jobs() {
        let fixed = FixedThreadPool::new(1).unwrap();
        fixed.shutdown();
        assert!(matches!(fixed.execute(Box::new(|| {})), Err(PoolError::ShutDown)));

        let cached = CachedThreadPool::new();
        cached.shutdown();
        assert!(matches!(cached.execute(Box::new(|| {})), Err(PoolError::ShutDown)));
    }

    #[test]
    fn cached_pool_spawns_per_job() {
        let pool = from_thread_count(0).unwrap();
        let (tx, rx) = channel::unbounded();
        for _ in 0..3 {
            let tx = tx.clone();
            pool.execute(Box::new(move || tx.send(()).unwrap())).unwrap();
        }
        for _ in 0..3 {
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
    }
}
