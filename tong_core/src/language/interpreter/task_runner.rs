use std::fmt;
use futures_util::future::join_all;
use log::{debug, trace};
use tokio::runtime::{Builder, Handle, Runtime};
use crate::language::error::Result;
use crate::runtime_error;
use super::value::Value;

pub type Task = Box<dyn FnOnce() -> Result<Value> + Send + 'static>;

/// Executes independent units of work and returns their results in
/// submission order. Any failed task fails the whole batch.
pub trait TaskRunner: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// How many chunks data-parallel builtins should split their input into.
    fn parallelism(&self) -> usize;

    fn run_all(&self, tasks: Vec<Task>) -> Result<Vec<Value>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialRunner;

impl TaskRunner for SequentialRunner {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn parallelism(&self) -> usize {
        1
    }

    fn run_all(&self, tasks: Vec<Task>) -> Result<Vec<Value>> {
        trace!("Running {} tasks sequentially", tasks.len());
        tasks.into_iter().map(|task| task()).collect()
    }
}

/// Runs tasks on the blocking pool of a dedicated tokio runtime.
pub struct ThreadPoolRunner {
    runtime: Runtime,
    workers: usize,
}

impl ThreadPoolRunner {
    pub fn new(workers: usize) -> std::io::Result<Self> {
        let workers = workers.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(workers)
            .thread_name("tong-worker")
            .build()?;

        debug!("Started thread pool runner with {} workers", workers);
        Ok(ThreadPoolRunner { runtime, workers })
    }

    /// One worker per available core.
    pub fn with_available_parallelism() -> std::io::Result<Self> {
        let workers = std::thread::available_parallelism().map_or(1, |n| n.get());
        Self::new(workers)
    }
}

impl fmt::Debug for ThreadPoolRunner {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ThreadPoolRunner").field("workers", &self.workers).finish()
    }
}

impl TaskRunner for ThreadPoolRunner {
    fn name(&self) -> &'static str {
        "threads"
    }

    fn parallelism(&self) -> usize {
        self.workers
    }

    fn run_all(&self, tasks: Vec<Task>) -> Result<Vec<Value>> {
        // Nested batches come from tasks already running on the pool.
        if tasks.len() <= 1 || Handle::try_current().is_ok() {
            return SequentialRunner.run_all(tasks);
        }

        debug!("Dispatching {} tasks to {} workers", tasks.len(), self.workers);
        self.runtime.block_on(async {
            let handles: Vec<_> = tasks.into_iter().map(tokio::task::spawn_blocking).collect();
            join_all(handles)
                .await
                .into_iter()
                .map(|joined| match joined {
                    Ok(result) => result,
                    Err(e) => runtime_error!("Parallel task failed: {}", e),
                })
                .collect()
        })
    }
}
