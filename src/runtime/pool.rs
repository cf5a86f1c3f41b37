//! Worker Pool
//!
//! A fixed set of OS threads, all driving the same tokio reactor. Any
//! completion can fire on any of them; the [`Strand`](super::Strand) is what
//! keeps related callbacks from overlapping.

use std::io;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::debug;

/// Name given to every worker thread
const WORKER_THREAD_NAME: &str = "hellod-worker";

/// Owns the reactor and the threads that service it.
///
/// Dropping the pool shuts the runtime down and releases every pending
/// operation along with the resources it holds.
#[derive(Debug)]
pub struct WorkerPool {
    runtime: Runtime,
}

impl WorkerPool {
    /// Starts `workers` threads, each running the reactor's dispatch loop.
    pub fn new(workers: usize) -> io::Result<Self> {
        if workers == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "worker pool needs at least one thread",
            ));
        }

        let runtime = Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name(WORKER_THREAD_NAME)
            .on_thread_start(|| debug!("Worker thread started"))
            .on_thread_stop(|| debug!("Worker thread stopped"))
            .enable_all()
            .build()?;

        Ok(Self { runtime })
    }

    /// Handle used to arm operations on the reactor.
    pub fn handle(&self) -> &Handle {
        self.runtime.handle()
    }

    /// Number of threads currently servicing the reactor.
    pub fn worker_count(&self) -> usize {
        self.runtime.metrics().num_workers()
    }

    /// Blocks the calling thread for as long as the workers run.
    ///
    /// Nothing ever signals the workers to stop, so this only returns if the
    /// process is torn down around it.
    pub fn join(&self) {
        self.runtime.block_on(std::future::pending::<()>());
    }
}
