//! Serialization Context
//!
//! A strand is a single logical lane of execution over the multi-threaded
//! worker pool. Jobs posted to it run one at a time, in the order they were
//! posted, on whichever worker thread currently hosts the lane.
//!
//! ## Design
//!
//! ```text
//!   worker A ──post──┐
//!   worker B ──post──┼──> [ mailbox (FIFO) ] ──> drain task ──> job(); job(); ...
//!   worker C ──post──┘
//! ```
//!
//! The drain task is an ordinary tokio task, so it may migrate between
//! workers, but there is only ever one of it per strand. That is the whole
//! mutual-exclusion guarantee: no lock is held while a job runs.
//!
//! Only work posted through the strand is serialized. The asynchronous
//! operations themselves (accepts, writes) run freely in parallel; it is their
//! completion callbacks that are funnelled through here via [`Strand::bind`].

use std::panic::{self, AssertUnwindSafe};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{error, trace};

/// A unit of work queued on a strand.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a serialized execution lane.
///
/// Cloning is cheap and every clone feeds the same lane.
#[derive(Debug, Clone)]
pub struct Strand {
    jobs: mpsc::UnboundedSender<Job>,
}

impl Strand {
    /// Creates a strand whose drain task runs on the given runtime.
    pub fn new(handle: &Handle) -> Self {
        let (jobs, mailbox) = mpsc::unbounded_channel();
        handle.spawn(drain(mailbox));
        Self { jobs }
    }

    /// Queues `job` to run on the strand.
    ///
    /// Returns `false` if the runtime hosting the strand has shut down, in
    /// which case the job is dropped without running.
    pub fn post<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.jobs.send(Box::new(job)).is_ok()
    }

    /// Wraps a completion callback so that calling it posts the callback,
    /// together with its argument, to this strand.
    pub fn bind<T, F>(&self, callback: F) -> impl FnOnce(T) + Send + 'static
    where
        T: Send + 'static,
        F: FnOnce(T) + Send + 'static,
    {
        let strand = self.clone();
        move |value| {
            if !strand.post(move || callback(value)) {
                trace!("Strand closed, dropping completion");
            }
        }
    }
}

/// Runs queued jobs one after another until every [`Strand`] handle is gone.
async fn drain(mut mailbox: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = mailbox.recv().await {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!("Strand job panicked; continuing with the next job");
        }
    }
    trace!("Strand drained");
}
