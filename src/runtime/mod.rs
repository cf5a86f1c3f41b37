//! Runtime Module
//!
//! The execution substrate the server runs on: a tokio reactor serviced by a
//! fixed pool of worker threads, and the strand that serializes completion
//! callbacks on top of it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      WorkerPool                             │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐        │
//! │  │ worker 0 │ │ worker 1 │ │ worker 2 │ │ ...N     │        │
//! │  └────┬─────┘ └────┬─────┘ └────┬─────┘ └────┬─────┘        │
//! │       └────────────┴─────┬──────┴────────────┘              │
//! │                          ▼                                  │
//! │                 tokio reactor (epoll/kqueue)                │
//! │                          │ completions                      │
//! │                          ▼                                  │
//! │                  Strand (one lane, FIFO)                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod pool;
pub mod strand;

pub use pool::WorkerPool;
pub use strand::Strand;
