//! # hellod - A Minimal Concurrent Greeting Server
//!
//! hellod listens on TCP port 8080, accepts connections for as long as the
//! process lives, and sends every client the same 15 bytes:
//!
//! ```text
//! Hello, Client!\n
//! ```
//!
//! Nothing is read from the client and nothing else is sent. The interesting
//! part is how the accept/serve loop is driven.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               Server                                    │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │  WorkerPool: N threads, all driving one tokio reactor            │   │
//! │  └───────────────────────────────┬──────────────────────────────────┘   │
//! │                                  │ completions (any thread)             │
//! │                                  ▼                                      │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │  Strand: one logical lane, callbacks never overlap               │   │
//! │  └───────────┬──────────────────────────────────────┬───────────────┘   │
//! │              │                                      │                   │
//! │              ▼                                      ▼                   │
//! │  ┌─────────────────────┐   Connection   ┌──────────────────────────┐    │
//! │  │  Acceptor           │───────────────>│  SessionHandler          │    │
//! │  │  (re-arms forever)  │                │  (write greeting, drop)  │    │
//! │  └─────────────────────┘                └──────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use hellod::{Server, ServerConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let server = Server::new(ServerConfig::default())?;
//!     server.run();
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`runtime`]: worker pool over the tokio reactor, and the strand
//! - [`server`]: server construction, the acceptor, and counters
//! - [`connection`]: the session handler that sends the greeting
//! - [`config`]: listening address and worker count
//!
//! ## Design Highlights
//!
//! ### Serialization Without Locks
//!
//! Every completion callback (accept finished, write finished) is posted to a
//! single [`Strand`]. The accept operations and writes themselves run in
//! parallel across the pool; only the callbacks are serialized. This is what
//! makes re-arming the acceptor race-free.
//!
//! ### One Outstanding Accept
//!
//! The acceptor arms its next accept from inside the completion of the
//! previous one, success or failure. There is always exactly one accept
//! pending, and the count of accepts ever armed only grows.
//!
//! ### Implicit Teardown
//!
//! A connection is owned by its write operation and then by that write's
//! completion callback. When the callback returns, the socket is dropped.

pub mod config;
pub mod connection;
pub mod runtime;
pub mod server;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use connection::{Connection, SessionHandler, GREETING};
pub use runtime::{Strand, WorkerPool};
pub use server::{Acceptor, Server, ServerError, ServerStats};

/// The port hellod listens on
pub const DEFAULT_PORT: u16 = 8080;

/// Version of hellod
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
