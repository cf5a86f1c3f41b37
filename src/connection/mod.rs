//! Connection Module
//!
//! What happens to a client once the acceptor has it: one greeting, pushed
//! asynchronously, then the socket is released.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Acceptor                             │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ handle_session(Connection)
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SessionHandler                           │
//! │                                                             │
//! │  ┌──────────────────┐         ┌──────────────────────┐      │
//! │  │ write_all(hello) │──────>  │ completion on strand │      │
//! │  └──────────────────┘         └──────────────────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use hellod::connection::{Connection, SessionHandler};
//!
//! let (stream, peer) = listener.accept().await?;
//! sessions.handle_session(Connection::new(id, peer, stream));
//! ```

pub mod session;

// Re-export commonly used types
pub use session::{Connection, SessionHandler, GREETING};
