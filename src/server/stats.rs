//! Server Statistics
//!
//! Relaxed atomic counters updated by the acceptor and the session handler.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing what the acceptor and session handler have done.
#[derive(Debug, Default)]
pub struct ServerStats {
    /// Accept operations ever armed on the reactor
    pub accepts_armed: AtomicU64,
    /// Accept operations armed but not yet completed
    pub pending_accepts: AtomicU64,
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Accept completions that carried an error
    pub accept_errors: AtomicU64,
    /// Connections whose greeting write is still in flight
    pub active_connections: AtomicU64,
    /// Greetings fully delivered
    pub greetings_sent: AtomicU64,
    /// Greeting writes that failed
    pub write_errors: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept_armed(&self) {
        self.accepts_armed.fetch_add(1, Ordering::Relaxed);
        self.pending_accepts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accept_completed(&self) {
        self.pending_accepts.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn accept_failed(&self) {
        self.accept_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn greeting_sent(&self, bytes: usize) {
        self.greetings_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn write_failed(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }
}
