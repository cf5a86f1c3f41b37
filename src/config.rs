//! Server Configuration
//!
//! The binary always runs with [`ServerConfig::default`]: port 8080 on every
//! IPv4 interface, one worker thread per logical core. Neither value is read
//! from flags or the environment. The builder helpers exist so tests and
//! benchmarks can run servers on ephemeral ports.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::thread;

use crate::DEFAULT_PORT;

/// Configuration for a [`Server`](crate::Server).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// IPv4 address to listen on
    pub host: Ipv4Addr,
    /// Port to listen on (0 picks an ephemeral port)
    pub port: u16,
    /// Number of threads driving the reactor
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::UNSPECIFIED,
            port: DEFAULT_PORT,
            workers: default_workers(),
        }
    }
}

impl ServerConfig {
    pub fn with_host(mut self, host: Ipv4Addr) -> Self {
        self.host = host;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Returns the address the listener binds to.
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.host, self.port))
    }
}

/// The host's reported hardware concurrency, or 1 if it cannot be queried.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
