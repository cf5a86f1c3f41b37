//! Session Handler
//!
//! Given a freshly accepted connection, push the greeting and let go of it.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Acceptor hands over the Connection
//!        │
//!        ▼
//! 2. write_all(greeting) armed on the reactor
//!        │   (runs on any worker)
//!        ▼
//! 3. Completion posted to the strand
//!        │   log success / failure
//!        ▼
//! 4. Callback returns, Connection dropped, socket closed
//! ```
//!
//! No read is ever issued. Whatever the client sends is ignored.

use crate::runtime::Strand;
use crate::server::ServerStats;
use bytes::Bytes;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tracing::{info, warn};

/// The bytes every client receives, exactly once.
pub const GREETING: &[u8] = b"Hello, Client!\n";

/// One accepted socket.
///
/// Owned first by the write operation, then by its completion callback.
/// There is no explicit close: the socket goes away with the last owner.
#[derive(Debug)]
pub struct Connection {
    id: u64,
    peer: SocketAddr,
    stream: TcpStream,
}

impl Connection {
    pub fn new(id: u64, peer: SocketAddr, stream: TcpStream) -> Self {
        Self { id, peer, stream }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

/// Sends the greeting to each connection it is handed.
#[derive(Debug, Clone)]
pub struct SessionHandler {
    /// Shared by every in-flight write; never mutated
    greeting: Bytes,
    strand: Strand,
    handle: Handle,
    stats: Arc<ServerStats>,
}

impl SessionHandler {
    pub fn new(strand: Strand, handle: Handle, stats: Arc<ServerStats>) -> Self {
        Self {
            greeting: Bytes::from_static(GREETING),
            strand,
            handle,
            stats,
        }
    }

    pub fn greeting(&self) -> &Bytes {
        &self.greeting
    }

    /// Arms one write of the full greeting to `connection`.
    ///
    /// The completion is logged on the strand; after that the connection is
    /// dropped. Failed writes are not retried.
    pub fn handle_session(&self, mut connection: Connection) {
        self.stats.connection_opened();

        let greeting = self.greeting.clone();
        let stats = Arc::clone(&self.stats);
        let on_complete = self.strand.bind(
            move |(connection, result): (Connection, io::Result<usize>)| {
                match result {
                    Ok(bytes) => {
                        stats.greeting_sent(bytes);
                        info!(client = %connection.peer(), id = connection.id(), "Message sent to client");
                    }
                    Err(e) => {
                        stats.write_failed();
                        warn!(client = %connection.peer(), id = connection.id(), error = %e, "Failed to send greeting");
                    }
                }
                stats.connection_closed();
            },
        );

        self.handle.spawn(async move {
            let result = connection
                .stream
                .write_all(&greeting)
                .await
                .map(|()| greeting.len());
            on_complete((connection, result));
        });
    }
}
