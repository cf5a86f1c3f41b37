//! Server Module
//!
//! Ties the pieces together: one worker pool, one strand, one acceptor.
//!
//! ```text
//! Server::new
//!   ├── WorkerPool::new(workers)        threads start servicing the reactor
//!   ├── bind listener                   fails fast on address-in-use
//!   ├── Strand::new                     the single serialization lane
//!   ├── Acceptor::new + start_accept    first accept is armed
//!   └── return
//!
//! Server::run
//!   └── WorkerPool::join                never returns in practice
//! ```

pub mod acceptor;
pub mod stats;

pub use acceptor::{Acceptor, ACCEPT_ERROR_BACKOFF};
pub use stats::ServerStats;

use crate::config::ServerConfig;
use crate::connection::SessionHandler;
use crate::runtime::{Strand, WorkerPool};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tracing::{error, info};

/// A running greeting server.
///
/// Accepting starts as soon as construction succeeds. Dropping the server
/// shuts the worker pool down and closes the listener.
#[derive(Debug)]
pub struct Server {
    acceptor: Arc<Acceptor>,
    pool: WorkerPool,
    stats: Arc<ServerStats>,
    local_addr: SocketAddr,
}

impl Server {
    /// Starts the worker pool, binds the listener and arms the first accept.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        if config.workers == 0 {
            return Err(ServerError::NoWorkers);
        }

        let pool = WorkerPool::new(config.workers).map_err(ServerError::Runtime)?;

        let addr = config.bind_address();
        let listener = bind(pool.handle(), addr).map_err(|source| {
            error!(%addr, error = %source, "Failed to bind listener");
            ServerError::Bind { addr, source }
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let stats = Arc::new(ServerStats::new());
        let strand = Strand::new(pool.handle());
        let sessions =
            SessionHandler::new(strand.clone(), pool.handle().clone(), Arc::clone(&stats));
        let acceptor = Acceptor::new(
            listener,
            strand,
            pool.handle().clone(),
            sessions,
            Arc::clone(&stats),
        );

        info!(
            "Server starting on port {} with {} threads",
            local_addr.port(),
            config.workers
        );
        acceptor.start_accept();

        Ok(Self {
            acceptor,
            pool,
            stats,
            local_addr,
        })
    }

    /// The address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    /// Number of threads servicing the reactor.
    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    pub fn acceptor(&self) -> &Arc<Acceptor> {
        &self.acceptor
    }

    /// Blocks until the worker threads exit, which in practice is never.
    pub fn run(&self) {
        info!(addr = %self.local_addr, "Ready to accept connections");
        self.pool.join();
    }
}

/// Binds synchronously so that address-in-use surfaces from [`Server::new`]
/// rather than from a worker thread.
fn bind(handle: &Handle, addr: SocketAddr) -> io::Result<TcpListener> {
    let listener = std::net::TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;
    let _guard = handle.enter();
    TcpListener::from_std(listener)
}

/// Errors that can occur while constructing a [`Server`].
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The worker pool was configured with zero threads
    #[error("worker pool needs at least one thread")]
    NoWorkers,

    /// The runtime could not be started
    #[error("failed to start worker pool: {0}")]
    Runtime(#[source] io::Error),

    /// The listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::Ipv4Addr;
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    /// Collects formatted log output so tests can inspect it.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn local_config() -> ServerConfig {
        ServerConfig::default()
            .with_host(Ipv4Addr::LOCALHOST)
            .with_port(0)
            .with_workers(2)
    }

    #[test]
    fn test_new_arms_first_accept() {
        let server = assert_ok!(Server::new(local_config()));
        let stats = server.stats();

        assert_ne!(server.local_addr().port(), 0);
        assert_eq!(server.worker_count(), 2);
        assert_eq!(stats.accepts_armed.load(std::sync::atomic::Ordering::Relaxed), 1);
        assert_eq!(server.acceptor().local_addr().unwrap(), server.local_addr());
    }

    #[test]
    fn test_zero_workers() {
        let err = assert_err!(Server::new(local_config().with_workers(0)));
        assert!(matches!(err, ServerError::NoWorkers));
    }

    #[test]
    fn test_bind_error_names_address() {
        let first = Server::new(local_config()).unwrap();
        let taken = first.local_addr();

        let err = assert_err!(Server::new(local_config().with_port(taken.port())));
        match &err {
            ServerError::Bind { addr, source } => {
                assert_eq!(*addr, taken);
                assert_eq!(source.kind(), io::ErrorKind::AddrInUse);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains(&taken.to_string()));
    }

    #[test]
    fn test_bind_failure_is_logged() {
        let first = Server::new(local_config()).unwrap();
        let taken = first.local_addr();

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let result = tracing::subscriber::with_default(subscriber, || {
            Server::new(local_config().with_port(taken.port()))
        });
        assert_err!(result);

        let output = logs.contents();
        assert!(output.contains("Failed to bind listener"), "{output}");
        assert!(output.contains(&taken.to_string()), "{output}");
    }
}
