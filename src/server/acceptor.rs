//! Acceptor
//!
//! Keeps exactly one accept operation outstanding on the listening socket for
//! the whole life of the server.
//!
//! ```text
//!        ┌─────────────── start_accept() ◄────────────────┐
//!        ▼                                                │
//!   [Accepting] ── completion (on strand) ──┬── Ok  ──────┤──> SessionHandler
//!                                           └── Err ──────┘    (log, back off)
//! ```
//!
//! Every completion re-arms before doing anything else, so there is no state
//! in which the listener has stopped accepting. The re-arm happens inside a
//! strand callback, which is what rules out two `start_accept` calls racing.

use crate::connection::{Connection, SessionHandler};
use crate::runtime::Strand;
use crate::server::ServerStats;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tracing::{error, info, trace};

/// Delay before the accept that follows a failed one.
///
/// Keeps a persistent failure (e.g. descriptor exhaustion) from turning into a
/// busy loop. Successful accepts are never delayed.
pub const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// Owns the listening socket and re-arms itself after every completion.
#[derive(Debug)]
pub struct Acceptor {
    listener: TcpListener,
    strand: Strand,
    handle: Handle,
    sessions: SessionHandler,
    stats: Arc<ServerStats>,
    next_id: AtomicU64,
    #[cfg(test)]
    faults: test_faults::AcceptFaults,
}

impl Acceptor {
    pub fn new(
        listener: TcpListener,
        strand: Strand,
        handle: Handle,
        sessions: SessionHandler,
        stats: Arc<ServerStats>,
    ) -> Arc<Self> {
        Arc::new(Self {
            listener,
            strand,
            handle,
            sessions,
            stats,
            next_id: AtomicU64::new(1),
            #[cfg(test)]
            faults: test_faults::AcceptFaults::default(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Arms one accept operation whose completion runs on the strand.
    ///
    /// Must only be called once at startup and from the completion callback.
    pub fn start_accept(self: &Arc<Self>) {
        self.arm(Duration::ZERO);
    }

    fn arm(self: &Arc<Self>, delay: Duration) {
        self.stats.accept_armed();

        let this = Arc::clone(self);
        let on_complete = self
            .strand
            .bind(move |result: io::Result<(TcpStream, SocketAddr)>| this.on_accept(result));

        let acceptor = Arc::clone(self);
        self.handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            on_complete(acceptor.accept().await);
        });
        trace!("Accept armed");
    }

    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        #[cfg(test)]
        if let Some(e) = self.faults.next() {
            return Err(e);
        }
        self.listener.accept().await
    }

    fn on_accept(self: &Arc<Self>, result: io::Result<(TcpStream, SocketAddr)>) {
        self.stats.accept_completed();

        match result {
            Ok((stream, peer)) => {
                self.start_accept();

                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                info!(client = %peer, id, "New client connected");
                self.sessions.handle_session(Connection::new(id, peer, stream));
            }
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
                self.stats.accept_failed();
                self.arm(ACCEPT_ERROR_BACKOFF);
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::time::Instant;
    use tokio::runtime::{Builder, Runtime};

    fn runtime() -> Runtime {
        Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap()
    }

    fn acceptor(rt: &Runtime, stats: &Arc<ServerStats>) -> Arc<Acceptor> {
        let listener = rt
            .block_on(TcpListener::bind("127.0.0.1:0"))
            .unwrap();
        let strand = Strand::new(rt.handle());
        let sessions =
            SessionHandler::new(strand.clone(), rt.handle().clone(), Arc::clone(stats));
        Acceptor::new(
            listener,
            strand,
            rt.handle().clone(),
            sessions,
            Arc::clone(stats),
        )
    }

    fn wait_for(cond: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    fn fetch_greeting(addr: SocketAddr) -> Vec<u8> {
        let mut client = std::net::TcpStream::connect(addr).unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_rearms_after_each_connection() {
        let rt = runtime();
        let stats = Arc::new(ServerStats::new());
        let acceptor = acceptor(&rt, &stats);
        let addr = acceptor.local_addr().unwrap();

        acceptor.start_accept();
        assert_eq!(stats.accepts_armed.load(Ordering::Relaxed), 1);

        for n in 1..=3u64 {
            assert_eq!(fetch_greeting(addr), b"Hello, Client!\n");
            assert!(wait_for(|| stats.accepts_armed.load(Ordering::Relaxed) == n + 1));
        }
        assert_eq!(stats.pending_accepts.load(Ordering::Relaxed), 1);
        assert_eq!(stats.connections_accepted.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_failed_accepts_keep_one_pending_and_back_off() {
        let rt = runtime();
        let stats = Arc::new(ServerStats::new());
        let acceptor = acceptor(&rt, &stats);
        let addr = acceptor.local_addr().unwrap();

        acceptor.faults.remaining.store(3, Ordering::SeqCst);
        acceptor.start_accept();

        assert!(wait_for(|| stats.accept_errors.load(Ordering::Relaxed) == 3));
        assert!(wait_for(|| acceptor.faults.started.lock().unwrap().len() == 4));
        assert_eq!(stats.accepts_armed.load(Ordering::Relaxed), 4);
        assert_eq!(stats.pending_accepts.load(Ordering::Relaxed), 1);

        // Only the strand's drain task and the one real accept remain
        assert!(wait_for(|| rt.metrics().num_alive_tasks() == 2));

        let started = acceptor.faults.started.lock().unwrap().clone();
        for pair in started.windows(2) {
            assert!(pair[1] - pair[0] >= ACCEPT_ERROR_BACKOFF);
        }

        assert_eq!(fetch_greeting(addr), b"Hello, Client!\n");
        assert!(wait_for(|| stats.greetings_sent.load(Ordering::Relaxed) == 1));
        assert_eq!(stats.accepts_armed.load(Ordering::Relaxed), 5);
        assert_eq!(stats.pending_accepts.load(Ordering::Relaxed), 1);
        assert!(wait_for(|| rt.metrics().num_alive_tasks() == 2));
    }

    #[test]
    fn test_successful_accept_is_not_delayed() {
        let rt = runtime();
        let stats = Arc::new(ServerStats::new());
        let acceptor = acceptor(&rt, &stats);
        let addr = acceptor.local_addr().unwrap();

        acceptor.start_accept();
        assert_eq!(fetch_greeting(addr), b"Hello, Client!\n");

        assert!(wait_for(|| acceptor.faults.started.lock().unwrap().len() == 2));
        assert_eq!(stats.accept_errors.load(Ordering::Relaxed), 0);
    }
}
