//! Connection acceptor for the lookup service.
//!
//! # Responsibilities
//! - Accept connections on a bound [`Listener`]
//! - Spawn one independent session task per connection
//! - Keep accepting after transient accept failures, with backoff
//!
//! # Design Decisions
//! - The accept loop never awaits session work
//! - The record store is shared by cloning a handle; it is never mutated
//! - There is no shutdown signal; the loop ends with the process

use crate::net::{Accepted, ConnectionTracker, Listener};
use crate::observability::metrics;
use crate::resilience::AcceptBackoff;
use crate::session::{Session, SessionSettings};
use crate::store::RecordStore;

/// Accepts connections and hands each one to its own session.
#[derive(Clone)]
pub struct QueryServer {
    store: RecordStore,
    settings: SessionSettings,
    tracker: ConnectionTracker,
}

impl QueryServer {
    pub fn new(store: RecordStore, settings: SessionSettings) -> Self {
        Self {
            store,
            settings,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Number of sessions currently running.
    pub fn active_connections(&self) -> u64 {
        self.tracker.active_count()
    }

    /// Run the accept loop forever.
    pub async fn run(self, listener: Listener) {
        match listener.local_name() {
            Ok(name) => tracing::info!(address = %name, records = self.store.len(), "Accepting connections"),
            Err(err) => tracing::warn!(error = %err, "Could not determine listener address"),
        }

        let mut backoff = AcceptBackoff::new();
        loop {
            match listener.accept().await {
                Ok(accepted) => {
                    backoff.succeeded();
                    self.spawn_session(accepted);
                }
                Err(err) => {
                    metrics::record_accept_error();
                    let delay = backoff.failed();
                    tracing::warn!(
                        error = %err,
                        consecutive_failures = backoff.consecutive_failures(),
                        retry_in_ms = delay.as_millis() as u64,
                        "Accept failed"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn spawn_session(&self, accepted: Accepted) {
        let Accepted { stream, peer, permit } = accepted;
        let guard = self.tracker.track();
        let id = guard.id();

        tracing::info!(connection_id = %id, peer = %peer, "Connection accepted");

        let session = Session::new(id, stream, self.store.clone(), self.settings);
        tokio::spawn(async move {
            let summary = session.run().await;
            if summary.reason.is_error() {
                tracing::warn!(
                    connection_id = %summary.id,
                    requests = summary.requests,
                    reason = %summary.reason,
                    "Connection closed with error"
                );
            } else {
                tracing::info!(
                    connection_id = %summary.id,
                    requests = summary.requests,
                    reason = %summary.reason,
                    "Connection closed"
                );
            }
            drop(permit);
            drop(guard);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::GREETING;
    use crate::store::Record;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn store() -> RecordStore {
        RecordStore::new(vec![Record {
            cumulative_test_positive: "1".into(),
            cumulative_test_performed: "2".into(),
            date: "2020-05-01".into(),
            discharged: "3".into(),
            expired: "4".into(),
            region: "Oyo".into(),
            admitted: "5".into(),
        }])
    }

    #[tokio::test]
    async fn sessions_run_concurrently() {
        let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = tcp.local_addr().unwrap();
        let server = QueryServer::new(store(), SessionSettings::default());
        let probe = server.clone();
        let handle = tokio::spawn(server.run(Listener::from_tcp(tcp, 0)));

        let mut first = TcpStream::connect(addr).await.unwrap();
        let mut second = TcpStream::connect(addr).await.unwrap();

        let mut banner = vec![0u8; GREETING.len()];
        first.read_exact(&mut banner).await.unwrap();
        second.read_exact(&mut banner).await.unwrap();
        assert_eq!(banner, GREETING);

        // The idle first connection must not hold up the second.
        second.write_all(b"{\"query\":{\"region\":\"nowhere\"}}\n").await.unwrap();
        let mut reply = vec![0u8; b"Nothing found\n".len()];
        second.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, b"Nothing found\n");
        assert_eq!(probe.active_connections(), 2);

        handle.abort();
    }
}
