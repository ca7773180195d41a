//! TCP listener and accept loop.
//!
//! # Responsibilities
//! - Bind to the configured address (failure is fatal to startup)
//! - Accept incoming TCP connections and spawn one session each
//! - Keep accepting after a failed accept
//! - Stop on shutdown and let live sessions drain

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use crate::config::{ListenerConfig, SessionConfig};
use crate::http::{Handler, Session};
use crate::net::connection::ConnectionTracker;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind(std::io::Error),
    /// Failed to accept connection.
    Accept(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::Accept(e) => write!(f, "Failed to accept: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {}

/// Bound socket plus the accept loop that feeds sessions.
pub struct Listener {
    inner: TcpListener,
    tracker: ConnectionTracker,
    shutdown_grace: Duration,
}

impl Listener {
    /// Bind to the configured address.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config
            .bind_address
            .parse()
            .map_err(|e| ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(ListenerError::Bind)?;

        let local_addr = listener
            .local_addr()
            .map_err(ListenerError::Bind)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self {
            inner: listener,
            tracker: ConnectionTracker::new(),
            shutdown_grace: Duration::from_secs(config.shutdown_grace_secs),
        })
    }

    /// Accept one connection.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        self.inner.accept().await.map_err(ListenerError::Accept)
    }

    /// Accept connections until `shutdown` fires, one session per connection.
    pub async fn serve<H: Handler>(
        self,
        handler: Arc<H>,
        session_config: SessionConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                accepted = self.accept() => match accepted {
                    Ok((stream, peer_addr)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            tracing::debug!(peer_addr = %peer_addr, error = %e, "Failed to set TCP_NODELAY");
                        }
                        let guard = self.tracker.track();
                        tracing::debug!(
                            connection_id = %guard.id(),
                            peer_addr = %peer_addr,
                            active = self.tracker.active_count(),
                            "Connection accepted"
                        );
                        let session = Session::new(Arc::clone(&handler), stream, guard, &session_config);
                        tokio::spawn(session.run());
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed; continuing");
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("Listener stopping");
                    break;
                }
            }
        }

        drop(self.inner);
        let active = self.tracker.active_count();
        if active > 0 {
            tracing::info!(active, "Waiting for sessions to drain");
            if tokio::time::timeout(self.shutdown_grace, self.tracker.wait_for_drain())
                .await
                .is_err()
            {
                tracing::warn!(
                    active = self.tracker.active_count(),
                    "Shutdown grace period elapsed with sessions still open"
                );
            }
        }
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }
}
