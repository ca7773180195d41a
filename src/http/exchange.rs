//! One request/response cycle of a session, as seen by the handler.
//!
//! # Responsibilities
//! - Give the handler the request and exclusive use of the write half
//! - Enforce `send` once, then `send_chunk`* for chunked responses
//! - Hand the write half back to the session when the response completes
//!
//! # Design Decisions
//! - `send`/`send_chunk` take `&mut self`, so only one write is ever in flight
//! - Dropping an unfinished exchange closes the connection

use tokio::io::AsyncWrite;
use tokio::sync::oneshot;

use crate::http::codec;
use crate::http::error::SessionError;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::net::connection::ConnectionId;
use crate::observability::metrics;

/// Write half of a connection, boxed so the handler API is transport-agnostic.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Returned to the session once a response has been fully written.
pub(crate) struct Completion {
    pub(crate) io: BoxedWriter,
    pub(crate) needs_close: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseState {
    /// Waiting for `send`.
    Pending,
    /// Chunked head written; accepting chunks.
    Streaming { needs_close: bool },
    /// Response finished or aborted.
    Complete,
}

/// Handler-side view of a session for one request.
pub struct Exchange {
    id: ConnectionId,
    request: Request,
    io: Option<BoxedWriter>,
    state: ResponseState,
    done: Option<oneshot::Sender<Completion>>,
}

impl Exchange {
    pub(crate) fn new(
        id: ConnectionId,
        request: Request,
        io: BoxedWriter,
    ) -> (Self, oneshot::Receiver<Completion>) {
        let (tx, rx) = oneshot::channel();
        let exchange = Self {
            id,
            request,
            io: Some(io),
            state: ResponseState::Pending,
            done: Some(tx),
        };
        (exchange, rx)
    }

    /// The request being answered.
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.id
    }

    /// Whether the response has been fully written (or abandoned).
    pub fn is_complete(&self) -> bool {
        self.state == ResponseState::Complete
    }

    /// Send the response.
    ///
    /// For chunked responses only the head is written; follow up with
    /// [`send_chunk`](Self::send_chunk). Otherwise head and body go out
    /// together and the exchange completes.
    pub async fn send(&mut self, response: Response) -> Result<(), SessionError> {
        if self.state != ResponseState::Pending {
            return Err(SessionError::InvalidState("response already sent"));
        }
        let needs_close = response.needs_close();
        let chunked = response.is_chunked();

        let result = match self.io.as_mut() {
            Some(io) if chunked => codec::write_head(io, &response).await.map(|_| 0),
            Some(io) => codec::write_message(io, &response).await,
            None => return Err(SessionError::InvalidState("connection released")),
        };

        let body_bytes = match result {
            Ok(n) => n,
            Err(e) => {
                self.abort();
                return Err(e);
            }
        };

        metrics::record_response(response.status().as_u16(), chunked);
        tracing::debug!(
            connection_id = %self.id,
            status = response.status().as_u16(),
            chunked,
            needs_close,
            bytes = body_bytes,
            "Response sent"
        );

        if chunked {
            self.state = ResponseState::Streaming { needs_close };
        } else {
            self.complete(needs_close);
        }
        Ok(())
    }

    /// Send one chunk of a chunked response, or end it with `None`.
    ///
    /// An empty slice writes nothing.
    pub async fn send_chunk(&mut self, data: Option<&[u8]>) -> Result<(), SessionError> {
        let ResponseState::Streaming { needs_close } = self.state else {
            return Err(SessionError::InvalidState("no chunked response in progress"));
        };
        let Some(io) = self.io.as_mut() else {
            return Err(SessionError::InvalidState("connection released"));
        };

        let result = match data {
            Some(bytes) => codec::write_chunk(io, bytes).await,
            None => codec::write_last_chunk(io).await,
        };
        if let Err(e) = result {
            self.abort();
            return Err(e);
        }

        match data {
            Some(bytes) => {
                metrics::record_chunk(bytes.len());
                tracing::trace!(connection_id = %self.id, bytes = bytes.len(), "Chunk sent");
            }
            None => {
                tracing::debug!(connection_id = %self.id, "Chunked response finished");
                self.complete(needs_close);
            }
        }
        Ok(())
    }

    fn complete(&mut self, needs_close: bool) {
        self.state = ResponseState::Complete;
        if let (Some(io), Some(done)) = (self.io.take(), self.done.take()) {
            // The session may already be gone; nothing to hand back then.
            let _ = done.send(Completion { io, needs_close });
        }
    }

    fn abort(&mut self) {
        self.state = ResponseState::Complete;
        self.io = None;
        self.done = None;
    }
}

impl Drop for Exchange {
    fn drop(&mut self) {
        if self.state != ResponseState::Complete {
            tracing::debug!(
                connection_id = %self.id,
                "Exchange dropped before the response completed; closing connection"
            );
        }
    }
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("id", &self.id)
            .field("request", &self.request)
            .field("state", &self.state)
            .finish()
    }
}
