//! Per-connection session state machine.
//!
//! # States
//! ```text
//! ReadingHeader → [SendingContinue] → ReadingBody → Dispatching
//!     → (ReadingHeader | Closed)
//! ```
//! While `Dispatching`, the write half belongs to the handler's [`Exchange`].
//! Sending the response and streaming chunks are tracked there as its own
//! response state (`Pending → Streaming* → Complete`). The session resumes
//! once the exchange reports completion.
//!
//! # Design Decisions
//! - One task per connection; reads and writes never overlap within it
//! - No pipelining: the next head is read only after the response completes
//! - Errors end the session silently; no error response is synthesized
//! - No idle or operation timeouts: a stalled peer holds its session open

use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf};

use crate::config::SessionConfig;
use crate::http::codec;
use crate::http::error::SessionError;
use crate::http::exchange::{BoxedWriter, Exchange};
use crate::http::handler::Handler;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::net::connection::{ConnectionGuard, ConnectionId};
use crate::observability::metrics;
use crate::payload::Payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    ReadingHeader,
    SendingContinue,
    ReadingBody,
    Dispatching,
    Closed,
}

/// How a session ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Peer closed between requests.
    PeerClosed,
    /// The handler's accept hook refused a request.
    Rejected,
    /// The exchange was dropped or a response write failed.
    Abandoned,
    /// The last response required closing the connection.
    NeedsClose,
}

pub struct Session<H, S> {
    id: ConnectionId,
    _guard: ConnectionGuard,
    handler: Arc<H>,
    reader: ReadHalf<S>,
    writer: Option<BoxedWriter>,
    buf: BytesMut,
    config: SessionConfig,
    state: SessionState,
}

impl<H, S> Session<H, S>
where
    H: Handler,
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    pub fn new(handler: Arc<H>, io: S, guard: ConnectionGuard, config: &SessionConfig) -> Self {
        let (reader, writer) = tokio::io::split(io);
        Self {
            id: guard.id(),
            _guard: guard,
            handler,
            reader,
            writer: Some(Box::new(writer)),
            buf: BytesMut::with_capacity(config.read_buffer_capacity),
            config: config.clone(),
            state: SessionState::ReadingHeader,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the connection until it closes.
    pub async fn run(mut self) -> Result<SessionEnd, SessionError> {
        let result = self.serve().await;
        match &result {
            Ok(end) => tracing::debug!(connection_id = %self.id, reason = ?end, "Session ended"),
            Err(e) => tracing::debug!(connection_id = %self.id, error = %e, "Session terminated"),
        }
        self.transition(SessionState::Closed);
        result
    }

    async fn serve(&mut self) -> Result<SessionEnd, SessionError> {
        loop {
            self.transition(SessionState::ReadingHeader);
            let head = match codec::read_head(&mut self.reader, &mut self.buf, self.config.max_header_bytes).await? {
                Some(head) => head,
                None => return Ok(SessionEnd::PeerClosed),
            };
            tracing::debug!(
                connection_id = %self.id,
                method = %head.method,
                target = %head.target,
                "Request received"
            );
            metrics::record_request(head.method.as_str());
            let declared = head.declared_body_length()?;

            let mut body = Payload::default();
            if !self.handler.accept(&head, &mut body) {
                tracing::debug!(connection_id = %self.id, "Request rejected by handler");
                return Ok(SessionEnd::Rejected);
            }

            if head.expects_continue() {
                self.transition(SessionState::SendingContinue);
                let interim = Response::continue_for(&head);
                let io = self
                    .writer
                    .as_mut()
                    .ok_or(SessionError::InvalidState("connection released"))?;
                codec::write_head(io, &interim).await?;
            }

            self.transition(SessionState::ReadingBody);
            let received = codec::read_body(
                &mut self.reader,
                &mut self.buf,
                declared,
                &mut body,
                self.config.read_buffer_capacity,
            )
            .await?;
            if !body.is_inline() {
                metrics::record_spill(received);
                tracing::debug!(connection_id = %self.id, path = ?body.path(), bytes = received, "Body spilled to disk");
            }

            self.transition(SessionState::Dispatching);
            let io = self
                .writer
                .take()
                .ok_or(SessionError::InvalidState("connection released"))?;
            let (exchange, done) = Exchange::new(self.id, Request::new(head, body), io);
            self.handler.handle(exchange).await;

            let Ok(completion) = done.await else {
                return Ok(SessionEnd::Abandoned);
            };
            if completion.needs_close {
                let mut io = completion.io;
                if let Err(e) = io.shutdown().await {
                    tracing::debug!(connection_id = %self.id, error = %e, "Shutdown after response failed");
                }
                return Ok(SessionEnd::NeedsClose);
            }
            self.writer = Some(completion.io);
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::trace!(connection_id = %self.id, from = ?self.state, to = ?next, "Session state");
        self.state = next;
    }
}
