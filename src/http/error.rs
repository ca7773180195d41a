//! Session error kinds.

use thiserror::Error;

use crate::payload::PayloadError;

/// Errors that end a session or reject an [`Exchange`] call.
///
/// All of them are local to the session that produced them.
///
/// [`Exchange`]: crate::http::Exchange
#[derive(Debug, Error)]
pub enum SessionError {
    /// I/O failure on the connection itself.
    #[error("transport error: {0}")]
    Transport(#[source] std::io::Error),

    /// Malformed header section or body framing.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Body storage failure (undeclared length, spill file I/O).
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// `send`/`send_chunk` called out of order.
    #[error("invalid exchange state: {0}")]
    InvalidState(&'static str),
}

impl SessionError {
    pub(crate) fn unexpected_eof() -> Self {
        SessionError::Transport(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed mid-message",
        ))
    }
}

impl From<httparse::Error> for SessionError {
    fn from(err: httparse::Error) -> Self {
        SessionError::Protocol(err.to_string())
    }
}
