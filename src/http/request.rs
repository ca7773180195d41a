//! Parsed request head and the request value handed to handlers.
//!
//! # Responsibilities
//! - Convert an `httparse` request into owned `http` types
//! - Derive framing facts: declared body length, `Expect`, keep-alive

use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Method, Version};

use crate::http::error::SessionError;
use crate::payload::Payload;

/// Method, target, version and header fields of a request.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub target: String,
    pub version: Version,
    pub headers: HeaderMap,
}

impl RequestHead {
    /// Build an owned head from a completely parsed `httparse` request.
    pub fn from_parsed(req: &httparse::Request<'_, '_>) -> Result<Self, SessionError> {
        let method = req
            .method
            .ok_or_else(|| SessionError::Protocol("missing method".into()))
            .and_then(|m| {
                Method::from_bytes(m.as_bytes())
                    .map_err(|_| SessionError::Protocol(format!("invalid method: {m}")))
            })?;

        let target = req
            .path
            .ok_or_else(|| SessionError::Protocol("missing request target".into()))?
            .to_string();

        let version = match req.version {
            Some(0) => Version::HTTP_10,
            Some(1) => Version::HTTP_11,
            other => {
                return Err(SessionError::Protocol(format!("unsupported version: {other:?}")));
            }
        };

        let mut headers = HeaderMap::with_capacity(req.headers.len());
        for field in req.headers.iter() {
            let name = HeaderName::from_bytes(field.name.as_bytes())
                .map_err(|_| SessionError::Protocol(format!("invalid field name: {}", field.name)))?;
            let value = HeaderValue::from_bytes(field.value)
                .map_err(|_| SessionError::Protocol(format!("invalid value for field {}", field.name)))?;
            headers.append(name, value);
        }

        Ok(Self {
            method,
            target,
            version,
            headers,
        })
    }

    /// Target path without the query string.
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    /// `Content-Length`, if present.
    ///
    /// Repeated fields must agree; anything unparsable is a protocol error.
    pub fn content_length(&self) -> Result<Option<u64>, SessionError> {
        let mut length = None;
        for value in self.headers.get_all(header::CONTENT_LENGTH) {
            let parsed = value
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .ok_or_else(|| SessionError::Protocol("invalid content-length".into()))?;
            match length {
                Some(previous) if previous != parsed => {
                    return Err(SessionError::Protocol("conflicting content-length fields".into()));
                }
                _ => length = Some(parsed),
            }
        }
        Ok(length)
    }

    /// Whether the body uses chunked transfer-encoding.
    pub fn is_chunked(&self) -> bool {
        self.headers
            .get_all(header::TRANSFER_ENCODING)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .last()
            .map(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
            .unwrap_or(false)
    }

    /// Length the body reader is initialized with.
    ///
    /// Chunked bodies have no declared length. Requests with neither
    /// `Content-Length` nor `Transfer-Encoding` have an empty body.
    pub fn declared_body_length(&self) -> Result<Option<u64>, SessionError> {
        if self.is_chunked() {
            return Ok(None);
        }
        Ok(Some(self.content_length()?.unwrap_or(0)))
    }

    /// `Expect: 100-continue` was sent.
    pub fn expects_continue(&self) -> bool {
        self.headers
            .get(header::EXPECT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().eq_ignore_ascii_case("100-continue"))
            .unwrap_or(false)
    }

    /// Whether the client wants the connection kept open.
    pub fn keep_alive(&self) -> bool {
        keep_alive(self.version, &self.headers)
    }
}

/// A request with its body.
#[derive(Debug)]
pub struct Request {
    pub head: RequestHead,
    pub body: Payload,
}

impl Request {
    pub fn new(head: RequestHead, body: Payload) -> Self {
        Self { head, body }
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn target(&self) -> &str {
        &self.head.target
    }

    pub fn path(&self) -> &str {
        self.head.path()
    }

    pub fn version(&self) -> Version {
        self.head.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn body(&self) -> &Payload {
        &self.body
    }
}

/// Whether the `Connection` field lists `token`.
pub(crate) fn has_connection_token(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|t| t.trim().eq_ignore_ascii_case(token))
}

/// Keep-alive default per version, overridden by `Connection`.
pub(crate) fn keep_alive(version: Version, headers: &HeaderMap) -> bool {
    if has_connection_token(headers, "close") {
        return false;
    }
    if version == Version::HTTP_10 {
        return has_connection_token(headers, "keep-alive");
    }
    true
}
