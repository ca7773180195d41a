//! Response value and its close/framing rules.
//!
//! # Responsibilities
//! - Hold status, version, fields and one [`Payload`]
//! - Mark a response chunked, or size it with `Content-Length`
//! - Derive `needs_close` from protocol rules
//! - Serialize the head section

use bytes::{BufMut, BytesMut};
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{StatusCode, Version};

use crate::http::request::{has_connection_token, keep_alive, RequestHead};
use crate::payload::Payload;

/// Value of the `Server` field on responses built with [`Response::for_request`].
pub const SERVER_NAME: &str = concat!("spillway/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Payload,
    chunked: bool,
}

impl Response {
    pub fn new(status: StatusCode, version: Version) -> Self {
        Self {
            status,
            version,
            headers: HeaderMap::new(),
            body: Payload::default(),
            chunked: false,
        }
    }

    /// A response answering `head`: same version, `Server` set, and the
    /// client's keep-alive preference mirrored.
    pub fn for_request(status: StatusCode, head: &RequestHead) -> Self {
        let mut res = Self::new(status, head.version);
        res.headers
            .insert(header::SERVER, HeaderValue::from_static(SERVER_NAME));
        res.set_keep_alive(head.keep_alive());
        res
    }

    /// The interim `100 Continue` for `head`.
    pub fn continue_for(head: &RequestHead) -> Self {
        let mut res = Self::new(StatusCode::CONTINUE, head.version);
        res.headers
            .insert(header::SERVER, HeaderValue::from_static(SERVER_NAME));
        res
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Payload {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Payload>) {
        self.body = body.into();
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    /// Switch chunked transfer-encoding on or off.
    ///
    /// Turning it on drops any `Content-Length`.
    pub fn set_chunked(&mut self, chunked: bool) {
        self.chunked = chunked;
        if chunked {
            self.headers.remove(header::CONTENT_LENGTH);
            self.headers
                .insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        } else {
            self.headers.remove(header::TRANSFER_ENCODING);
        }
    }

    pub fn keep_alive(&self) -> bool {
        keep_alive(self.version, &self.headers)
    }

    pub fn set_keep_alive(&mut self, keep_alive: bool) {
        let value = match (keep_alive, self.version) {
            (false, _) => Some("close"),
            (true, Version::HTTP_10) => Some("keep-alive"),
            (true, _) => None,
        };
        match value {
            Some(v) => {
                self.headers
                    .insert(header::CONNECTION, HeaderValue::from_static(v));
            }
            None => {
                if has_connection_token(&self.headers, "close") {
                    self.headers.remove(header::CONNECTION);
                }
            }
        }
    }

    /// Set `Content-Length` from the body size, unless chunked or the status
    /// forbids a body.
    pub fn prepare_payload(&mut self) {
        if self.chunked {
            return;
        }
        if body_forbidden(self.status) {
            self.headers.remove(header::CONTENT_LENGTH);
            return;
        }
        self.headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(self.body.size()));
    }

    /// Whether the connection must close after this response.
    ///
    /// True on `Connection: close`, on HTTP/1.0 without keep-alive, and when
    /// the end of the body cannot be framed.
    pub fn needs_close(&self) -> bool {
        if !self.keep_alive() {
            return true;
        }
        if body_forbidden(self.status) {
            return false;
        }
        !self.chunked && !self.headers.contains_key(header::CONTENT_LENGTH)
    }

    /// Append the status line and header section to `dst`.
    pub fn encode_head(&self, dst: &mut BytesMut) {
        let version = match self.version {
            Version::HTTP_10 => "HTTP/1.0",
            _ => "HTTP/1.1",
        };
        let reason = self.status.canonical_reason().unwrap_or("");

        dst.put_slice(version.as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(self.status.as_str().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(reason.as_bytes());
        dst.put_slice(b"\r\n");
        for (name, value) in &self.headers {
            dst.put_slice(name.as_str().as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
    }
}

fn body_forbidden(status: StatusCode) -> bool {
    status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
}
