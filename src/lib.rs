//! HTTP/1.1 session server with spill-to-disk payloads.

pub mod config;
pub mod demo;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod payload;

pub use crate::config::ServerConfig;
pub use crate::http::{Exchange, Handler, Request, RequestHead, Response};
pub use crate::lifecycle::Shutdown;
pub use crate::net::Listener;
pub use crate::payload::Payload;
