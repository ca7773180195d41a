//! HTTP/1.1 protocol subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted connection (from net::listener)
//!     → session.rs (per-connection state machine)
//!     → codec.rs (read head, [100 Continue], read body into Payload)
//!     → handler.rs (Handler::accept before the body, Handler::handle after)
//!     → exchange.rs (send / send_chunk, hand the connection back)
//!     → session.rs (next request, or close)
//! ```
//!
//! # Design Decisions
//! - Inbound bodies must be length-delimited; outbound may be chunked
//! - Keep-alive is decided per response from protocol rules
//! - The core never writes error responses; status choice is the handler's

pub mod codec;
pub mod error;
pub mod exchange;
pub mod handler;
pub mod request;
pub mod response;
pub mod session;

pub use error::SessionError;
pub use exchange::Exchange;
pub use handler::Handler;
pub use request::{Request, RequestHead};
pub use response::{Response, SERVER_NAME};
pub use session::{Session, SessionEnd, SessionState};
