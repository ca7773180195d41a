//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop)
//!     → connection.rs (connection ID, live-session tracking)
//!     → http::Session (one task per connection)
//! ```
//!
//! # Design Decisions
//! - Accept is re-issued immediately; sessions progress concurrently
//! - A failed accept never stops the loop
//! - Each connection tracked for graceful shutdown

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{Listener, ListenerError};
