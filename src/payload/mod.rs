//! Payload storage subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound body bytes
//!     → reader.rs (PayloadReader: init with declared length, put chunks)
//!     → storage.rs (Payload::Inline buffer | Payload::File on disk)
//!
//! Outbound body
//!     storage.rs
//!     → writer.rs (PayloadWriter: whole buffer, or 4 KiB file blocks)
//!     → wire codec
//! ```
//!
//! # Design Decisions
//! - Representation is chosen when the payload is created and never switches
//! - Only length-delimited inbound bodies are supported
//! - Spill files are never deleted here; retention belongs to the handler

pub mod reader;
pub mod storage;
pub mod writer;

pub use reader::PayloadReader;
pub use storage::{Payload, PayloadError};
pub use writer::{PayloadWriter, TRANSFER_BLOCK_SIZE};
