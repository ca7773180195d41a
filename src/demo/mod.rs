//! Demo routes.
//!
//! - `/timer`: chunked stream of tick numbers, one per interval
//! - anything else: `404 Not Found` with an empty body
//!
//! Request bodies at or above the spill threshold are stored on disk.

pub mod handler;

pub use handler::DemoHandler;
