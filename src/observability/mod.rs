//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Sessions, listener and handler produce:
//!     → logging.rs (structured log events keyed by connection_id)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! # Design Decisions
//! - Connection ID flows through every session log event
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
