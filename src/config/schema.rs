//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, shutdown grace).
    pub listener: ListenerConfig,

    /// Per-connection session limits.
    pub session: SessionConfig,

    /// Body storage policy used by the demo handler.
    pub payload: PayloadConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Demo route settings.
    pub demo: DemoConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// How long shutdown waits for live sessions, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            shutdown_grace_secs: 5,
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Largest accepted header section, in bytes.
    pub max_header_bytes: usize,

    /// Initial capacity of the per-connection read buffer.
    pub read_buffer_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_header_bytes: 16 * 1024,
            read_buffer_capacity: 8 * 1024,
        }
    }
}

/// Payload storage policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PayloadConfig {
    /// Request bodies declaring at least this many bytes are spilled to disk.
    pub spill_threshold: u64,

    /// Directory for spill files (platform temp dir when unset).
    pub spill_dir: Option<PathBuf>,

    /// Keep request spill files after the response is sent.
    pub retain_spilled: bool,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            spill_threshold: 4 * 1024,
            spill_dir: None,
            retain_spilled: false,
        }
    }
}

impl PayloadConfig {
    /// Effective spill directory.
    pub fn spill_dir(&self) -> PathBuf {
        self.spill_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Demo handler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of chunks streamed by `/timer`.
    pub timer_ticks: u32,

    /// Delay between `/timer` chunks in milliseconds.
    pub timer_interval_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            timer_ticks: 10,
            timer_interval_ms: 1000,
        }
    }
}
