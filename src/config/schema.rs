//! Configuration schema definitions.
//!
//! This module defines the configuration structure for the service and its
//! logger. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::observability::Severity;

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Logger configuration.
    pub logging: LoggingConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Logger configuration. Immutable once handed to the logger.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Human-readable console output instead of JSON lines.
    pub pretty: bool,

    /// Record the source location of every logging call.
    pub debug: bool,

    /// Minimum severity written by every sink (debug, info, warning, error, fatal, panic).
    pub level: Severity,

    /// Rotating file output.
    pub file: FileLogConfig,
}

/// File sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FileLogConfig {
    /// Enable the file sink.
    pub enabled: bool,

    /// Path of the active log file.
    pub path: String,

    /// Size in megabytes at which the file is rotated (0 = 100).
    pub max_size_mb: u64,

    /// Rotated files to keep (0 = keep all).
    pub max_backups: usize,
}

impl Default for FileLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "logs/service.log".to_string(),
            max_size_mb: 100,
            max_backups: 0,
        }
    }
}
