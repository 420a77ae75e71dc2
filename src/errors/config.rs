// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Errors that can occur while loading or validating an engine configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The configuration file could not be read
    Unreadable {
        /// Path that was being read
        path: String,
        /// Underlying I/O failure
        reason: String,
    },
    /// The configuration file could not be parsed
    Malformed {
        /// Path that was being parsed
        path: String,
        /// Parser message
        reason: String,
    },
    /// A zero base error delay would turn every failure into a hot restart loop
    ZeroErrorDelay,
    /// The backoff cap is lower than the base delay
    DelayOrdering {
        error_delay_ms: u64,
        max_error_delay_ms: u64,
    },
    /// The backoff factor must be a finite number no smaller than 1.0
    InvalidBackoffFactor {
        factor: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Unreadable { path, reason } => {
                write!(f, "Failed to read config file '{}': {}", path, reason)
            }
            ConfigError::Malformed { path, reason } => {
                write!(f, "Failed to parse config file '{}': {}", path, reason)
            }
            ConfigError::ZeroErrorDelay => {
                write!(f, "error_delay_ms must be greater than zero")
            }
            ConfigError::DelayOrdering {
                error_delay_ms,
                max_error_delay_ms,
            } => {
                write!(
                    f,
                    "max_error_delay_ms ({}) must not be smaller than error_delay_ms ({})",
                    max_error_delay_ms, error_delay_ms
                )
            }
            ConfigError::InvalidBackoffFactor { factor } => {
                write!(
                    f,
                    "backoff_factor must be a finite number >= 1.0, got {}",
                    factor
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
