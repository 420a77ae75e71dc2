// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Validation of the engine's restart policy.
//!
//! Every check runs and every failure is collected, so a caller fixing a
//! configuration sees all of its problems at once. Graph-level checks (self
//! dependencies and cycles) happen at install time in the engine, since the
//! manifold graph is built in code.

use crate::config::consts::MIN_BACKOFF_FACTOR;
use crate::config::EngineConfig;
use crate::errors::ConfigError;
use crate::observability::messages::validation::ConfigInvalid;
use crate::observability::messages::StructuredLog;

/// Validates an engine configuration.
///
/// # Returns
/// * `Ok(())` if the configuration is usable
/// * `Err(Vec<ConfigError>)` listing every problem found
///
/// # Example
/// ```
/// use manifold_engine::config::{validate_config, EngineConfig};
/// use manifold_engine::errors::ConfigError;
///
/// let config = EngineConfig { error_delay_ms: 0, ..EngineConfig::default() };
/// let errors = validate_config(&config).unwrap_err();
/// assert_eq!(errors, vec![ConfigError::ZeroErrorDelay]);
/// ```
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.error_delay_ms == 0 {
        errors.push(ConfigError::ZeroErrorDelay);
    }
    if config.max_error_delay_ms < config.error_delay_ms {
        errors.push(ConfigError::DelayOrdering {
            error_delay_ms: config.error_delay_ms,
            max_error_delay_ms: config.max_error_delay_ms,
        });
    }
    if !config.backoff_factor.is_finite() || config.backoff_factor < MIN_BACKOFF_FACTOR {
        errors.push(ConfigError::InvalidBackoffFactor {
            factor: config.backoff_factor,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        for error in &errors {
            ConfigInvalid { error }.log();
        }
        Err(errors)
    }
}
