// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;

use crate::config::EngineConfig;

/// Delay before restarting a manifold after `failures` consecutive generic
/// failures: `error_delay * backoff_factor^(failures - 1)`, capped at
/// `max_error_delay`.
pub fn error_delay(config: &EngineConfig, failures: u32) -> Duration {
    let exponent = failures.saturating_sub(1).min(64) as i32;
    let scaled = config.error_delay_ms as f64 * config.backoff_factor.powi(exponent);
    let capped = scaled.min(config.max_error_delay_ms as f64);
    Duration::from_millis(capped as u64)
}

pub fn bounce_delay(config: &EngineConfig) -> Duration {
    Duration::from_millis(config.bounce_delay_ms)
}
