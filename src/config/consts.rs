// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default base delay before restarting a manifold after a generic failure
pub const DEFAULT_ERROR_DELAY_MS: u64 = 3_000;
/// Default cap for the exponential restart backoff (one minute)
pub const DEFAULT_MAX_ERROR_DELAY_MS: u64 = 60_000;
/// Default multiplier applied per consecutive failure
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;
/// Default delay before restarting after a bounce or a clean unrequested exit
pub const DEFAULT_BOUNCE_DELAY_MS: u64 = 0;
/// Smallest backoff factor that never shrinks the delay
pub const MIN_BACKOFF_FACTOR: f64 = 1.0;
