// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Organization
//!
//! * `engine` - engine lifecycle events
//! * `manifold` - events concerning a single manifold
//! * `validation` - configuration and graph validation failures
//!
//! # Usage Pattern
//!
//! ```rust
//! use manifold_engine::observability::messages::engine::EngineStopping;
//!
//! let msg = EngineStopping { manifold_count: 5 };
//!
//! tracing::info!("{}", msg);
//! ```

use tracing::Span;

pub mod engine;
pub mod manifold;
pub mod validation;

/// A message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emits the message at its designated level.
    fn log(&self);

    /// Opens a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
