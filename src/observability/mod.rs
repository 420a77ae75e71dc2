// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic the engine emits is a message struct with a `Display`
//! implementation and a [`messages::StructuredLog`] implementation, so log
//! text never appears as a string literal at the call site and every event
//! carries its fields as structured `tracing` values.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - engine lifecycle, fatal errors and rejected installs
//! * `messages::manifold` - per-manifold start, stop, restart and output events
//! * `messages::validation` - configuration and graph validation failures
//!
//! # Usage
//!
//! ```rust
//! use manifold_engine::observability::messages::manifold::ManifoldStarted;
//! use manifold_engine::observability::messages::StructuredLog;
//!
//! ManifoldStarted { name: "agent", version: 1 }.log();
//! ```
//!
//! Installing a subscriber is the binary's job; see `init_tracing`.

pub mod messages;

use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber filtered by `RUST_LOG`, defaulting to
/// `info`. Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
