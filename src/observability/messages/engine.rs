// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for engine lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Engine startup and its effective configuration
//! * Ordered shutdown
//! * Fatal manifold errors that bring the engine down
//! * Install requests the engine refuses

use crate::config::EngineConfig;
use crate::errors::{EngineError, WorkerError};
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Engine started with the given configuration.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use manifold_engine::config::EngineConfig;
/// use manifold_engine::observability::messages::engine::EngineStarted;
///
/// let config = EngineConfig::default();
/// let msg = EngineStarted { config: &config };
///
/// tracing::info!("{}", msg);
/// ```
pub struct EngineStarted<'a> {
    pub config: &'a EngineConfig,
}

impl Display for EngineStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dependency engine started: error_delay={}ms, max_error_delay={}ms, backoff_factor={}, bounce_delay={}ms",
            self.config.error_delay_ms,
            self.config.max_error_delay_ms,
            self.config.backoff_factor,
            self.config.bounce_delay_ms
        )
    }
}

impl StructuredLog for EngineStarted<'_> {
    fn log(&self) {
        tracing::info!(
            error_delay_ms = self.config.error_delay_ms,
            max_error_delay_ms = self.config.max_error_delay_ms,
            backoff_factor = self.config.backoff_factor,
            bounce_delay_ms = self.config.bounce_delay_ms,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "engine",
            span_name = name,
            error_delay_ms = self.config.error_delay_ms,
            max_error_delay_ms = self.config.max_error_delay_ms,
        )
    }
}

/// Shutdown began; manifolds will be stopped dependents-first.
///
/// # Log Level
/// `info!` - Important operational event
pub struct EngineStopping {
    pub manifold_count: usize,
}

impl Display for EngineStopping {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dependency engine stopping: {} manifolds to shut down",
            self.manifold_count
        )
    }
}

impl StructuredLog for EngineStopping {
    fn log(&self) {
        tracing::info!(manifold_count = self.manifold_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("engine", span_name = name, manifold_count = self.manifold_count)
    }
}

/// Every manifold has stopped and the engine's task is finishing.
///
/// # Log Level
/// `info!` on a clean stop, `error!` when a fatal error ended the engine
pub struct EngineStopped<'a> {
    pub fatal: Option<&'a WorkerError>,
}

impl Display for EngineStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.fatal {
            Some(err) => write!(f, "Dependency engine stopped after fatal error: {}", err),
            None => write!(f, "Dependency engine stopped"),
        }
    }
}

impl StructuredLog for EngineStopped<'_> {
    fn log(&self) {
        match self.fatal {
            Some(err) => tracing::error!(error = %err, "{}", self),
            None => tracing::info!("{}", self),
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("engine", span_name = name, fatal = self.fatal.is_some())
    }
}

/// A manifold returned a fatal error; the whole engine is shutting down.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use manifold_engine::errors::WorkerError;
/// use manifold_engine::observability::messages::engine::EngineFatal;
///
/// let error = WorkerError::fatal(anyhow::anyhow!("agent config corrupted"));
/// let msg = EngineFatal { manifold: "agent", error: &error };
///
/// tracing::error!("{}", msg);
/// ```
pub struct EngineFatal<'a> {
    pub manifold: &'a str,
    pub error: &'a WorkerError,
}

impl Display for EngineFatal<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Manifold '{}' failed fatally, stopping engine: {}",
            self.manifold, self.error
        )
    }
}

impl StructuredLog for EngineFatal<'_> {
    fn log(&self) {
        tracing::error!(manifold = self.manifold, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("engine", span_name = name, manifold = self.manifold)
    }
}

/// An install request was refused.
///
/// # Log Level
/// `warn!` - The caller gets the error; the engine keeps running
pub struct InstallRejected<'a> {
    pub manifold: &'a str,
    pub reason: &'a EngineError,
}

impl Display for InstallRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Refusing to install manifold '{}': {}", self.manifold, self.reason)
    }
}

impl StructuredLog for InstallRejected<'_> {
    fn log(&self) {
        tracing::warn!(manifold = self.manifold, reason = %self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("install", span_name = name, manifold = self.manifold)
    }
}
