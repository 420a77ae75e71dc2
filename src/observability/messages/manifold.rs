// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for events concerning a single manifold.
//!
//! This module contains message types for logging events related to:
//! * Installation and uninstallation
//! * Start attempts and their outcomes
//! * Stops, exits and scheduled restarts
//! * Changes to a running worker's published output

use crate::errors::WorkerError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A manifold was installed, possibly replacing an earlier definition.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use manifold_engine::observability::messages::manifold::ManifoldInstalled;
///
/// let inputs = vec!["agent".to_string()];
/// let msg = ManifoldInstalled {
///     name: "api-caller",
///     inputs: &inputs,
///     replacing: false,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ManifoldInstalled<'a> {
    pub name: &'a str,
    pub inputs: &'a [String],
    pub replacing: bool,
}

impl Display for ManifoldInstalled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let verb = if self.replacing { "Replacing" } else { "Installing" };
        if self.inputs.is_empty() {
            write!(f, "{} manifold '{}' with no inputs", verb, self.name)
        } else {
            write!(
                f,
                "{} manifold '{}' with inputs [{}]",
                verb,
                self.name,
                self.inputs.join(", ")
            )
        }
    }
}

impl StructuredLog for ManifoldInstalled<'_> {
    fn log(&self) {
        tracing::info!(
            manifold = self.name,
            inputs = ?self.inputs,
            replacing = self.replacing,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("manifold", span_name = name, manifold = self.name)
    }
}

/// A start attempt is being made.
///
/// # Log Level
/// `debug!` - Happens on every (re)start
pub struct ManifoldStarting<'a> {
    pub name: &'a str,
    pub attempt: u64,
}

impl Display for ManifoldStarting<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Starting manifold '{}' (attempt {})", self.name, self.attempt)
    }
}

impl StructuredLog for ManifoldStarting<'_> {
    fn log(&self) {
        tracing::debug!(manifold = self.name, attempt = self.attempt, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "manifold",
            span_name = name,
            manifold = self.name,
            attempt = self.attempt,
        )
    }
}

/// A worker started and its output was published.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ManifoldStarted<'a> {
    pub name: &'a str,
    pub version: u64,
}

impl Display for ManifoldStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Manifold '{}' started, output version {}", self.name, self.version)
    }
}

impl StructuredLog for ManifoldStarted<'_> {
    fn log(&self) {
        tracing::info!(manifold = self.name, version = self.version, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("manifold", span_name = name, manifold = self.name, version = self.version)
    }
}

/// The engine asked a manifold's worker to stop.
///
/// # Log Level
/// `debug!` - Routine during restarts and shutdown
pub struct ManifoldStopping<'a> {
    pub name: &'a str,
}

impl Display for ManifoldStopping<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stopping manifold '{}'", self.name)
    }
}

impl StructuredLog for ManifoldStopping<'_> {
    fn log(&self) {
        tracing::debug!(manifold = self.name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("manifold", span_name = name, manifold = self.name)
    }
}

/// A worker exited without being asked to.
///
/// # Log Level
/// `info!` on a clean exit or sentinel, `warn!` on a failure
pub struct ManifoldExited<'a> {
    pub name: &'a str,
    pub result: &'a Result<(), WorkerError>,
}

impl Display for ManifoldExited<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.result {
            Ok(()) => write!(f, "Manifold '{}' exited cleanly", self.name),
            Err(err) => write!(f, "Manifold '{}' exited: {}", self.name, err),
        }
    }
}

impl StructuredLog for ManifoldExited<'_> {
    fn log(&self) {
        match self.result {
            Err(err @ (WorkerError::Other(_) | WorkerError::Fatal(_))) => {
                tracing::warn!(manifold = self.name, error = %err, "{}", self)
            }
            _ => tracing::info!(manifold = self.name, "{}", self),
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "manifold",
            span_name = name,
            manifold = self.name,
            failed = self.result.is_err(),
        )
    }
}

/// A worker has joined and every dependent has stopped.
///
/// # Log Level
/// `debug!` - Routine during restarts and shutdown
pub struct ManifoldStopped<'a> {
    pub name: &'a str,
    /// Whether a published output was withdrawn as part of the stop.
    pub withdrawn: bool,
}

impl Display for ManifoldStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.withdrawn {
            write!(f, "Manifold '{}' stopped, output withdrawn", self.name)
        } else {
            write!(f, "Manifold '{}' stopped", self.name)
        }
    }
}

impl StructuredLog for ManifoldStopped<'_> {
    fn log(&self) {
        tracing::debug!(manifold = self.name, withdrawn = self.withdrawn, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("manifold", span_name = name, manifold = self.name)
    }
}

/// A manifold reported a missing dependency and waits for an input change.
///
/// # Log Level
/// `debug!` - Expected while inputs settle
pub struct ManifoldMissing<'a> {
    pub name: &'a str,
}

impl Display for ManifoldMissing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Manifold '{}' is missing a dependency; waiting for an input to change",
            self.name
        )
    }
}

impl StructuredLog for ManifoldMissing<'_> {
    fn log(&self) {
        tracing::debug!(manifold = self.name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("manifold", span_name = name, manifold = self.name)
    }
}

/// A manifold failed and will be retried after a backoff delay.
///
/// # Log Level
/// `warn!` - Potential issue or degraded behavior
///
/// # Example
/// ```
/// use manifold_engine::errors::WorkerError;
/// use manifold_engine::observability::messages::manifold::ManifoldFailed;
/// use std::time::Duration;
///
/// let error = WorkerError::msg("connection refused");
/// let msg = ManifoldFailed {
///     name: "api-caller",
///     error: &error,
///     failures: 3,
///     delay: Duration::from_secs(12),
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct ManifoldFailed<'a> {
    pub name: &'a str,
    pub error: &'a WorkerError,
    pub failures: u32,
    pub delay: Duration,
}

impl Display for ManifoldFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Manifold '{}' failed ({} consecutive): {}; restarting in {}ms",
            self.name,
            self.failures,
            self.error,
            self.delay.as_millis()
        )
    }
}

impl StructuredLog for ManifoldFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            manifold = self.name,
            error = %self.error,
            failures = self.failures,
            delay_ms = self.delay.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "manifold",
            span_name = name,
            manifold = self.name,
            failures = self.failures,
        )
    }
}

/// A restart was scheduled without backoff.
///
/// # Log Level
/// `debug!` - Routine
pub struct ManifoldRestartScheduled<'a> {
    pub name: &'a str,
    pub reason: &'a str,
    pub delay: Duration,
}

impl Display for ManifoldRestartScheduled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Manifold '{}' {}; restarting in {}ms",
            self.name,
            self.reason,
            self.delay.as_millis()
        )
    }
}

impl StructuredLog for ManifoldRestartScheduled<'_> {
    fn log(&self) {
        tracing::debug!(
            manifold = self.name,
            reason = self.reason,
            delay_ms = self.delay.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("manifold", span_name = name, manifold = self.name)
    }
}

/// A manifold was permanently removed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ManifoldUninstalled<'a> {
    pub name: &'a str,
}

impl Display for ManifoldUninstalled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Manifold '{}' uninstalled", self.name)
    }
}

impl StructuredLog for ManifoldUninstalled<'_> {
    fn log(&self) {
        tracing::info!(manifold = self.name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("manifold", span_name = name, manifold = self.name)
    }
}

/// A running worker's output changed and was published at a new version.
///
/// # Log Level
/// `info!` - Dependents are about to restart
pub struct OutputRepublished<'a> {
    pub name: &'a str,
    pub version: u64,
}

impl Display for OutputRepublished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Manifold '{}' output changed, republished as version {}",
            self.name, self.version
        )
    }
}

impl StructuredLog for OutputRepublished<'_> {
    fn log(&self) {
        tracing::info!(manifold = self.name, version = self.version, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("manifold", span_name = name, manifold = self.name, version = self.version)
    }
}

/// A change notification arrived but the output's fingerprint is unchanged.
///
/// # Log Level
/// `debug!` - Nothing to do
pub struct OutputUnchanged<'a> {
    pub name: &'a str,
}

impl Display for OutputUnchanged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Manifold '{}' output unchanged, dependents left running", self.name)
    }
}

impl StructuredLog for OutputUnchanged<'_> {
    fn log(&self) {
        tracing::debug!(manifold = self.name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("manifold", span_name = name, manifold = self.name)
    }
}

/// A start attempt finished after the engine had moved on; its worker is
/// killed and never published.
///
/// # Log Level
/// `debug!` - Routine after restarts
pub struct StaleStartDiscarded<'a> {
    pub name: &'a str,
}

impl Display for StaleStartDiscarded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Discarding worker from superseded start of manifold '{}'", self.name)
    }
}

impl StructuredLog for StaleStartDiscarded<'_> {
    fn log(&self) {
        tracing::debug!(manifold = self.name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("manifold", span_name = name, manifold = self.name)
    }
}
