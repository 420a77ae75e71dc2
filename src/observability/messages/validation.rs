// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration and graph validation failures.

use crate::errors::ConfigError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Cyclic dependency detected among installed manifolds.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use manifold_engine::observability::messages::validation::CyclicDependencyDetected;
///
/// let cycle = vec!["a".to_string(), "b".to_string(), "a".to_string()];
/// let msg = CyclicDependencyDetected { cycle: &cycle };
///
/// tracing::error!("{}", msg);
/// ```
pub struct CyclicDependencyDetected<'a> {
    pub cycle: &'a [String],
}

impl Display for CyclicDependencyDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cyclic dependency detected: {}", self.cycle.join(" -> "))
    }
}

impl StructuredLog for CyclicDependencyDetected<'_> {
    fn log(&self) {
        tracing::error!(
            cycle = self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            cycle = self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
        )
    }
}

/// One problem found while validating an engine configuration.
///
/// # Log Level
/// `error!` - The configuration is rejected
pub struct ConfigInvalid<'a> {
    pub error: &'a ConfigError,
}

impl Display for ConfigInvalid<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Invalid engine configuration: {}", self.error)
    }
}

impl StructuredLog for ConfigInvalid<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(tracing::Level::ERROR, "span_name", name = name)
    }
}
