// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ConfigError;
use thiserror::Error;

/// Errors returned by the engine's public control operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The engine is shutting down (or already stopped) and accepts no changes.
    #[error("engine is shutting down")]
    Dying,

    #[error("manifold \"{0}\" cannot depend on itself")]
    SelfDependency(String),

    /// Installing the manifold would close a dependency cycle.
    #[error("dependency cycle detected: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("manifold \"{0}\" is not installed")]
    NotInstalled(String),

    #[error("invalid engine configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ConfigError>),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
