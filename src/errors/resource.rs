// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised when a manifold reads one of its inputs.

use crate::errors::WorkerError;
use thiserror::Error;

/// An output projector could not satisfy the requested shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}; got {actual}")]
pub struct OutputMismatch {
    pub expected: String,
    pub actual: String,
}

impl OutputMismatch {
    pub fn new(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Failure of `Context::get`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// The name is not one of the reading manifold's declared inputs.
    #[error("\"{name}\" is not declared as an input of \"{owner}\"")]
    Undeclared { owner: String, name: String },

    /// The input is declared but has no published output right now.
    #[error("\"{name}\" is not available")]
    Missing { name: String },

    /// The producing manifold publishes no output at all.
    #[error("\"{name}\" does not expose an output")]
    NoOutput { name: String },

    #[error("cannot read \"{name}\": {source}")]
    TypeMismatch {
        name: String,
        #[source]
        source: OutputMismatch,
    },
}

impl From<ResourceError> for WorkerError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::Missing { .. } => WorkerError::Missing,
            other => WorkerError::other(other),
        }
    }
}
