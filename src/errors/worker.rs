// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Terminal outcomes of a start function or a running worker.

use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;

/// The error half of a start or worker result.
///
/// The first three variants are sentinels the engine classifies specially;
/// `Other` is the generic failure that is filtered, logged and retried with
/// backoff. `Fatal` aborts the whole engine. A clean stop is `Ok(())` and has
/// no variant here.
///
/// The type is `Clone` because a worker's outcome is handed to every waiter.
#[derive(Debug, Clone, Error)]
pub enum WorkerError {
    /// A declared input is not available yet. The manifold waits for the next
    /// change in one of its inputs and is not retried on a timer.
    #[error("dependency not available")]
    Missing,

    /// Restart immediately, without backoff.
    #[error("restart immediately")]
    Bounce,

    /// Nothing further to supervise; remove the manifold permanently.
    #[error("resource permanently unavailable")]
    Uninstall,

    /// Unrecoverable failure; the engine shuts down and reports this error.
    #[error("fatal: {0}")]
    Fatal(Arc<anyhow::Error>),

    #[error("{0}")]
    Other(Arc<anyhow::Error>),
}

impl WorkerError {
    /// Wraps any error as a generic, retryable failure.
    pub fn other(err: impl Into<anyhow::Error>) -> Self {
        WorkerError::Other(Arc::new(err.into()))
    }

    /// Builds a generic failure from a message.
    pub fn msg<M>(message: M) -> Self
    where
        M: Display + std::fmt::Debug + Send + Sync + 'static,
    {
        WorkerError::Other(Arc::new(anyhow::Error::msg(message)))
    }

    pub fn fatal(err: impl Into<anyhow::Error>) -> Self {
        WorkerError::Fatal(Arc::new(err.into()))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, WorkerError::Missing)
    }

    pub fn is_bounce(&self) -> bool {
        matches!(self, WorkerError::Bounce)
    }

    pub fn is_uninstall(&self) -> bool {
        matches!(self, WorkerError::Uninstall)
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, WorkerError::Fatal(_))
    }
}

impl From<anyhow::Error> for WorkerError {
    fn from(err: anyhow::Error) -> Self {
        WorkerError::Other(Arc::new(err))
    }
}
