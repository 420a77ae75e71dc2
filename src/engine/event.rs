// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use tokio::sync::oneshot;

use crate::engine::{EngineReport, Manifold};
use crate::errors::{EngineError, WorkerError};
use crate::traits::Worker;

/// Everything the coordinating task reacts to, fanned in on one channel.
///
/// `ticket` identifies a single start attempt of a manifold; events carrying
/// a ticket that no longer matches the manifold's current attempt are stale
/// and ignored.
pub(crate) enum Event {
    Install {
        name: String,
        manifold: Manifold,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Uninstall {
        name: String,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Report {
        reply: oneshot::Sender<EngineReport>,
    },
    /// A start function returned.
    Started {
        name: String,
        ticket: u64,
        result: Result<Arc<dyn Worker>, WorkerError>,
    },
    /// A worker's `wait` returned.
    Exited {
        name: String,
        ticket: u64,
        result: Result<(), WorkerError>,
    },
    /// A running worker says its exposed value may have changed.
    OutputChanged { name: String, ticket: u64 },
    /// A delayed restart is due.
    Retry { name: String, ticket: u64 },
}
