// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::engine::Manifold;
use crate::errors::WorkerError;
use crate::traits::Worker;

/// Lifecycle of one manifold inside the engine.
///
/// `Stopped → Starting → Started → Stopping → Stopped` is the normal cycle;
/// `Uninstalled` is terminal until the name is installed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Stopped,
    Starting,
    Started,
    Stopping,
    Uninstalled,
}

impl Lifecycle {
    /// True while a start attempt or a worker is still outstanding.
    pub fn is_active(self) -> bool {
        matches!(self, Lifecycle::Starting | Lifecycle::Started | Lifecycle::Stopping)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Stopped => "stopped",
            Lifecycle::Starting => "starting",
            Lifecycle::Started => "started",
            Lifecycle::Stopping => "stopping",
            Lifecycle::Uninstalled => "uninstalled",
        };
        f.write_str(name)
    }
}

/// Runtime state the engine keeps for each installed manifold.
///
/// `worker` is `Some` exactly while the lifecycle is `Started` or `Stopping`.
/// A `Stopping` node keeps its worker (and its published output) until the
/// worker has joined *and* every dependent has stopped.
pub(crate) struct Node {
    pub manifold: Manifold,
    pub lifecycle: Lifecycle,
    pub worker: Option<Arc<dyn Worker>>,
    /// Identifies the current start attempt; bumped on every attempt and
    /// whenever pending timers must be invalidated.
    pub ticket: u64,
    /// Cancellation handed to the current start attempt's context.
    pub abort: Option<CancellationToken>,
    /// Input versions the current worker was started against.
    pub input_versions: BTreeMap<String, u64>,
    /// The worker's outcome once `wait` has returned.
    pub joined: Option<Result<(), WorkerError>>,
    /// The engine, not the worker, asked for the current stop.
    pub stop_requested: bool,
    /// Last start returned the missing sentinel; only an input change retries it.
    pub awaiting_change: bool,
    /// A delayed restart is scheduled.
    pub retry_pending: bool,
    /// Manifold to swap in once the current occupant has stopped.
    pub replacement: Option<Manifold>,
    /// Remove the manifold once it has stopped.
    pub remove_when_stopped: bool,
    pub failures: u32,
    pub start_count: u64,
    pub last_error: Option<String>,
}

impl Node {
    pub fn new(manifold: Manifold) -> Self {
        Self {
            manifold,
            lifecycle: Lifecycle::Stopped,
            worker: None,
            ticket: 0,
            abort: None,
            input_versions: BTreeMap::new(),
            joined: None,
            stop_requested: false,
            awaiting_change: false,
            retry_pending: false,
            replacement: None,
            remove_when_stopped: false,
            failures: 0,
            start_count: 0,
            last_error: None,
        }
    }

    /// Replaces the manifold of a node that has nothing outstanding.
    pub fn reset(&mut self, manifold: Manifold) {
        self.manifold = manifold;
        self.lifecycle = Lifecycle::Stopped;
        self.ticket += 1;
        self.input_versions.clear();
        self.stop_requested = false;
        self.awaiting_change = false;
        self.retry_pending = false;
        self.replacement = None;
        self.remove_when_stopped = false;
        self.failures = 0;
        self.last_error = None;
    }

    /// Drops any scheduled restart and the missing-dependency wait.
    pub fn clear_waits(&mut self) {
        if self.retry_pending {
            self.retry_pending = false;
            self.ticket += 1;
        }
        self.awaiting_change = false;
    }
}
