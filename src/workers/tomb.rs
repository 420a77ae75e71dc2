// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::errors::WorkerError;

/// Cooperative cancellation for one task.
///
/// A tomb is *dying* once `kill` has been called and *dead* once `done` has
/// been called. The first error passed to `kill` becomes the task's outcome;
/// later ones are dropped. `wait` resolves once the tomb is dead.
#[derive(Clone)]
pub struct Tomb {
    inner: Arc<TombInner>,
}

struct TombInner {
    dying: CancellationToken,
    reason: Mutex<Option<WorkerError>>,
    dead: watch::Sender<Option<Result<(), WorkerError>>>,
}

impl Tomb {
    pub fn new() -> Self {
        let (dead, _) = watch::channel(None);
        Self {
            inner: Arc::new(TombInner {
                dying: CancellationToken::new(),
                reason: Mutex::new(None),
                dead,
            }),
        }
    }

    /// Puts the tomb into the dying state, recording `reason` if it is the
    /// first error seen. Safe to call any number of times.
    pub fn kill(&self, reason: Option<WorkerError>) {
        if let Some(err) = reason {
            let mut slot = self.inner.reason.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(err);
            }
        }
        self.inner.dying.cancel();
    }

    /// Resolves once the tomb starts dying.
    pub fn dying(&self) -> WaitForCancellationFuture<'_> {
        self.inner.dying.cancelled()
    }

    pub fn is_dying(&self) -> bool {
        self.inner.dying.is_cancelled()
    }

    /// Records the body's own result and marks the tomb dead.
    pub fn finish(&self, result: Result<(), WorkerError>) {
        self.kill(result.err());
        self.done();
    }

    /// Marks the tomb dead. Its outcome is the recorded reason, or a clean
    /// stop when there is none.
    pub fn done(&self) {
        self.inner.dying.cancel();
        let reason = self
            .inner
            .reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        self.inner.dead.send_if_modified(|outcome| {
            if outcome.is_some() {
                return false;
            }
            *outcome = Some(reason.map_or(Ok(()), Err));
            true
        });
    }

    pub fn is_dead(&self) -> bool {
        self.inner.dead.borrow().is_some()
    }

    /// Blocks until the tomb is dead and returns its outcome.
    pub async fn wait(&self) -> Result<(), WorkerError> {
        let mut dead = self.inner.dead.subscribe();
        let outcome = match dead.wait_for(Option::is_some).await {
            Ok(outcome) => Option::clone(&outcome).unwrap_or(Ok(())),
            // The sender lives as long as `self`, so this cannot happen.
            Err(_) => Ok(()),
        };
        outcome
    }
}

impl Default for Tomb {
    fn default() -> Self {
        Self::new()
    }
}
