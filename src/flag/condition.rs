// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

use crate::errors::WorkerError;
use crate::traits::{Flag, Worker};
use crate::workers::TaskWorker;

/// A flag that mirrors an external boolean condition.
///
/// The value is sampled once, at construction. When the watched condition
/// later differs from it, the worker exits with [`WorkerError::Bounce`] so
/// the engine starts a fresh instance, republishing the new value and
/// restarting every reader. If the sender goes away the worker keeps its
/// value until killed.
pub struct ConditionFlagWorker {
    value: bool,
    task: TaskWorker,
}

impl ConditionFlagWorker {
    pub fn new(mut condition: watch::Receiver<bool>) -> Arc<Self> {
        let value = *condition.borrow_and_update();
        let task = TaskWorker::spawn(move |tomb| async move {
            loop {
                tokio::select! {
                    _ = tomb.dying() => return Ok(()),
                    changed = condition.changed() => {
                        if changed.is_err() {
                            tomb.dying().await;
                            return Ok(());
                        }
                        if *condition.borrow_and_update() != value {
                            return Err(WorkerError::Bounce);
                        }
                    }
                }
            }
        });
        Arc::new(Self { value, task })
    }
}

impl Flag for ConditionFlagWorker {
    fn check(&self) -> bool {
        self.value
    }
}

#[async_trait]
impl Worker for ConditionFlagWorker {
    fn kill(&self) {
        self.task.kill();
    }

    async fn wait(&self) -> Result<(), WorkerError> {
        self.task.wait().await
    }

    fn as_flag(self: Arc<Self>) -> Option<Arc<dyn Flag>> {
        Some(self)
    }
}
