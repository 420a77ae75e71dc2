// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::WorkerError;
use crate::traits::Worker;
use crate::workers::TaskWorker;

/// A worker that does nothing until it is killed.
///
/// Useful as a placeholder resource and for driving engine scenarios:
/// [`StubWorker::fail`] makes it exit with a chosen outcome.
pub struct StubWorker {
    label: String,
    task: TaskWorker,
}

impl StubWorker {
    pub fn new(label: impl Into<String>) -> Arc<Self> {
        let task = TaskWorker::spawn(|tomb| async move {
            tomb.dying().await;
            Ok(())
        });
        Arc::new(Self {
            label: label.into(),
            task,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Stops the worker with `err` as its outcome.
    pub fn fail(&self, err: WorkerError) {
        self.task.tomb().kill(Some(err));
    }

    pub fn is_dying(&self) -> bool {
        self.task.tomb().is_dying()
    }
}

#[async_trait]
impl Worker for StubWorker {
    fn kill(&self) {
        self.task.kill();
    }

    async fn wait(&self) -> Result<(), WorkerError> {
        self.task.wait().await
    }
}
