// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::future::Future;

use crate::errors::WorkerError;
use crate::traits::Worker;
use crate::workers::Tomb;

/// A worker whose body runs on its own tokio task under a [`Tomb`].
///
/// The body receives the tomb and is expected to return once the tomb starts
/// dying. A panicking body is reported as a generic failure.
pub struct TaskWorker {
    tomb: Tomb,
}

impl TaskWorker {
    pub fn spawn<F, Fut>(body: F) -> Self
    where
        F: FnOnce(Tomb) -> Fut,
        Fut: Future<Output = Result<(), WorkerError>> + Send + 'static,
    {
        let tomb = Tomb::new();
        let work = body(tomb.clone());
        let finisher = tomb.clone();
        tokio::spawn(async move {
            let result = match tokio::spawn(work).await {
                Ok(result) => result,
                Err(join_error) => Err(WorkerError::msg(format!(
                    "worker task failed: {}",
                    join_error
                ))),
            };
            finisher.finish(result);
        });
        Self { tomb }
    }

    pub fn tomb(&self) -> &Tomb {
        &self.tomb
    }
}

#[async_trait]
impl Worker for TaskWorker {
    fn kill(&self) {
        self.tomb.kill(None);
    }

    async fn wait(&self) -> Result<(), WorkerError> {
        self.tomb.wait().await
    }
}
