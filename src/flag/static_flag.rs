// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::WorkerError;
use crate::traits::{Flag, Worker};
use crate::workers::TaskWorker;

/// A flag whose value never changes; it idles until killed.
pub struct StaticFlagWorker {
    value: bool,
    task: TaskWorker,
}

impl StaticFlagWorker {
    pub fn new(value: bool) -> Arc<Self> {
        let task = TaskWorker::spawn(|tomb| async move {
            tomb.dying().await;
            Ok(())
        });
        Arc::new(Self { value, task })
    }
}

impl Flag for StaticFlagWorker {
    fn check(&self) -> bool {
        self.value
    }
}

#[async_trait]
impl Worker for StaticFlagWorker {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_value_is_fixed_and_kill_is_clean() {
        let flag = StaticFlagWorker::new(false);
        assert!(!flag.check());

        flag.kill();
        flag.kill();
        assert!(flag.wait().await.is_ok());
        assert!(!flag.check());
    }

    #[tokio::test]
    async fn test_capability_survives_type_erasure() {
        let worker: Arc<dyn Worker> = StaticFlagWorker::new(true);
        let flag = Arc::clone(&worker).as_flag().expect("flag capability");
        assert!(flag.check());
        worker.kill();
    }
}
