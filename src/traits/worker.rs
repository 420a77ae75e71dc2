// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

use crate::errors::WorkerError;
use crate::traits::Flag;

/// Checked-cast support for worker trait objects.
///
/// Implemented for every `Send + Sync + 'static` type, so worker authors never
/// write it by hand. It is what lets an output projector turn an
/// `Arc<dyn Worker>` back into the concrete worker type it knows about.
pub trait AsAny: Any + Send + Sync {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Concrete type name, used in mismatch errors.
    fn worker_type(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn worker_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A long-running task supervised by the engine.
///
/// `kill` asks the task to stop and must be idempotent and non-blocking.
/// `wait` blocks until the task has stopped and returns its terminal outcome;
/// every caller of `wait` observes the same outcome. A task must eventually
/// finish after `kill` has been called.
#[async_trait]
pub trait Worker: AsAny {
    fn kill(&self);

    async fn wait(&self) -> Result<(), WorkerError>;

    /// Exposes the worker as a [`Flag`] if it carries that capability.
    fn as_flag(self: Arc<Self>) -> Option<Arc<dyn Flag>> {
        None
    }
}

/// Recovers the concrete worker type behind a trait object.
pub fn downcast_worker<W: Worker>(worker: &Arc<dyn Worker>) -> Option<Arc<W>> {
    AsAny::into_any(Arc::clone(worker)).downcast::<W>().ok()
}

/// Type name of the worker behind a trait object.
pub fn worker_type(worker: &Arc<dyn Worker>) -> &'static str {
    AsAny::worker_type(worker.as_ref())
}
