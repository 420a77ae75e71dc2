// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Boolean flag workers and the helpers that let manifolds depend on them.
//!
//! A flag is a worker whose only job is to expose a boolean. The value is
//! fixed for the life of the worker instance; when the underlying condition
//! changes the flag worker is replaced, which in turn restarts everything that
//! read it.

mod condition;
mod housing;
mod static_flag;

use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

use crate::engine::{Context, Manifold};
use crate::errors::{OutputMismatch, WorkerError};
use crate::traits::{worker_type, Worker};

pub use crate::traits::Flag;
pub use condition::ConditionFlagWorker;
pub use static_flag::StaticFlagWorker;

/// Output projector for flag workers.
///
/// Writes the worker's [`Flag`] capability into an `Option<Arc<dyn Flag>>`
/// destination, so readers call `ctx.get::<Arc<dyn Flag>>(name)`.
pub fn flag_output(worker: &Arc<dyn Worker>, out: &mut dyn Any) -> Result<(), OutputMismatch> {
    let flag = Arc::clone(worker)
        .as_flag()
        .ok_or_else(|| OutputMismatch::new("a worker implementing Flag", worker_type(worker)))?;
    let slot = out
        .downcast_mut::<Option<Arc<dyn Flag>>>()
        .ok_or_else(|| OutputMismatch::new("an Arc<dyn Flag> destination", "another type"))?;
    *slot = Some(flag);
    Ok(())
}

/// Fingerprint of a flag worker: its current value.
pub fn flag_fingerprint(worker: &Arc<dyn Worker>) -> Option<Value> {
    Arc::clone(worker).as_flag().map(|flag| Value::Bool(flag.check()))
}

/// Builds a manifold whose worker is a [`StaticFlagWorker`] holding the value
/// `check` computes from the manifold's inputs.
///
/// # Example
/// ```
/// use manifold_engine::flag::flag_manifold;
///
/// let is_controller = flag_manifold(["agent"], |ctx| {
///     let tag: String = ctx.get("agent")?;
///     Ok(tag.starts_with("controller"))
/// });
/// assert_eq!(is_controller.inputs, vec!["agent"]);
/// ```
pub fn flag_manifold<I, S, F>(inputs: I, check: F) -> Manifold
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    F: Fn(&Context) -> Result<bool, WorkerError> + Send + Sync + 'static,
{
    let check = Arc::new(check);
    Manifold::new(inputs, move |ctx: Context| {
        let check = Arc::clone(&check);
        async move {
            let value = check(&ctx)?;
            Ok(StaticFlagWorker::new(value) as Arc<dyn Worker>)
        }
    })
    .with_output(Arc::new(flag_output))
    .with_fingerprint(flag_fingerprint)
}
