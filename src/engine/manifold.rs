// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Declarative description of one node in the dependency graph.

use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::engine::Context;
use crate::errors::{OutputMismatch, WorkerError};
use crate::traits::{downcast_worker, worker_type, Worker};

pub type StartFuture = Pin<Box<dyn Future<Output = Result<Arc<dyn Worker>, WorkerError>> + Send>>;

/// Builds a worker from the manifold's context.
pub type StartFunc = Arc<dyn Fn(Context) -> StartFuture + Send + Sync>;

/// Writes the value a running worker exposes into a caller-supplied slot.
///
/// The slot is an `&mut Option<T>` seen through `dyn Any`; the projector checks
/// both the worker and the slot type and fails without writing anything when
/// either does not match.
pub type OutputFunc =
    Arc<dyn Fn(&Arc<dyn Worker>, &mut dyn Any) -> Result<(), OutputMismatch> + Send + Sync>;

/// Rewrites a start or worker error before the engine classifies it.
pub type FilterFunc = Arc<dyn Fn(WorkerError) -> WorkerError + Send + Sync>;

/// Comparable snapshot of a worker's exposed value. Two equal fingerprints
/// mean the value did not change and dependents need not restart.
pub type FingerprintFunc = Arc<dyn Fn(&Arc<dyn Worker>) -> Option<serde_json::Value> + Send + Sync>;

/// A node in the dependency graph: the names it depends on, how to start its
/// worker, and how that worker's output is exposed to dependents.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use manifold_engine::engine::Manifold;
/// use manifold_engine::traits::Worker;
/// use manifold_engine::workers::StubWorker;
///
/// let manifold = Manifold::new(["agent", "agent", "api-caller"], |_ctx| async move {
///     Ok(StubWorker::new("log-sender") as Arc<dyn Worker>)
/// });
/// assert_eq!(manifold.inputs, vec!["agent", "api-caller"]);
/// ```
#[derive(Clone)]
pub struct Manifold {
    /// Names of the manifolds whose outputs must be published before this one
    /// can start. Duplicates are dropped; order is kept for iteration.
    pub inputs: Vec<String>,
    pub start: StartFunc,
    pub output: Option<OutputFunc>,
    pub filter: Option<FilterFunc>,
    pub fingerprint: Option<FingerprintFunc>,
}

impl Manifold {
    pub fn new<I, S, F, Fut>(inputs: I, start: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn Worker>, WorkerError>> + Send + 'static,
    {
        let mut names: Vec<String> = Vec::new();
        for input in inputs {
            let input = input.into();
            if !names.contains(&input) {
                names.push(input);
            }
        }
        Self {
            inputs: names,
            start: Arc::new(move |ctx: Context| -> StartFuture { Box::pin(start(ctx)) }),
            output: None,
            filter: None,
            fingerprint: None,
        }
    }

    /// Sets the projector dependents read this manifold's worker through;
    /// usually built with [`output_of`].
    pub fn with_output(mut self, output: OutputFunc) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(WorkerError) -> WorkerError + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn with_fingerprint<F>(mut self, fingerprint: F) -> Self
    where
        F: Fn(&Arc<dyn Worker>) -> Option<serde_json::Value> + Send + Sync + 'static,
    {
        self.fingerprint = Some(Arc::new(fingerprint));
        self
    }

    pub fn depends_on(&self, name: &str) -> bool {
        self.inputs.iter().any(|input| input == name)
    }
}

impl fmt::Debug for Manifold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manifold")
            .field("inputs", &self.inputs)
            .field("has_output", &self.output.is_some())
            .field("has_filter", &self.filter.is_some())
            .field("has_fingerprint", &self.fingerprint.is_some())
            .finish()
    }
}

/// Builds an output projector for workers of concrete type `W` exposing a `T`.
///
/// The projector fails when the running worker is not a `W` or when the
/// destination is not an `Option<T>`.
pub fn output_of<W, T, P>(project: P) -> OutputFunc
where
    W: Worker,
    T: 'static,
    P: Fn(&Arc<W>) -> T + Send + Sync + 'static,
{
    Arc::new(move |worker: &Arc<dyn Worker>, out: &mut dyn Any| -> Result<(), OutputMismatch> {
        let concrete = downcast_worker::<W>(worker)
            .ok_or_else(|| OutputMismatch::new(type_name::<W>(), worker_type(worker)))?;
        let slot = out.downcast_mut::<Option<T>>().ok_or_else(|| {
            OutputMismatch::new(
                format!("destination Option<{}>", type_name::<T>()),
                "a destination of another type",
            )
        })?;
        *slot = Some(project(&concrete));
        Ok(())
    })
}

/// Newtype wrapper for a named set of manifolds installed together.
#[derive(Debug, Clone, Default)]
pub struct Manifolds(pub BTreeMap<String, Manifold>);

impl Manifolds {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, manifold: Manifold) {
        self.0.insert(name.into(), manifold);
    }

    pub fn get(&self, name: &str) -> Option<&Manifold> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Manifold)> {
        self.0.iter()
    }
}

impl IntoIterator for Manifolds {
    type Item = (String, Manifold);
    type IntoIter = std::collections::btree_map::IntoIter<String, Manifold>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
