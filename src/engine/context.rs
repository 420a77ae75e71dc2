// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The view of the resource store handed to a manifold's start function.

use std::any::Any;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::engine::event::Event;
use crate::engine::Resources;
use crate::errors::ResourceError;

/// Scoped, read-only access to a manifold's declared inputs.
///
/// A fresh context is built for every start attempt. Reading a name the
/// manifold did not declare is an error, so a manifold can never couple
/// itself to something the engine does not know to restart it for.
#[derive(Clone)]
pub struct Context {
    owner: String,
    inputs: Arc<[String]>,
    resources: Resources,
    abort: CancellationToken,
    notifier: OutputNotifier,
}

impl Context {
    pub(crate) fn new(
        owner: &str,
        inputs: &[String],
        resources: Resources,
        abort: CancellationToken,
        notifier: OutputNotifier,
    ) -> Self {
        Self {
            owner: owner.to_string(),
            inputs: inputs.into(),
            resources,
            abort,
            notifier,
        }
    }

    /// Name of the manifold this context belongs to.
    pub fn name(&self) -> &str {
        &self.owner
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Reads input `name` as a `T` through its producer's output projector.
    ///
    /// ```ignore
    /// let flag: Arc<dyn Flag> = ctx.get("is-controller")?;
    /// ```
    pub fn get<T: 'static>(&self, name: &str) -> Result<T, ResourceError> {
        let mut slot: Option<T> = None;
        self.get_into(name, &mut slot)?;
        slot.ok_or_else(|| ResourceError::NoOutput {
            name: name.to_string(),
        })
    }

    /// Untyped form of [`Context::get`]: `out` must be an `&mut Option<T>`.
    pub fn get_into(&self, name: &str, out: &mut dyn Any) -> Result<(), ResourceError> {
        self.check_declared(name)?;
        let resource = self.resources.lookup(name).ok_or_else(|| ResourceError::Missing {
            name: name.to_string(),
        })?;
        let output = resource.output.ok_or_else(|| ResourceError::NoOutput {
            name: name.to_string(),
        })?;
        output(&resource.worker, out).map_err(|source| ResourceError::TypeMismatch {
            name: name.to_string(),
            source,
        })
    }

    /// Version of input `name` currently published.
    pub fn version(&self, name: &str) -> Result<u64, ResourceError> {
        self.check_declared(name)?;
        self.resources.version(name).ok_or_else(|| ResourceError::Missing {
            name: name.to_string(),
        })
    }

    /// Cancelled when the engine abandons this start attempt, for example
    /// because an input changed while the start function was still running.
    pub fn abort(&self) -> CancellationToken {
        self.abort.clone()
    }

    /// Handle a running worker keeps to report changes in its exposed value.
    pub fn notifier(&self) -> OutputNotifier {
        self.notifier.clone()
    }

    fn check_declared(&self, name: &str) -> Result<(), ResourceError> {
        if self.inputs.iter().any(|input| input == name) {
            Ok(())
        } else {
            Err(ResourceError::Undeclared {
                owner: self.owner.clone(),
                name: name.to_string(),
            })
        }
    }
}

/// Lets a running worker tell the engine that the value it exposes may have
/// changed. The engine re-fingerprints the worker and, only if the value
/// really differs, publishes a new version and restarts direct dependents.
#[derive(Clone)]
pub struct OutputNotifier {
    name: String,
    ticket: u64,
    events: mpsc::UnboundedSender<Event>,
}

impl OutputNotifier {
    pub(crate) fn new(name: &str, ticket: u64, events: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            name: name.to_string(),
            ticket,
            events,
        }
    }

    /// Returns false once the engine has stopped listening.
    pub fn changed(&self) -> bool {
        self.events
            .send(Event::OutputChanged {
                name: self.name.clone(),
                ticket: self.ticket,
            })
            .is_ok()
    }
}
