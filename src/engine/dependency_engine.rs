// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The dependency engine: a supervisor that starts, restarts and stops
//! workers as the outputs they depend on come and go.
//!
//! # Architecture
//!
//! All graph state lives in a single `Reconciler` owned by one tokio task. It
//! reacts to [`Event`]s fanned in on one channel:
//!
//! * install / uninstall / report requests from the [`Engine`] handle,
//! * start attempts finishing (start functions run on their own tasks),
//! * workers exiting (every worker is joined on its own task),
//! * running workers announcing that their exposed value changed,
//! * delayed restarts falling due.
//!
//! Events are handled one at a time, so graph mutations never interleave,
//! while worker bodies run concurrently elsewhere.
//!
//! # Ordering rules
//!
//! * A manifold starts only when every input is `Started` and published.
//! * When an input's published version changes, direct dependents running
//!   against the old version are stopped at once.
//! * A stopping manifold keeps its output published until it has joined and
//!   all of its dependents have stopped; only then is the output withdrawn.
//! * On shutdown, uninstall or replacement a manifold is "draining": it is
//!   told to stop only once all of its dependents have joined, and nothing
//!   new starts against its output meanwhile.

use std::collections::{BTreeMap, BTreeSet};
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::{validate_config, EngineConfig};
use crate::engine::backoff::{bounce_delay, error_delay};
use crate::engine::event::Event;
use crate::engine::graph::{dependents_of, find_cycle, start_order};
use crate::engine::report::{EngineReport, EngineState, ManifoldReport};
use crate::engine::state::Node;
use crate::engine::{Context, Lifecycle, Manifold, Manifolds, OutputNotifier, Resources};
use crate::errors::{EngineError, WorkerError};
use crate::observability::messages::engine::{
    EngineFatal, EngineStarted, EngineStopped, EngineStopping, InstallRejected,
};
use crate::observability::messages::manifold::{
    ManifoldExited, ManifoldFailed, ManifoldInstalled, ManifoldMissing, ManifoldRestartScheduled,
    ManifoldStarted, ManifoldStarting, ManifoldStopped, ManifoldStopping, ManifoldUninstalled,
    OutputRepublished, OutputUnchanged, StaleStartDiscarded,
};
use crate::observability::messages::validation::CyclicDependencyDetected;
use crate::observability::messages::StructuredLog;
use crate::traits::Worker;
use crate::workers::{TaskWorker, Tomb};

/// Handle on a running dependency engine.
///
/// The engine is itself a [`Worker`]: `kill` starts an ordered shutdown and
/// `wait` returns once every manifold has stopped, so engines can be nested
/// inside other engines.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use manifold_engine::config::EngineConfig;
/// use manifold_engine::engine::{Engine, Manifold};
/// use manifold_engine::traits::Worker;
/// use manifold_engine::workers::StubWorker;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = Engine::start(EngineConfig::default())?;
/// engine
///     .install("agent", Manifold::new(Vec::<String>::new(), |_ctx| async move {
///         Ok(StubWorker::new("agent") as Arc<dyn Worker>)
///     }))
///     .await?;
///
/// engine.kill();
/// engine.wait().await?;
/// # Ok(())
/// # }
/// ```
pub struct Engine {
    events: mpsc::UnboundedSender<Event>,
    task: TaskWorker,
    resources: Resources,
}

impl Engine {
    /// Validates `config` and starts the engine's coordinating task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: EngineConfig) -> Result<Self, EngineError> {
        validate_config(&config).map_err(EngineError::InvalidConfig)?;

        let (events, inbox) = mpsc::unbounded_channel();
        let resources = Resources::new();
        let reconciler = Reconciler::new(config, events.clone(), resources.clone());
        let task = TaskWorker::spawn(move |tomb| reconciler.run(inbox, tomb));

        Ok(Self {
            events,
            task,
            resources,
        })
    }

    /// Adds `manifold` under `name`, replacing any existing occupant.
    ///
    /// Replacing a running manifold stops it (and, through the withdrawal of
    /// its output, its dependents) before the new definition is started.
    pub async fn install(&self, name: impl Into<String>, manifold: Manifold) -> Result<(), EngineError> {
        let name = name.into();
        self.request(|reply| Event::Install {
            name,
            manifold,
            reply,
        })
        .await?
    }

    /// Installs a set of manifolds, inputs before the manifolds that use them.
    pub async fn install_all(&self, manifolds: Manifolds) -> Result<(), EngineError> {
        let edges: BTreeMap<String, Vec<String>> = manifolds
            .iter()
            .map(|(name, manifold)| (name.clone(), manifold.inputs.clone()))
            .collect();
        let mut manifolds = manifolds.0;
        for name in start_order(&edges) {
            if let Some(manifold) = manifolds.remove(&name) {
                self.install(name, manifold).await?;
            }
        }
        Ok(())
    }

    /// Stops `name` after its dependents and removes it permanently.
    pub async fn uninstall(&self, name: &str) -> Result<(), EngineError> {
        let name = name.to_string();
        self.request(|reply| Event::Uninstall { name, reply }).await?
    }

    pub async fn report(&self) -> Result<EngineReport, EngineError> {
        self.request(|reply| Event::Report { reply }).await
    }

    /// Read-only view of the published outputs.
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Event) -> Result<T, EngineError> {
        let (reply, response) = oneshot::channel();
        self.events.send(build(reply)).map_err(|_| EngineError::Dying)?;
        response.await.map_err(|_| EngineError::Dying)
    }
}

#[async_trait]
impl Worker for Engine {
    fn kill(&self) {
        self.task.kill();
    }

    async fn wait(&self) -> Result<(), WorkerError> {
        self.task.wait().await
    }
}

/// The engine's graph state. Owned by the coordinating task alone.
struct Reconciler {
    config: EngineConfig,
    events: mpsc::UnboundedSender<Event>,
    resources: Resources,
    nodes: BTreeMap<String, Node>,
    dependents: BTreeMap<String, BTreeSet<String>>,
    /// Manifolds to stop as soon as their dependents have joined.
    draining: BTreeSet<String>,
    shutting_down: bool,
    fatal: Option<WorkerError>,
}

impl Reconciler {
    fn new(config: EngineConfig, events: mpsc::UnboundedSender<Event>, resources: Resources) -> Self {
        Self {
            config,
            events,
            resources,
            nodes: BTreeMap::new(),
            dependents: BTreeMap::new(),
            draining: BTreeSet::new(),
            shutting_down: false,
            fatal: None,
        }
    }

    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Event>, tomb: Tomb) -> Result<(), WorkerError> {
        EngineStarted { config: &self.config }.log();

        loop {
            self.advance_drains();
            if self.shutting_down && self.is_quiescent() {
                break;
            }
            tokio::select! {
                _ = tomb.dying(), if !self.shutting_down => self.begin_shutdown(),
                event = inbox.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
            }
        }

        EngineStopped {
            fatal: self.fatal.as_ref(),
        }
        .log();
        match self.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Install {
                name,
                manifold,
                reply,
            } => {
                let _ = reply.send(self.install(name, manifold));
            }
            Event::Uninstall { name, reply } => {
                let _ = reply.send(self.uninstall(&name));
            }
            Event::Report { reply } => {
                let _ = reply.send(self.report());
            }
            Event::Started { name, ticket, result } => self.on_started(&name, ticket, result),
            Event::Exited { name, ticket, result } => self.on_exited(&name, ticket, result),
            Event::OutputChanged { name, ticket } => self.on_output_changed(&name, ticket),
            Event::Retry { name, ticket } => self.on_retry(&name, ticket),
        }
    }

    // ---- registration ----------------------------------------------------

    fn install(&mut self, name: String, manifold: Manifold) -> Result<(), EngineError> {
        if self.shutting_down {
            return Err(EngineError::Dying);
        }
        if manifold.depends_on(&name) {
            let err = EngineError::SelfDependency(name.clone());
            InstallRejected { manifold: &name, reason: &err }.log();
            return Err(err);
        }
        let mut edges = self.planned_edges();
        edges.insert(name.clone(), manifold.inputs.clone());
        if let Some(cycle) = find_cycle(&edges) {
            CyclicDependencyDetected { cycle: &cycle }.log();
            let err = EngineError::Cycle(cycle);
            InstallRejected { manifold: &name, reason: &err }.log();
            return Err(err);
        }

        let replacing = self
            .nodes
            .get(&name)
            .is_some_and(|node| node.lifecycle != Lifecycle::Uninstalled);
        ManifoldInstalled {
            name: &name,
            inputs: &manifold.inputs,
            replacing,
        }
        .log();

        match self.nodes.get_mut(&name) {
            None => {
                self.nodes.insert(name.clone(), Node::new(manifold));
            }
            Some(node) if !node.lifecycle.is_active() => node.reset(manifold),
            Some(node) => {
                // The new definition takes over once the old worker is gone.
                node.replacement = Some(manifold);
                node.remove_when_stopped = false;
                self.drain(&name);
                return Ok(());
            }
        }
        self.rebuild_dependents();
        self.reconsider(&name);
        Ok(())
    }

    fn uninstall(&mut self, name: &str) -> Result<(), EngineError> {
        if self.shutting_down {
            return Err(EngineError::Dying);
        }
        let node = self
            .nodes
            .get_mut(name)
            .filter(|node| node.lifecycle != Lifecycle::Uninstalled)
            .ok_or_else(|| EngineError::NotInstalled(name.to_string()))?;
        if node.lifecycle.is_active() {
            node.remove_when_stopped = true;
            node.replacement = None;
            self.drain(name);
        } else {
            self.mark_uninstalled(name);
        }
        Ok(())
    }

    // ---- starting ----------------------------------------------------------

    /// Starts `name` if it is stopped, not waiting on a timer or an input
    /// change, and every input is ready.
    fn reconsider(&mut self, name: &str) {
        if self.shutting_down {
            return;
        }
        let Some(node) = self.nodes.get(name) else {
            return;
        };
        if node.lifecycle != Lifecycle::Stopped || node.awaiting_change || node.retry_pending {
            return;
        }
        if node.manifold.inputs.iter().all(|input| self.input_ready(input)) {
            self.start_node(name);
        }
    }

    fn input_ready(&self, input: &str) -> bool {
        !self.draining.contains(input)
            && self
                .nodes
                .get(input)
                .is_some_and(|node| node.lifecycle == Lifecycle::Started)
            && self.resources.is_published(input)
    }

    fn start_node(&mut self, name: &str) {
        let resources = self.resources.clone();
        let Some(node) = self.nodes.get_mut(name) else {
            return;
        };
        node.ticket += 1;
        let ticket = node.ticket;
        node.lifecycle = Lifecycle::Starting;
        node.stop_requested = false;
        node.input_versions = node
            .manifold
            .inputs
            .iter()
            .filter_map(|input| resources.version(input).map(|v| (input.clone(), v)))
            .collect();

        let abort = CancellationToken::new();
        node.abort = Some(abort.clone());
        let notifier = OutputNotifier::new(name, ticket, self.events.clone());
        let ctx = Context::new(name, &node.manifold.inputs, resources, abort, notifier);
        let start = Arc::clone(&node.manifold.start);

        let message = ManifoldStarting {
            name,
            attempt: node.start_count + 1,
        };
        message.log();
        let span = message.span("start");

        let events = self.events.clone();
        let name = name.to_string();
        tokio::spawn(
            async move {
                let result = match tokio::spawn(start(ctx)).await {
                    Ok(result) => result,
                    Err(join_error) => Err(WorkerError::msg(format!(
                        "start function failed: {}",
                        join_error
                    ))),
                };
                let _ = events.send(Event::Started { name, ticket, result });
            }
            .instrument(span),
        );
    }

    fn on_started(&mut self, name: &str, ticket: u64, result: Result<Arc<dyn Worker>, WorkerError>) {
        let abandon = self.shutting_down;
        let node = match self.nodes.get_mut(name) {
            Some(node) if node.ticket == ticket && node.lifecycle == Lifecycle::Starting => node,
            _ => {
                if let Ok(worker) = result {
                    StaleStartDiscarded { name }.log();
                    worker.kill();
                }
                return;
            }
        };
        node.abort = None;
        let abandon = abandon || node.stop_requested;

        match result {
            Ok(worker) => {
                node.worker = Some(Arc::clone(&worker));
                if abandon {
                    node.lifecycle = Lifecycle::Stopping;
                    worker.kill();
                    ManifoldStopping { name }.log();
                } else {
                    node.lifecycle = Lifecycle::Started;
                    node.start_count += 1;
                    node.failures = 0;
                    node.last_error = None;
                    let fingerprint = node.manifold.fingerprint.as_ref().and_then(|f| f(&worker));
                    let output = node.manifold.output.clone();
                    let version = self.resources.publish(name, Arc::clone(&worker), output, fingerprint);
                    ManifoldStarted { name, version }.log();
                }
                self.spawn_waiter(name, ticket, worker);
                if !abandon {
                    self.dependency_changed(name);
                }
            }
            Err(err) => {
                node.lifecycle = Lifecycle::Stopped;
                node.input_versions.clear();
                let requested = mem::take(&mut node.stop_requested);
                let inputs = node.manifold.inputs.clone();
                self.draining.remove(name);
                self.conclude(name, Err(err), requested);
                self.release_inputs(&inputs);
            }
        }
    }

    /// Joins `worker` on its own task and reports the outcome as an event.
    fn spawn_waiter(&self, name: &str, ticket: u64, worker: Arc<dyn Worker>) {
        let events = self.events.clone();
        let name = name.to_string();
        tokio::spawn(async move {
            let result = match tokio::spawn(async move { worker.wait().await }).await {
                Ok(result) => result,
                Err(join_error) => Err(WorkerError::msg(format!("worker wait failed: {}", join_error))),
            };
            let _ = events.send(Event::Exited { name, ticket, result });
        });
    }

    // ---- stopping ----------------------------------------------------------

    /// Asks `name` to stop right away, whatever its dependents are doing.
    fn stop_now(&mut self, name: &str) {
        let Some(node) = self.nodes.get_mut(name) else {
            return;
        };
        match node.lifecycle {
            Lifecycle::Starting => {
                node.stop_requested = true;
                if let Some(abort) = &node.abort {
                    abort.cancel();
                }
            }
            Lifecycle::Started => {
                node.stop_requested = true;
                node.lifecycle = Lifecycle::Stopping;
                if let Some(worker) = &node.worker {
                    worker.kill();
                }
                ManifoldStopping { name }.log();
            }
            _ => {}
        }
    }

    fn on_exited(&mut self, name: &str, ticket: u64, result: Result<(), WorkerError>) {
        let Some(node) = self.nodes.get_mut(name) else {
            return;
        };
        if node.ticket != ticket || node.worker.is_none() {
            return;
        }
        match node.lifecycle {
            Lifecycle::Started => {
                node.lifecycle = Lifecycle::Stopping;
                ManifoldExited {
                    name,
                    result: &result,
                }
                .log();
            }
            Lifecycle::Stopping => {}
            _ => return,
        }
        node.joined = Some(result);
        self.try_complete_stop(name);
    }

    /// Finishes stopping `name` once its worker has joined and no dependent is
    /// still active; otherwise makes sure those dependents are stopping.
    fn try_complete_stop(&mut self, name: &str) {
        match self.nodes.get(name) {
            Some(node) if node.lifecycle == Lifecycle::Stopping && node.joined.is_some() => {}
            _ => return,
        }
        let active = self.active_dependents(name);
        if !active.is_empty() {
            for dependent in active {
                self.stop_now(&dependent);
            }
            return;
        }

        let Some(node) = self.nodes.get_mut(name) else {
            return;
        };
        let result = node.joined.take().unwrap_or(Ok(()));
        node.worker = None;
        node.lifecycle = Lifecycle::Stopped;
        node.input_versions.clear();
        let requested = mem::take(&mut node.stop_requested);
        let inputs = node.manifold.inputs.clone();

        self.draining.remove(name);
        let withdrawn = self.resources.withdraw(name);
        ManifoldStopped { name, withdrawn }.log();
        if withdrawn {
            self.dependency_changed(name);
        }
        self.conclude(name, result, requested);
        self.release_inputs(&inputs);
    }

    /// Lets inputs that were waiting on this manifold finish their own stop.
    fn release_inputs(&mut self, inputs: &[String]) {
        for input in inputs {
            self.try_complete_stop(input);
        }
    }

    fn active_dependents(&self, name: &str) -> Vec<String> {
        self.dependents_of(name)
            .into_iter()
            .filter(|dependent| {
                self.nodes
                    .get(dependent)
                    .is_some_and(|node| node.lifecycle.is_active())
            })
            .collect()
    }

    // ---- classification ----------------------------------------------------

    /// Decides what happens to a manifold that has just become `Stopped`.
    fn conclude(&mut self, name: &str, result: Result<(), WorkerError>, requested: bool) {
        let Some(node) = self.nodes.get_mut(name) else {
            return;
        };
        let result = match (result, &node.manifold.filter) {
            (Err(err), Some(filter)) => Err(filter(err)),
            (result, _) => result,
        };

        if node.remove_when_stopped {
            self.mark_uninstalled(name);
            return;
        }
        if let Some(replacement) = node.replacement.take() {
            node.reset(replacement);
            self.rebuild_dependents();
            self.reconsider(name);
            return;
        }

        match result {
            Err(WorkerError::Fatal(cause)) => {
                node.last_error = Some(cause.to_string());
                let err = WorkerError::Fatal(cause);
                EngineFatal { manifold: name, error: &err }.log();
                self.fatal.get_or_insert(err);
                self.begin_shutdown();
            }
            Err(WorkerError::Uninstall) => self.mark_uninstalled(name),
            _ if requested => self.reconsider(name),
            Ok(()) => {
                let delay = bounce_delay(&self.config);
                ManifoldRestartScheduled {
                    name,
                    reason: "stopped cleanly",
                    delay,
                }
                .log();
                self.schedule(name, delay);
            }
            Err(WorkerError::Bounce) => {
                let delay = bounce_delay(&self.config);
                ManifoldRestartScheduled {
                    name,
                    reason: "bounced",
                    delay,
                }
                .log();
                self.schedule(name, delay);
            }
            Err(WorkerError::Missing) => {
                node.awaiting_change = true;
                ManifoldMissing { name }.log();
            }
            Err(err @ WorkerError::Other(_)) => {
                node.failures += 1;
                node.last_error = Some(err.to_string());
                let failures = node.failures;
                let delay = error_delay(&self.config, failures);
                ManifoldFailed {
                    name,
                    error: &err,
                    failures,
                    delay,
                }
                .log();
                self.schedule(name, delay);
            }
        }
    }

    fn schedule(&mut self, name: &str, delay: Duration) {
        if self.shutting_down {
            return;
        }
        if delay.is_zero() {
            self.reconsider(name);
            return;
        }
        let Some(node) = self.nodes.get_mut(name) else {
            return;
        };
        node.retry_pending = true;
        let ticket = node.ticket;
        let events = self.events.clone();
        let name = name.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(Event::Retry { name, ticket });
        });
    }

    fn on_retry(&mut self, name: &str, ticket: u64) {
        let Some(node) = self.nodes.get_mut(name) else {
            return;
        };
        if node.ticket != ticket || !node.retry_pending || node.lifecycle != Lifecycle::Stopped {
            return;
        }
        node.retry_pending = false;
        self.reconsider(name);
    }

    fn mark_uninstalled(&mut self, name: &str) {
        let Some(node) = self.nodes.get_mut(name) else {
            return;
        };
        node.lifecycle = Lifecycle::Uninstalled;
        node.worker = None;
        node.clear_waits();
        node.replacement = None;
        node.remove_when_stopped = false;
        node.input_versions.clear();
        self.draining.remove(name);
        ManifoldUninstalled { name }.log();
        self.rebuild_dependents();
    }

    // ---- output propagation -----------------------------------------------

    /// Reacts to `name`'s published version changing (publish, republish or
    /// withdrawal).
    fn dependency_changed(&mut self, name: &str) {
        let current = self.resources.version(name);
        for dependent in self.dependents_of(name) {
            let Some(node) = self.nodes.get_mut(&dependent) else {
                continue;
            };
            match node.lifecycle {
                Lifecycle::Stopped => {
                    node.clear_waits();
                    self.reconsider(&dependent);
                }
                Lifecycle::Starting | Lifecycle::Started => {
                    if node.input_versions.get(name).copied() != current {
                        self.stop_now(&dependent);
                    }
                }
                _ => {}
            }
        }
    }

    fn on_output_changed(&mut self, name: &str, ticket: u64) {
        let Some(node) = self.nodes.get(name) else {
            return;
        };
        if node.ticket != ticket || node.lifecycle != Lifecycle::Started {
            return;
        }
        let Some(worker) = node.worker.as_ref() else {
            return;
        };
        let fingerprint = node.manifold.fingerprint.as_ref().and_then(|f| f(worker));
        match self.resources.republish(name, fingerprint) {
            Some(version) => {
                OutputRepublished { name, version }.log();
                self.dependency_changed(name);
            }
            None => OutputUnchanged { name }.log(),
        }
    }

    // ---- draining ------------------------------------------------------------

    /// Marks `name` and every active manifold depending on it, directly or
    /// not, for dependents-first stopping.
    fn drain(&mut self, name: &str) {
        let mut pending = vec![name.to_string()];
        while let Some(next) = pending.pop() {
            if self.draining.insert(next.clone()) {
                pending.extend(self.active_dependents(&next));
            }
        }
    }

    /// Stops every draining manifold whose dependents have all joined.
    fn advance_drains(&mut self) {
        let draining: Vec<String> = self.draining.iter().cloned().collect();
        for name in draining {
            let Some(lifecycle) = self.nodes.get(&name).map(|node| node.lifecycle) else {
                self.draining.remove(&name);
                continue;
            };
            match lifecycle {
                Lifecycle::Starting => self.stop_now(&name),
                Lifecycle::Started => {
                    if self.active_dependents(&name).is_empty() {
                        self.stop_now(&name);
                    }
                }
                Lifecycle::Stopping => {}
                Lifecycle::Stopped | Lifecycle::Uninstalled => {
                    self.draining.remove(&name);
                }
            }
        }
    }

    fn begin_shutdown(&mut self) {
        if self.shutting_down {
            return;
        }
        self.shutting_down = true;
        EngineStopping {
            manifold_count: self.nodes.len(),
        }
        .log();

        for node in self.nodes.values_mut() {
            node.clear_waits();
        }
        let names: Vec<String> = self.nodes.keys().cloned().collect();
        self.draining.extend(names);
        self.advance_drains();
    }

    fn is_quiescent(&self) -> bool {
        self.nodes.values().all(|node| !node.lifecycle.is_active())
    }

    // ---- graph bookkeeping ---------------------------------------------------

    /// Edges as they will be once pending replacements take effect.
    fn planned_edges(&self) -> BTreeMap<String, Vec<String>> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.lifecycle != Lifecycle::Uninstalled)
            .map(|(name, node)| {
                let manifold = node.replacement.as_ref().unwrap_or(&node.manifold);
                (name.clone(), manifold.inputs.clone())
            })
            .collect()
    }

    fn rebuild_dependents(&mut self) {
        let edges: BTreeMap<String, Vec<String>> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.lifecycle != Lifecycle::Uninstalled)
            .map(|(name, node)| (name.clone(), node.manifold.inputs.clone()))
            .collect();
        self.dependents = dependents_of(&edges);
    }

    fn dependents_of(&self, name: &str) -> Vec<String> {
        self.dependents
            .get(name)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn report(&self) -> EngineReport {
        let manifolds = self
            .nodes
            .iter()
            .map(|(name, node)| {
                let report = ManifoldReport {
                    lifecycle: node.lifecycle,
                    inputs: node.manifold.inputs.clone(),
                    dependents: self.dependents_of(name),
                    version: self.resources.version(name),
                    failures: node.failures,
                    start_count: node.start_count,
                    last_error: node.last_error.clone(),
                };
                (name.clone(), report)
            })
            .collect();
        EngineReport {
            state: if self.shutting_down {
                EngineState::Stopping
            } else {
                EngineState::Running
            },
            manifolds,
        }
    }
}
