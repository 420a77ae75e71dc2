// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A miniature machine agent built from manifolds.
//!
//! The collaborators here stand in for the real services of a machine agent:
//! the agent's own configuration, an API connection, a controller flag, a
//! one-shot serving-info writer and a feature-gated log forwarder. They exist
//! to drive the engine end to end and to show each part of the manifold
//! contract in use:
//!
//! * `agent` and `api-caller` expose typed outputs read through `Context::get`
//! * `is-controller` is a flag computed from both
//! * `serving-info-setter` does its work inside `start` and then uninstalls
//!   itself
//! * `log-sender` reports a missing dependency while its feature is disabled

mod workers;

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::engine::{output_of, Context, Manifold, Manifolds};
use crate::errors::WorkerError;
use crate::flag::flag_manifold;
use crate::traits::Worker;

pub use workers::{Agent, AgentWorker, ApiCaller, ApiCallerWorker, LogSenderWorker};

pub const AGENT: &str = "agent";
pub const API_CALLER: &str = "api-caller";
pub const IS_CONTROLLER: &str = "is-controller";
pub const SERVING_INFO_SETTER: &str = "serving-info-setter";
pub const LOG_SENDER: &str = "log-sender";

/// Settings for the demo agent.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Tag of the machine the agent runs as, e.g. `machine-0`.
    pub machine_tag: String,
    /// Machines the simulated API reports as controllers.
    pub controllers: BTreeSet<String>,
    /// Feature switch for the log sender.
    pub db_log_enabled: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            machine_tag: "machine-0".to_string(),
            controllers: BTreeSet::from(["machine-0".to_string()]),
            db_log_enabled: true,
        }
    }
}

pub fn agent_manifold(tag: impl Into<String>) -> Manifold {
    let tag = tag.into();
    Manifold::new(Vec::<String>::new(), move |_ctx: Context| {
        let tag = tag.clone();
        async move { Ok(AgentWorker::new(Agent::new(tag)) as Arc<dyn Worker>) }
    })
    .with_output(output_of::<AgentWorker, Agent, _>(|worker| worker.agent().clone()))
}

pub fn api_caller_manifold(controllers: BTreeSet<String>) -> Manifold {
    let controllers = Arc::new(controllers);
    Manifold::new([AGENT], move |ctx: Context| {
        let controllers = Arc::clone(&controllers);
        async move {
            let agent: Agent = ctx.get(AGENT)?;
            let caller = ApiCaller::connect(agent.tag(), controllers);
            Ok(ApiCallerWorker::new(caller) as Arc<dyn Worker>)
        }
    })
    .with_output(output_of::<ApiCallerWorker, ApiCaller, _>(|worker| worker.caller().clone()))
}

/// Flag reading `true` when the API reports this machine as a controller.
pub fn controller_flag_manifold() -> Manifold {
    flag_manifold([AGENT, API_CALLER], |ctx| {
        let agent: Agent = ctx.get(AGENT)?;
        let api: ApiCaller = ctx.get(API_CALLER)?;
        Ok(api.is_controller(agent.tag()))
    })
}

/// Writes state serving info into the agent's config on controllers, then
/// uninstalls itself. Machines that are not controllers uninstall at once.
pub fn serving_info_setter_manifold() -> Manifold {
    Manifold::new([AGENT, API_CALLER], |ctx: Context| async move {
        let agent: Agent = ctx.get(AGENT)?;
        if !agent.tag().starts_with("machine-") {
            return Err(WorkerError::msg("agent's tag is not a machine tag"));
        }
        let api: ApiCaller = ctx.get(API_CALLER)?;
        if !api.is_controller(agent.tag()) {
            return Err(WorkerError::Uninstall);
        }

        // Credentials already written locally take precedence over the API's.
        let info = agent
            .serving_info()
            .unwrap_or_else(|| api.state_serving_info());
        agent.set_serving_info(info);
        tracing::info!(manifold = ctx.name(), machine = agent.tag(), "state serving info written");
        Err(WorkerError::Uninstall)
    })
}

/// Log forwarder, only runs while `enabled` is set.
pub fn log_sender_manifold(enabled: bool) -> Manifold {
    Manifold::new([AGENT, API_CALLER], move |ctx: Context| async move {
        if !enabled {
            tracing::debug!(manifold = ctx.name(), inputs = ?ctx.inputs(), "log forwarding disabled");
            return Err(WorkerError::Missing);
        }
        let agent: Agent = ctx.get(AGENT)?;
        let api: ApiCaller = ctx.get(API_CALLER)?;
        Ok(LogSenderWorker::new(agent.tag(), api) as Arc<dyn Worker>)
    })
}

/// Every demo manifold, keyed by its conventional name.
pub fn agent_manifolds(config: &DemoConfig) -> Manifolds {
    let mut manifolds = Manifolds::new();
    manifolds.insert(AGENT, agent_manifold(config.machine_tag.clone()));
    manifolds.insert(API_CALLER, api_caller_manifold(config.controllers.clone()));
    manifolds.insert(IS_CONTROLLER, controller_flag_manifold());
    manifolds.insert(SERVING_INFO_SETTER, serving_info_setter_manifold());
    manifolds.insert(LOG_SENDER, log_sender_manifold(config.db_log_enabled));
    manifolds
}
