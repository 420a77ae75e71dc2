// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::errors::WorkerError;
use crate::traits::Worker;
use crate::workers::TaskWorker;

/// Shared handle on the agent's identity and writable configuration.
#[derive(Debug, Clone)]
pub struct Agent {
    tag: String,
    serving_info: Arc<Mutex<Option<String>>>,
}

impl Agent {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            serving_info: Arc::new(Mutex::new(None)),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn serving_info(&self) -> Option<String> {
        self.serving_info
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_serving_info(&self, info: String) {
        *self.serving_info.lock().unwrap_or_else(PoisonError::into_inner) = Some(info);
    }
}

/// Simulated API connection made on behalf of one machine.
#[derive(Debug, Clone)]
pub struct ApiCaller {
    machine: String,
    controllers: Arc<BTreeSet<String>>,
}

impl ApiCaller {
    pub fn connect(machine: &str, controllers: Arc<BTreeSet<String>>) -> Self {
        Self {
            machine: machine.to_string(),
            controllers,
        }
    }

    pub fn machine(&self) -> &str {
        &self.machine
    }

    pub fn is_controller(&self, tag: &str) -> bool {
        self.controllers.contains(tag)
    }

    pub fn state_serving_info(&self) -> String {
        format!("state-serving-info for {}", self.machine)
    }
}

fn idle() -> TaskWorker {
    TaskWorker::spawn(|tomb| async move {
        tomb.dying().await;
        Ok(())
    })
}

pub struct AgentWorker {
    agent: Agent,
    task: TaskWorker,
}

impl AgentWorker {
    pub fn new(agent: Agent) -> Arc<Self> {
        Arc::new(Self { agent, task: idle() })
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }
}

#[async_trait]
impl Worker for AgentWorker {
    fn kill(&self) {
        self.task.kill();
    }

    async fn wait(&self) -> Result<(), WorkerError> {
        self.task.wait().await
    }
}

pub struct ApiCallerWorker {
    caller: ApiCaller,
    task: TaskWorker,
}

impl ApiCallerWorker {
    pub fn new(caller: ApiCaller) -> Arc<Self> {
        Arc::new(Self { caller, task: idle() })
    }

    pub fn caller(&self) -> &ApiCaller {
        &self.caller
    }
}

#[async_trait]
impl Worker for ApiCallerWorker {
    fn kill(&self) {
        self.task.kill();
    }

    async fn wait(&self) -> Result<(), WorkerError> {
        self.task.wait().await
    }
}

/// Forwards the agent's log records over the API connection.
pub struct LogSenderWorker {
    task: TaskWorker,
}

impl LogSenderWorker {
    pub fn new(machine: &str, api: ApiCaller) -> Arc<Self> {
        let machine = machine.to_string();
        let task = TaskWorker::spawn(move |tomb| async move {
            tracing::debug!(machine = %machine, api = api.machine(), "log sender forwarding records");
            tomb.dying().await;
            Ok(())
        });
        Arc::new(Self { task })
    }
}

#[async_trait]
impl Worker for LogSenderWorker {
    fn kill(&self) {
        self.task.kill();
    }

    async fn wait(&self) -> Result<(), WorkerError> {
        self.task.wait().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_clones_share_config() {
        let agent = Agent::new("machine-1");
        let copy = agent.clone();

        copy.set_serving_info("cert".to_string());
        assert_eq!(agent.serving_info().as_deref(), Some("cert"));
        assert_eq!(agent.tag(), "machine-1");
    }

    #[test]
    fn test_api_caller_controller_lookup() {
        let controllers = Arc::new(BTreeSet::from(["machine-0".to_string()]));
        let api = ApiCaller::connect("machine-3", controllers);

        assert!(api.is_controller("machine-0"));
        assert!(!api.is_controller("machine-3"));
        assert!(api.state_serving_info().contains("machine-3"));
    }
}
