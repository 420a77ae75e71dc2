// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::collections::BTreeMap;

use crate::engine::Lifecycle;

/// Point-in-time snapshot of the whole engine, suitable for status output.
#[derive(Debug, Clone, Serialize)]
pub struct EngineReport {
    pub state: EngineState,
    pub manifolds: BTreeMap<String, ManifoldReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Running,
    Stopping,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifoldReport {
    pub lifecycle: Lifecycle,
    pub inputs: Vec<String>,
    pub dependents: Vec<String>,
    /// Version of the published output, if any.
    pub version: Option<u64>,
    pub failures: u32,
    pub start_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl EngineReport {
    pub fn lifecycle(&self, name: &str) -> Option<Lifecycle> {
        self.manifolds.get(name).map(|m| m.lifecycle)
    }

    /// Names currently in the given lifecycle, sorted.
    pub fn in_lifecycle(&self, lifecycle: Lifecycle) -> Vec<String> {
        self.manifolds
            .iter()
            .filter(|(_, m)| m.lifecycle == lifecycle)
            .map(|(name, _)| name.clone())
            .collect()
    }
}
