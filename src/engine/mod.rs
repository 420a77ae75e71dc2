// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backoff;
pub mod context;
pub mod dependency_engine;
pub(crate) mod event;
pub mod graph;
pub mod manifold;
pub mod report;
pub mod resources;
pub mod state;
#[cfg(test)]
pub mod integration_tests;

pub use context::{Context, OutputNotifier};
pub use dependency_engine::Engine;
pub use manifold::{output_of, FilterFunc, FingerprintFunc, Manifold, Manifolds, OutputFunc, StartFunc, StartFuture};
pub use report::{EngineReport, EngineState, ManifoldReport};
pub use resources::Resources;
pub use state::Lifecycle;
