// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod engine;
mod resource;
mod worker;

pub use config::ConfigError;
pub use engine::EngineError;
pub use resource::{OutputMismatch, ResourceError};
pub use worker::WorkerError;
