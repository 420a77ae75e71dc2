// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // restart policy + loading
pub mod demo;       // sample agent manifolds
pub mod engine;     // dependency engine
pub mod errors;     // error handling
pub mod flag;       // boolean flag workers
pub mod observability;
pub mod traits;     // worker + flag contracts
pub mod workers;    // tomb, task and stub workers
