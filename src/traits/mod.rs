// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod flag;
pub mod worker;

pub use flag::Flag;
pub use worker::{downcast_worker, worker_type, AsAny, Worker};
