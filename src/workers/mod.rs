// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Building blocks for writing workers: the cooperative-cancellation
//! [`Tomb`], the [`TaskWorker`] that runs a body on its own tokio task, and a
//! couple of stub workers used by tests and the demo agent.

pub mod stub;
mod task;
mod tomb;

pub use stub::StubWorker;
pub use task::TaskWorker;
pub use tomb::Tomb;
