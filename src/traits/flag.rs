// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// A single boolean used to decide whether some other manifold should run.
///
/// `check` must always return the same value for a given instance. A flag whose
/// underlying condition changes stops its worker instead, so that everything
/// gated on it restarts against the new value.
pub trait Flag: Send + Sync {
    fn check(&self) -> bool;
}
