// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Versioned store of every manifold's published output.
//!
//! Only the engine's coordinating task writes to the store; workers and start
//! functions read it through a [`Context`](crate::engine::Context). Reads take
//! the lock just long enough to clone the entry, so an output projector never
//! runs while the lock is held.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::engine::manifold::OutputFunc;
use crate::traits::Worker;

#[derive(Clone)]
pub(crate) struct Resource {
    pub worker: Arc<dyn Worker>,
    pub output: Option<OutputFunc>,
    pub version: u64,
    pub fingerprint: Option<serde_json::Value>,
}

#[derive(Default)]
struct Store {
    entries: HashMap<String, Resource>,
    last_version: u64,
}

/// Cheaply cloneable handle on the shared store.
#[derive(Clone, Default)]
pub struct Resources {
    store: Arc<RwLock<Store>>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a freshly started worker at a new version.
    pub(crate) fn publish(
        &self,
        name: &str,
        worker: Arc<dyn Worker>,
        output: Option<OutputFunc>,
        fingerprint: Option<serde_json::Value>,
    ) -> u64 {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        store.last_version += 1;
        let version = store.last_version;
        store.entries.insert(
            name.to_string(),
            Resource {
                worker,
                output,
                version,
                fingerprint,
            },
        );
        version
    }

    /// Re-evaluates a running worker's published value.
    ///
    /// Returns the new version when the value changed. A value is unchanged
    /// only when both the old and new fingerprints are present and equal;
    /// without fingerprints every republish counts as a change.
    pub(crate) fn republish(&self, name: &str, fingerprint: Option<serde_json::Value>) -> Option<u64> {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        let unchanged = match (store.entries.get(name), &fingerprint) {
            (None, _) => return None,
            (Some(entry), Some(new)) => entry.fingerprint.as_ref() == Some(new),
            (Some(_), None) => false,
        };
        if unchanged {
            return None;
        }
        store.last_version += 1;
        let version = store.last_version;
        let entry = store.entries.get_mut(name)?;
        entry.version = version;
        entry.fingerprint = fingerprint;
        Some(version)
    }

    /// Removes a published output. Returns whether anything was removed.
    pub(crate) fn withdraw(&self, name: &str) -> bool {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        store.entries.remove(name).is_some()
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Resource> {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        store.entries.get(name).cloned()
    }

    /// Version of the currently published output, if any.
    pub fn version(&self, name: &str) -> Option<u64> {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        store.entries.get(name).map(|entry| entry.version)
    }

    pub fn is_published(&self, name: &str) -> bool {
        self.version(name).is_some()
    }

    /// Names with a published output, sorted.
    pub fn published(&self) -> Vec<String> {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = store.entries.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workers::StubWorker;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_assigns_increasing_versions() {
        let resources = Resources::new();
        let first = resources.publish("agent", StubWorker::new("agent"), None, None);
        let second = resources.publish("api-caller", StubWorker::new("api"), None, None);
        assert!(second > first);
        assert_eq!(resources.version("agent"), Some(first));
        assert_eq!(resources.published(), vec!["agent", "api-caller"]);
    }

    #[tokio::test]
    async fn test_republish_with_equal_fingerprint_keeps_version() {
        let resources = Resources::new();
        let version = resources.publish(
            "flag",
            StubWorker::new("flag"),
            None,
            Some(json!({ "value": true })),
        );

        assert_eq!(resources.republish("flag", Some(json!({ "value": true }))), None);
        assert_eq!(resources.version("flag"), Some(version));

        let bumped = resources.republish("flag", Some(json!({ "value": false })));
        assert!(bumped.is_some_and(|v| v > version));
        assert_eq!(resources.version("flag"), bumped);
    }

    #[tokio::test]
    async fn test_republish_without_fingerprint_always_changes() {
        let resources = Resources::new();
        let version = resources.publish("api-caller", StubWorker::new("api"), None, None);
        let bumped = resources.republish("api-caller", None).unwrap();
        assert!(bumped > version);
    }

    #[tokio::test]
    async fn test_withdraw_and_republish_of_absent_entry() {
        let resources = Resources::new();
        resources.publish("agent", StubWorker::new("agent"), None, None);
        assert!(resources.withdraw("agent"));
        assert!(!resources.withdraw("agent"));
        assert!(!resources.is_published("agent"));
        assert_eq!(resources.republish("agent", None), None);
    }
}
