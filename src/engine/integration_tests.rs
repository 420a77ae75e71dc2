// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

use crate::config::EngineConfig;
use crate::engine::{output_of, Context, Engine, EngineReport, Lifecycle, Manifold, OutputNotifier};
use crate::errors::{EngineError, WorkerError};
use crate::flag::{flag_fingerprint, flag_output, ConditionFlagWorker, StaticFlagWorker};
use crate::traits::{Flag, Worker};
use crate::workers::TaskWorker;

/// Scenario tests driving a real engine with journaling workers
#[cfg(test)]
mod tests {
    use super::*;

    const PATIENCE: Duration = Duration::from_secs(5);
    const SETTLE: Duration = Duration::from_millis(60);

    /// Ordered record of worker starts, kills and exits across a scenario.
    #[derive(Clone, Default)]
    struct Journal(Arc<Mutex<Vec<String>>>);

    impl Journal {
        fn push(&self, entry: impl Into<String>) {
            self.0.lock().unwrap().push(entry.into());
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }

        fn count(&self, entry: &str) -> usize {
            self.entries().iter().filter(|e| e.as_str() == entry).count()
        }

        fn position(&self, entry: &str) -> usize {
            self.entries()
                .iter()
                .position(|e| e == entry)
                .unwrap_or_else(|| panic!("journal has no {:?}: {:?}", entry, self.entries()))
        }

        /// Position of the `nth` (zero-based) occurrence of `entry`.
        fn nth_position(&self, entry: &str, nth: usize) -> usize {
            self.entries()
                .iter()
                .enumerate()
                .filter(|(_, e)| e.as_str() == entry)
                .map(|(i, _)| i)
                .nth(nth)
                .unwrap_or_else(|| panic!("journal has no {:?} #{}: {:?}", entry, nth, self.entries()))
        }
    }

    struct JournalWorker {
        label: String,
        journal: Journal,
        task: TaskWorker,
    }

    impl JournalWorker {
        fn new(label: &str, journal: Journal) -> Arc<Self> {
            journal.push(format!("start:{}", label));
            let exit_label = label.to_string();
            let exit_journal = journal.clone();
            let task = TaskWorker::spawn(move |tomb| async move {
                tomb.dying().await;
                exit_journal.push(format!("exit:{}", exit_label));
                Ok(())
            });
            Arc::new(Self {
                label: label.to_string(),
                journal,
                task,
            })
        }

        fn fail(&self, err: WorkerError) {
            self.task.tomb().kill(Some(err));
        }
    }

    #[async_trait]
    impl Worker for JournalWorker {
        fn kill(&self) {
            if !self.task.tomb().is_dying() {
                self.journal.push(format!("kill:{}", self.label));
            }
            self.task.kill();
        }

        async fn wait(&self) -> Result<(), WorkerError> {
            self.task.wait().await
        }
    }

    /// Builds journaling manifolds and remembers the latest worker per label.
    #[derive(Clone, Default)]
    struct Harness {
        journal: Journal,
        workers: Arc<Mutex<BTreeMap<String, Arc<JournalWorker>>>>,
    }

    impl Harness {
        fn spawn(&self, label: &str) -> Arc<JournalWorker> {
            let worker = JournalWorker::new(label, self.journal.clone());
            self.workers
                .lock()
                .unwrap()
                .insert(label.to_string(), Arc::clone(&worker));
            worker
        }

        fn worker(&self, label: &str) -> Arc<JournalWorker> {
            self.workers
                .lock()
                .unwrap()
                .get(label)
                .cloned()
                .unwrap_or_else(|| panic!("no worker labelled {}", label))
        }

        fn manifold(&self, label: &str, inputs: &[&str]) -> Manifold {
            let harness = self.clone();
            let label = label.to_string();
            Manifold::new(inputs.to_vec(), move |_ctx: Context| {
                let harness = harness.clone();
                let label = label.clone();
                async move { Ok(harness.spawn(&label) as Arc<dyn Worker>) }
            })
            .with_output(output_of::<JournalWorker, String, _>(|worker| worker.label.clone()))
        }
    }

    fn fast_config() -> EngineConfig {
        EngineConfig {
            error_delay_ms: 20,
            max_error_delay_ms: 200,
            backoff_factor: 2.0,
            bounce_delay_ms: 0,
        }
    }

    async fn wait_for<F>(engine: &Engine, what: &str, condition: F) -> EngineReport
    where
        F: Fn(&EngineReport) -> bool,
    {
        let polling = async {
            loop {
                let report = engine.report().await.expect("engine report");
                if condition(&report) {
                    return report;
                }
                sleep(Duration::from_millis(5)).await;
            }
        };
        timeout(PATIENCE, polling)
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {}", what))
    }

    async fn wait_for_lifecycle(engine: &Engine, name: &str, lifecycle: Lifecycle) -> EngineReport {
        wait_for(engine, &format!("{} to be {}", name, lifecycle), |report| {
            report.lifecycle(name) == Some(lifecycle)
        })
        .await
    }

    async fn eventually<F: Fn() -> bool>(what: &str, condition: F) {
        let polling = async {
            while !condition() {
                sleep(Duration::from_millis(5)).await;
            }
        };
        timeout(PATIENCE, polling)
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {}", what));
    }

    async fn shutdown(engine: &Engine) {
        engine.kill();
        timeout(PATIENCE, engine.wait())
            .await
            .expect("engine stops in time")
            .expect("engine stops cleanly");
    }

    async fn started_chain(harness: &Harness) -> Engine {
        let engine = Engine::start(fast_config()).unwrap();
        engine.install("agent", harness.manifold("agent", &[])).await.unwrap();
        engine
            .install("api-caller", harness.manifold("api-caller", &["agent"]))
            .await
            .unwrap();
        engine
            .install("log-sender", harness.manifold("log-sender", &["api-caller"]))
            .await
            .unwrap();
        wait_for(&engine, "chain to start", |report| {
            report.in_lifecycle(Lifecycle::Started).len() == 3
        })
        .await;
        engine
    }

    #[tokio::test]
    async fn test_inputs_start_before_dependents() {
        let harness = Harness::default();
        let engine = started_chain(&harness).await;
        let journal = &harness.journal;

        assert!(journal.position("start:agent") < journal.position("start:api-caller"));
        assert!(journal.position("start:api-caller") < journal.position("start:log-sender"));

        let report = engine.report().await.unwrap();
        let agent = &report.manifolds["agent"];
        assert_eq!(agent.dependents, vec!["api-caller"]);
        assert!(agent.version.is_some());
        assert_eq!(report.manifolds["log-sender"].inputs, vec!["api-caller"]);

        shutdown(&engine).await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_dependents_first() {
        let harness = Harness::default();
        let engine = started_chain(&harness).await;
        shutdown(&engine).await;

        let journal = &harness.journal;
        assert!(journal.position("exit:log-sender") < journal.position("kill:api-caller"));
        assert!(journal.position("exit:api-caller") < journal.position("kill:agent"));
        assert_eq!(journal.count("exit:agent"), 1);
    }

    #[tokio::test]
    async fn test_bounce_restarts_input_after_dependents_stop() {
        let harness = Harness::default();
        let engine = started_chain(&harness).await;

        harness.worker("agent").fail(WorkerError::Bounce);
        let report = wait_for(&engine, "chain to restart", |report| {
            ["agent", "api-caller", "log-sender"].iter().all(|name| {
                report.manifolds[*name].lifecycle == Lifecycle::Started
                    && report.manifolds[*name].start_count == 2
            })
        })
        .await;

        let journal = &harness.journal;
        assert!(journal.position("exit:log-sender") < journal.nth_position("start:agent", 1));
        assert!(journal.position("exit:api-caller") < journal.nth_position("start:agent", 1));
        assert!(journal.nth_position("start:agent", 1) < journal.nth_position("start:api-caller", 1));
        assert_eq!(report.manifolds["agent"].failures, 0);

        shutdown(&engine).await;
    }

    #[tokio::test]
    async fn test_generic_failure_backs_off_then_resets() {
        let harness = Harness::default();
        let attempts = Arc::new(AtomicU32::new(0));
        let flaky = {
            let harness = harness.clone();
            let attempts = Arc::clone(&attempts);
            Manifold::new(Vec::<String>::new(), move |_ctx: Context| {
                let harness = harness.clone();
                let attempts = Arc::clone(&attempts);
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                        return Err(WorkerError::msg("connection refused"));
                    }
                    Ok(harness.spawn("flaky") as Arc<dyn Worker>)
                }
            })
        };

        let engine = Engine::start(fast_config()).unwrap();
        let began = Instant::now();
        engine.install("flaky", flaky).await.unwrap();
        let report = wait_for_lifecycle(&engine, "flaky", Lifecycle::Started).await;

        // 20ms after the first failure, 40ms after the second
        assert!(began.elapsed() >= Duration::from_millis(60));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(report.manifolds["flaky"].failures, 0);
        assert_eq!(report.manifolds["flaky"].last_error, None);

        harness.worker("flaky").fail(WorkerError::msg("lost connection"));
        let report = wait_for(&engine, "flaky to recover", |report| {
            report.manifolds["flaky"].start_count == 2
                && report.manifolds["flaky"].lifecycle == Lifecycle::Started
        })
        .await;
        assert_eq!(report.manifolds["flaky"].failures, 0);

        shutdown(&engine).await;
    }

    #[tokio::test]
    async fn test_failure_is_reported_while_backing_off() {
        let config = EngineConfig {
            error_delay_ms: 10_000,
            max_error_delay_ms: 10_000,
            ..fast_config()
        };
        let engine = Engine::start(config).unwrap();
        let broken = Manifold::new(Vec::<String>::new(), |_ctx: Context| async move {
            Err::<Arc<dyn Worker>, _>(WorkerError::msg("disk full"))
        });
        engine.install("broken", broken).await.unwrap();

        let report = wait_for(&engine, "first failure", |report| {
            report.manifolds["broken"].failures == 1
        })
        .await;
        assert_eq!(report.manifolds["broken"].lifecycle, Lifecycle::Stopped);
        assert_eq!(report.manifolds["broken"].last_error.as_deref(), Some("disk full"));

        // Shutdown must not wait for the pending retry.
        shutdown(&engine).await;
    }

    #[tokio::test]
    async fn test_unchanged_output_keeps_dependents_running() {
        let harness = Harness::default();
        let value = Arc::new(Mutex::new(json!({ "api_port": 17070 })));
        let notifier: Arc<Mutex<Option<OutputNotifier>>> = Arc::default();

        let config_manifold = {
            let harness = harness.clone();
            let notifier = Arc::clone(&notifier);
            let fingerprint_value = Arc::clone(&value);
            Manifold::new(Vec::<String>::new(), move |ctx: Context| {
                *notifier.lock().unwrap() = Some(ctx.notifier());
                let harness = harness.clone();
                async move { Ok(harness.spawn("config") as Arc<dyn Worker>) }
            })
            .with_output(output_of::<JournalWorker, String, _>(|worker| worker.label.clone()))
            .with_fingerprint(move |_worker| Some(fingerprint_value.lock().unwrap().clone()))
        };

        let engine = Engine::start(fast_config()).unwrap();
        engine.install("config", config_manifold).await.unwrap();
        engine
            .install("reader", harness.manifold("reader", &["config"]))
            .await
            .unwrap();
        let report = wait_for_lifecycle(&engine, "reader", Lifecycle::Started).await;
        let first_version = report.manifolds["config"].version.unwrap();
        let notifier = notifier.lock().unwrap().clone().unwrap();

        assert!(notifier.changed());
        sleep(SETTLE).await;
        let report = engine.report().await.unwrap();
        assert_eq!(report.manifolds["config"].version, Some(first_version));
        assert_eq!(harness.journal.count("start:reader"), 1);

        *value.lock().unwrap() = json!({ "api_port": 17071 });
        assert!(notifier.changed());
        let report = wait_for(&engine, "reader to restart", |report| {
            report.manifolds["reader"].start_count == 2
                && report.manifolds["reader"].lifecycle == Lifecycle::Started
        })
        .await;
        assert!(report.manifolds["config"].version.unwrap() > first_version);
        assert_eq!(harness.journal.count("start:config"), 1);
        assert_eq!(harness.journal.count("exit:reader"), 1);

        shutdown(&engine).await;
    }

    #[tokio::test]
    async fn test_changed_output_restarts_transitively_but_lazily() {
        let harness = Harness::default();
        let port = Arc::new(Mutex::new(json!(17070)));
        let notifier: Arc<Mutex<Option<OutputNotifier>>> = Arc::default();

        let source = {
            let harness = harness.clone();
            let notifier = Arc::clone(&notifier);
            let port = Arc::clone(&port);
            Manifold::new(Vec::<String>::new(), move |ctx: Context| {
                *notifier.lock().unwrap() = Some(ctx.notifier());
                let harness = harness.clone();
                async move { Ok(harness.spawn("controller") as Arc<dyn Worker>) }
            })
            .with_output(output_of::<JournalWorker, String, _>(|worker| worker.label.clone()))
            .with_fingerprint(move |_worker| Some(port.lock().unwrap().clone()))
        };

        let engine = Engine::start(fast_config()).unwrap();
        engine.install("controller", source).await.unwrap();
        engine
            .install("api-caller", harness.manifold("api-caller", &["controller"]))
            .await
            .unwrap();
        engine
            .install("log-sender", harness.manifold("log-sender", &["api-caller"]))
            .await
            .unwrap();
        let report = wait_for_lifecycle(&engine, "log-sender", Lifecycle::Started).await;
        let first_version = report.manifolds["controller"].version.unwrap();

        *port.lock().unwrap() = json!(17071);
        let notifier = notifier.lock().unwrap().clone().unwrap();
        assert!(notifier.changed());
        let report = wait_for(&engine, "readers to restart", |report| {
            ["api-caller", "log-sender"].iter().all(|name| {
                report.manifolds[*name].lifecycle == Lifecycle::Started
                    && report.manifolds[*name].start_count == 2
            })
        })
        .await;

        let journal = &harness.journal;
        // Only the direct reader is told to stop; its own reader follows once it has joined.
        assert!(journal.position("kill:api-caller") < journal.position("kill:log-sender"));
        assert!(journal.position("exit:api-caller") < journal.position("kill:log-sender"));
        assert!(journal.position("exit:log-sender") < journal.nth_position("start:api-caller", 1));
        assert!(journal.nth_position("start:api-caller", 1) < journal.nth_position("start:log-sender", 1));
        assert_eq!(journal.count("start:controller"), 1);
        assert_eq!(report.manifolds["controller"].start_count, 1);
        assert!(report.manifolds["controller"].version.unwrap() > first_version);

        shutdown(&engine).await;
    }

    #[tokio::test]
    async fn test_missing_input_waits_for_availability_without_retrying() {
        let harness = Harness::default();
        let attempts = Arc::new(AtomicU32::new(0));
        let credentials = |issued: bool| {
            Manifold::new(Vec::<String>::new(), move |_ctx: Context| async move {
                Ok(StaticFlagWorker::new(issued) as Arc<dyn Worker>)
            })
            .with_output(Arc::new(flag_output))
            .with_fingerprint(flag_fingerprint)
        };
        let uploader = {
            let harness = harness.clone();
            let attempts = Arc::clone(&attempts);
            Manifold::new(["credentials"], move |ctx: Context| {
                let harness = harness.clone();
                let attempts = Arc::clone(&attempts);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    let issued: Arc<dyn Flag> = ctx.get("credentials")?;
                    if !issued.check() {
                        return Err(WorkerError::Missing);
                    }
                    Ok(harness.spawn("uploader") as Arc<dyn Worker>)
                }
            })
        };

        let engine = Engine::start(fast_config()).unwrap();
        engine.install("uploader", uploader).await.unwrap();
        sleep(SETTLE).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 0);

        for cycle in 1..=3 {
            engine.install("credentials", credentials(false)).await.unwrap();
            eventually("uploader to try again", || attempts.load(Ordering::SeqCst) == cycle).await;
            sleep(SETTLE).await;
            assert_eq!(attempts.load(Ordering::SeqCst), cycle, "retried without an input change");

            engine.uninstall("credentials").await.unwrap();
            wait_for_lifecycle(&engine, "credentials", Lifecycle::Uninstalled).await;
            sleep(SETTLE).await;
            let report = engine.report().await.unwrap();
            assert_eq!(attempts.load(Ordering::SeqCst), cycle);
            assert_eq!(report.lifecycle("uploader"), Some(Lifecycle::Stopped));
            assert_eq!(report.manifolds["uploader"].failures, 0);
            assert_eq!(harness.journal.count("start:uploader"), 0);
        }

        engine.install("credentials", credentials(true)).await.unwrap();
        let report = wait_for_lifecycle(&engine, "uploader", Lifecycle::Started).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert_eq!(report.manifolds["uploader"].start_count, 1);
        assert_eq!(harness.journal.count("start:uploader"), 1);

        shutdown(&engine).await;
    }

    #[tokio::test]
    async fn test_uninstall_sentinel_is_permanent() {
        let harness = Harness::default();
        let attempts = Arc::new(AtomicU32::new(0));
        let one_shot = {
            let attempts = Arc::clone(&attempts);
            Manifold::new(["agent"], move |ctx: Context| {
                let attempts = Arc::clone(&attempts);
                async move {
                    let _tag: String = ctx.get("agent")?;
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<Arc<dyn Worker>, _>(WorkerError::Uninstall)
                }
            })
        };

        let engine = Engine::start(fast_config()).unwrap();
        engine.install("agent", harness.manifold("agent", &[])).await.unwrap();
        engine.install("setter", one_shot).await.unwrap();
        engine
            .install("setter-reader", harness.manifold("setter-reader", &["setter"]))
            .await
            .unwrap();
        wait_for_lifecycle(&engine, "setter", Lifecycle::Uninstalled).await;

        // An input change would normally retrigger a stopped manifold.
        harness.worker("agent").fail(WorkerError::Bounce);
        wait_for(&engine, "agent to restart", |report| {
            report.manifolds["agent"].start_count == 2
        })
        .await;
        sleep(SETTLE).await;

        let report = engine.report().await.unwrap();
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(report.lifecycle("setter"), Some(Lifecycle::Uninstalled));
        assert_eq!(report.lifecycle("setter-reader"), Some(Lifecycle::Stopped));
        assert!(!engine.resources().is_published("setter"));
        assert_eq!(harness.journal.count("start:setter-reader"), 0);

        shutdown(&engine).await;
    }

    #[tokio::test]
    async fn test_type_mismatch_is_a_generic_failure() {
        let harness = Harness::default();
        let engine = Engine::start(fast_config()).unwrap();
        engine.install("agent", harness.manifold("agent", &[])).await.unwrap();
        let confused = Manifold::new(["agent"], |ctx: Context| async move {
            let _port: u64 = ctx.get("agent")?;
            Err::<Arc<dyn Worker>, _>(WorkerError::msg("unreachable"))
        });
        engine.install("confused", confused).await.unwrap();

        let report = wait_for(&engine, "mismatch to be recorded", |report| {
            report.manifolds["confused"].failures >= 1
        })
        .await;
        let last_error = report.manifolds["confused"].last_error.clone().unwrap();
        assert!(last_error.contains("agent"), "unexpected error: {}", last_error);
        assert_eq!(report.lifecycle("agent"), Some(Lifecycle::Started));

        shutdown(&engine).await;
    }

    #[tokio::test]
    async fn test_flag_gates_dependent_until_it_turns_true() {
        let harness = Harness::default();
        let (condition, watched) = watch::channel(false);
        let flag = Manifold::new(Vec::<String>::new(), move |_ctx: Context| {
            let watched = watched.clone();
            async move { Ok(ConditionFlagWorker::new(watched) as Arc<dyn Worker>) }
        })
        .with_output(Arc::new(flag_output))
        .with_fingerprint(flag_fingerprint);

        let engine = Engine::start(fast_config()).unwrap();
        engine.install("db-log-enabled", flag).await.unwrap();
        engine
            .install(
                "log-sender",
                harness.manifold("log-sender", &[]).gated_by(["db-log-enabled"]),
            )
            .await
            .unwrap();
        wait_for_lifecycle(&engine, "db-log-enabled", Lifecycle::Started).await;
        sleep(SETTLE).await;

        let report = engine.report().await.unwrap();
        assert_eq!(report.lifecycle("log-sender"), Some(Lifecycle::Stopped));
        assert_eq!(report.manifolds["log-sender"].failures, 0);
        assert_eq!(harness.journal.count("start:log-sender"), 0);

        condition.send_replace(true);
        wait_for_lifecycle(&engine, "log-sender", Lifecycle::Started).await;

        condition.send_replace(false);
        eventually("log-sender to stop", || harness.journal.count("exit:log-sender") == 1).await;
        let report = wait_for(&engine, "flag to settle on false", |report| {
            report.manifolds["db-log-enabled"].start_count == 3
                && report.manifolds["db-log-enabled"].lifecycle == Lifecycle::Started
        })
        .await;
        assert_eq!(report.manifolds["log-sender"].start_count, 1);
        sleep(SETTLE).await;
        assert_eq!(harness.journal.count("start:log-sender"), 1);

        shutdown(&engine).await;
    }

    #[tokio::test]
    async fn test_input_change_aborts_slow_start() {
        let harness = Harness::default();
        let slow = {
            let harness = harness.clone();
            Manifold::new(["agent"], move |ctx: Context| {
                let harness = harness.clone();
                async move {
                    let abort = ctx.abort();
                    tokio::select! {
                        _ = abort.cancelled() => {
                            harness.journal.push("abort:slow");
                            Err(WorkerError::msg("start aborted"))
                        }
                        _ = sleep(Duration::from_millis(150)) => {
                            Ok(harness.spawn("slow") as Arc<dyn Worker>)
                        }
                    }
                }
            })
        };

        let engine = Engine::start(fast_config()).unwrap();
        engine.install("agent", harness.manifold("agent", &[])).await.unwrap();
        engine.install("slow", slow).await.unwrap();
        wait_for_lifecycle(&engine, "slow", Lifecycle::Starting).await;

        harness.worker("agent").fail(WorkerError::Bounce);
        let report = wait_for_lifecycle(&engine, "slow", Lifecycle::Started).await;

        assert_eq!(harness.journal.count("abort:slow"), 1);
        assert!(harness.journal.position("abort:slow") < harness.journal.nth_position("start:agent", 1));
        assert_eq!(report.manifolds["slow"].start_count, 1);
        assert_eq!(report.manifolds["slow"].failures, 0);

        shutdown(&engine).await;
    }

    #[tokio::test]
    async fn test_start_abandoned_mid_flight_is_not_counted() {
        let harness = Harness::default();
        let stubborn = {
            let harness = harness.clone();
            Manifold::new(["agent"], move |_ctx: Context| {
                let harness = harness.clone();
                async move {
                    // Ignores the abort token on purpose.
                    sleep(Duration::from_millis(100)).await;
                    Ok(harness.spawn("stubborn") as Arc<dyn Worker>)
                }
            })
        };

        let engine = Engine::start(fast_config()).unwrap();
        engine.install("agent", harness.manifold("agent", &[])).await.unwrap();
        engine.install("stubborn", stubborn).await.unwrap();
        wait_for_lifecycle(&engine, "stubborn", Lifecycle::Starting).await;

        harness.worker("agent").fail(WorkerError::Bounce);
        let report = wait_for(&engine, "stubborn to start against the new agent", |report| {
            report.manifolds["agent"].start_count == 2
                && report.manifolds["stubborn"].lifecycle == Lifecycle::Started
        })
        .await;

        let journal = &harness.journal;
        assert_eq!(journal.count("start:stubborn"), 2);
        assert!(journal.position("exit:stubborn") < journal.nth_position("start:agent", 1));
        assert_eq!(report.manifolds["stubborn"].start_count, 1);

        shutdown(&engine).await;
    }

    #[tokio::test]
    async fn test_install_rejects_self_dependency_and_cycles() {
        let harness = Harness::default();
        let engine = Engine::start(fast_config()).unwrap();

        let err = engine
            .install("agent", harness.manifold("agent", &["agent"]))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::SelfDependency("agent".to_string()));

        engine.install("a", harness.manifold("a", &["c"])).await.unwrap();
        engine.install("b", harness.manifold("b", &["a"])).await.unwrap();
        let err = engine
            .install("c", harness.manifold("c", &["b"]))
            .await
            .unwrap_err();
        match err {
            EngineError::Cycle(path) => {
                assert_eq!(path.first(), path.last());
                assert_eq!(path.len(), 4);
            }
            other => panic!("expected a cycle, got {:?}", other),
        }

        let report = engine.report().await.unwrap();
        assert!(!report.manifolds.contains_key("c"));
        assert!(!report.manifolds.contains_key("agent"));
        assert_eq!(report.lifecycle("a"), Some(Lifecycle::Stopped));

        shutdown(&engine).await;
    }

    #[tokio::test]
    async fn test_reinstall_replaces_running_manifold() {
        let harness = Harness::default();
        let engine = Engine::start(fast_config()).unwrap();
        engine.install("agent", harness.manifold("agent", &[])).await.unwrap();
        engine
            .install("api-caller", harness.manifold("api-caller", &["agent"]))
            .await
            .unwrap();
        wait_for_lifecycle(&engine, "api-caller", Lifecycle::Started).await;

        engine.install("agent", harness.manifold("agent-v2", &[])).await.unwrap();
        eventually("api-caller to restart", || {
            harness.journal.count("start:api-caller") == 2
        })
        .await;

        let journal = &harness.journal;
        assert!(journal.position("exit:api-caller") < journal.position("exit:agent"));
        assert!(journal.position("exit:agent") < journal.position("start:agent-v2"));
        assert!(journal.position("start:agent-v2") < journal.nth_position("start:api-caller", 1));

        shutdown(&engine).await;
    }

    #[tokio::test]
    async fn test_external_uninstall_and_revival() {
        let harness = Harness::default();
        let engine = Engine::start(fast_config()).unwrap();
        engine.install("agent", harness.manifold("agent", &[])).await.unwrap();
        engine
            .install("api-caller", harness.manifold("api-caller", &["agent"]))
            .await
            .unwrap();
        wait_for_lifecycle(&engine, "api-caller", Lifecycle::Started).await;

        engine.uninstall("agent").await.unwrap();
        let report = wait_for_lifecycle(&engine, "agent", Lifecycle::Uninstalled).await;
        assert_eq!(report.lifecycle("api-caller"), Some(Lifecycle::Stopped));
        assert!(harness.journal.position("exit:api-caller") < harness.journal.position("kill:agent"));

        assert_eq!(
            engine.uninstall("agent").await,
            Err(EngineError::NotInstalled("agent".to_string()))
        );
        assert_eq!(
            engine.uninstall("nothing").await,
            Err(EngineError::NotInstalled("nothing".to_string()))
        );

        engine.install("agent", harness.manifold("agent", &[])).await.unwrap();
        wait_for(&engine, "api-caller to come back", |report| {
            report.manifolds["api-caller"].start_count == 2
                && report.manifolds["api-caller"].lifecycle == Lifecycle::Started
        })
        .await;

        shutdown(&engine).await;
    }

    #[tokio::test]
    async fn test_fatal_error_stops_engine() {
        let harness = Harness::default();
        let engine = started_chain(&harness).await;

        harness
            .worker("api-caller")
            .fail(WorkerError::fatal(anyhow::anyhow!("agent config corrupted")));
        let outcome = timeout(PATIENCE, engine.wait()).await.expect("engine stops");

        match outcome {
            Err(WorkerError::Fatal(cause)) => assert_eq!(cause.to_string(), "agent config corrupted"),
            other => panic!("expected fatal outcome, got {:?}", other),
        }
        let journal = &harness.journal;
        assert!(journal.position("exit:log-sender") < journal.position("kill:agent"));
        assert_eq!(journal.count("exit:agent"), 1);
        assert!(matches!(engine.report().await, Err(EngineError::Dying)));
    }

    #[tokio::test]
    async fn test_engine_nests_as_worker() {
        let harness = Harness::default();
        let nested = {
            let harness = harness.clone();
            Manifold::new(Vec::<String>::new(), move |_ctx: Context| {
                let harness = harness.clone();
                async move {
                    let inner = Engine::start(fast_config()).map_err(WorkerError::other)?;
                    inner
                        .install("inner-agent", harness.manifold("inner-agent", &[]))
                        .await
                        .map_err(WorkerError::other)?;
                    Ok(Arc::new(inner) as Arc<dyn Worker>)
                }
            })
        };

        let engine = Engine::start(fast_config()).unwrap();
        engine.install("subsystem", nested).await.unwrap();
        wait_for_lifecycle(&engine, "subsystem", Lifecycle::Started).await;
        eventually("inner worker to start", || harness.journal.count("start:inner-agent") == 1).await;

        shutdown(&engine).await;
        assert_eq!(harness.journal.count("exit:inner-agent"), 1);
    }

    #[tokio::test]
    async fn test_requests_after_shutdown_are_refused() {
        let harness = Harness::default();
        let engine = Engine::start(fast_config()).unwrap();
        shutdown(&engine).await;

        assert_eq!(
            engine.install("agent", harness.manifold("agent", &[])).await,
            Err(EngineError::Dying)
        );
        assert_eq!(engine.uninstall("agent").await, Err(EngineError::Dying));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_up_front() {
        let config = EngineConfig {
            error_delay_ms: 0,
            ..fast_config()
        };
        assert!(matches!(Engine::start(config), Err(EngineError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_report_serialises_for_status_output() {
        let harness = Harness::default();
        let engine = Engine::start(fast_config()).unwrap();
        engine.install("agent", harness.manifold("agent", &[])).await.unwrap();
        let report = wait_for_lifecycle(&engine, "agent", Lifecycle::Started).await;

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["state"], "running");
        assert_eq!(value["manifolds"]["agent"]["lifecycle"], "started");
        assert_eq!(value["manifolds"]["agent"]["start_count"], 1);
        assert!(value["manifolds"]["agent"].get("last_error").is_none());

        shutdown(&engine).await;
    }

    mod demo_agent {
        use super::*;
        use crate::demo::{
            agent_manifolds, Agent, DemoConfig, AGENT, IS_CONTROLLER, LOG_SENDER, SERVING_INFO_SETTER,
        };
        use crate::traits::Flag;
        use std::collections::BTreeSet;

        /// Installs the demo agent plus a probe that captures the shared
        /// agent handle and the controller flag value.
        async fn run_demo(config: DemoConfig) -> (Engine, Arc<Mutex<Option<(Agent, bool)>>>) {
            let captured: Arc<Mutex<Option<(Agent, bool)>>> = Arc::default();
            let probe = {
                let captured = Arc::clone(&captured);
                Manifold::new([AGENT, IS_CONTROLLER], move |ctx: Context| {
                    let captured = Arc::clone(&captured);
                    async move {
                        let agent: Agent = ctx.get(AGENT)?;
                        let flag: Arc<dyn Flag> = ctx.get(IS_CONTROLLER)?;
                        *captured.lock().unwrap() = Some((agent, flag.check()));
                        Err::<Arc<dyn Worker>, _>(WorkerError::Uninstall)
                    }
                })
            };

            let engine = Engine::start(fast_config()).unwrap();
            engine.install_all(agent_manifolds(&config)).await.unwrap();
            engine.install("probe", probe).await.unwrap();
            wait_for(&engine, "demo to settle", |report| {
                report.lifecycle(SERVING_INFO_SETTER) == Some(Lifecycle::Uninstalled)
                    && report.lifecycle("probe") == Some(Lifecycle::Uninstalled)
                    && report.lifecycle(IS_CONTROLLER) == Some(Lifecycle::Started)
            })
            .await;
            (engine, captured)
        }

        #[tokio::test]
        async fn test_controller_gets_serving_info() {
            let (engine, captured) = run_demo(DemoConfig::default()).await;
            let report = wait_for_lifecycle(&engine, LOG_SENDER, Lifecycle::Started).await;

            let (agent, is_controller) = captured.lock().unwrap().clone().unwrap();
            assert!(is_controller);
            assert_eq!(
                agent.serving_info().as_deref(),
                Some("state-serving-info for machine-0")
            );
            assert_eq!(report.manifolds[SERVING_INFO_SETTER].start_count, 0);

            shutdown(&engine).await;
        }

        #[tokio::test]
        async fn test_plain_machine_without_db_logging() {
            let config = DemoConfig {
                machine_tag: "machine-5".to_string(),
                controllers: BTreeSet::from(["machine-0".to_string()]),
                db_log_enabled: false,
            };
            let (engine, captured) = run_demo(config).await;
            sleep(SETTLE).await;

            let (agent, is_controller) = captured.lock().unwrap().clone().unwrap();
            assert!(!is_controller);
            assert_eq!(agent.serving_info(), None);

            let report = engine.report().await.unwrap();
            assert_eq!(report.lifecycle(LOG_SENDER), Some(Lifecycle::Stopped));
            assert_eq!(report.manifolds[LOG_SENDER].start_count, 0);
            assert_eq!(report.manifolds[LOG_SENDER].failures, 0);

            shutdown(&engine).await;
        }
    }
}
