// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::time::Duration;

use anyhow::Context as _;
use manifold_engine::config::{load_and_validate_config, EngineConfig};
use manifold_engine::demo::{agent_manifolds, DemoConfig};
use manifold_engine::engine::{Engine, EngineReport};
use manifold_engine::observability::init_tracing;
use manifold_engine::traits::Worker;

const SETTLE_TIME: Duration = Duration::from_millis(200);

/// Command line options for the demo agent
struct Options {
    config_path: Option<String>,
    demo: DemoConfig,
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [--config <engine.yaml|engine.toml>] [--machine <tag>] [--no-db-log]", program);
    eprintln!("Example: {} --machine machine-7", program);
    eprintln!("Example: {} --config engine.yaml --no-db-log", program);
}

fn parse_args(args: &[String]) -> Option<Options> {
    let mut options = Options {
        config_path: None,
        demo: DemoConfig::default(),
    };
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--config" => options.config_path = Some(rest.next()?.clone()),
            "--machine" => options.demo.machine_tag = rest.next()?.clone(),
            "--no-db-log" => options.demo.db_log_enabled = false,
            _ => return None,
        }
    }
    Some(options)
}

fn print_report(title: &str, report: &EngineReport) -> anyhow::Result<()> {
    println!("{}", title);
    println!("{}", "─".repeat(60));
    println!("{}", serde_json::to_string_pretty(report)?);
    println!();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let Some(options) = parse_args(&args) else {
        print_usage(&args[0]);
        std::process::exit(1);
    };

    let config = match &options.config_path {
        Some(path) => load_and_validate_config(path).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!("Configuration validation failed:\n{}", messages.join("\n"))
        })?,
        None => EngineConfig::default(),
    };

    println!("Manifold engine demo agent: {}", options.demo.machine_tag);
    println!();

    let engine = Engine::start(config).context("starting dependency engine")?;
    engine
        .install_all(agent_manifolds(&options.demo))
        .await
        .context("installing demo manifolds")?;

    tokio::time::sleep(SETTLE_TIME).await;
    print_report("Engine state after startup", &engine.report().await?)?;
    println!("Published outputs: {}", engine.resources().published().join(", "));
    println!();

    println!("Press Ctrl-C to stop the agent.");
    tokio::select! {
        signal = tokio::signal::ctrl_c() => signal.context("waiting for Ctrl-C")?,
        result = engine.wait() => {
            result.context("dependency engine stopped unexpectedly")?;
            return Ok(());
        }
    }

    engine.kill();
    engine.wait().await.context("dependency engine shut down with an error")?;
    println!("Agent stopped cleanly.");
    Ok(())
}
