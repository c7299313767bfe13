use std::sync::Arc;

use chrono::{TimeZone, Utc};
use clap::Parser;
use tracing::info;

use releasebot::cli::{Cli, Commands};
use releasebot::config::Config;
use releasebot::errors::BotResult;
use releasebot::logging;
use releasebot::services::{CycleService, Notifier, Scheduler, WebhookNotifier};
use releasebot::sources::{HttpFetcher, SourceRegistry};
use releasebot::storage::{JsonFileStore, WatermarkStore};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> BotResult<()> {
    let cli = Cli::parse();

    // Load configuration; a missing webhook ends the process here
    let config = Config::from_env()?;

    logging::init();

    let store = JsonFileStore::new(&config.state_path);
    let registry = SourceRegistry::new();

    match cli.command {
        Commands::Run { once, debug } => cmd_run(config, store, registry, once, debug),
        Commands::Status => cmd_status(store, registry),
        Commands::Sources => cmd_sources(registry),
    }
}

fn cmd_run(
    config: Config,
    store: JsonFileStore,
    registry: SourceRegistry,
    once: bool,
    debug: bool,
) -> BotResult<()> {
    let once = once || config.once;
    let debug = debug || config.debug;

    let notifier: Option<Box<dyn Notifier>> = if debug {
        info!("debug mode: notifications will be logged, not sent");
        None
    } else {
        Some(Box::new(
            WebhookNotifier::new(&config)?.with_username("RouterOS releases"),
        ))
    };

    let fetcher = Arc::new(HttpFetcher::new(config.request_timeout)?);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let state = store.load();
        info!(
            state = %config.state_path.display(),
            sources = registry.sources().len(),
            once,
            "releasebot starting"
        );

        let cycle = CycleService::new(registry, fetcher, store, notifier);
        Scheduler::new(cycle, config.poll_interval, once)
            .run(state)
            .await;
    });

    Ok(())
}

fn cmd_status(store: JsonFileStore, registry: SourceRegistry) -> BotResult<()> {
    let state = store.load();

    println!("State file: {}\n", store.path().display());

    for source in registry.sources() {
        if !state.last_seen_timestamp.contains_key(source.key()) {
            continue;
        }
        let ts = state.timestamp(source.key());
        let when = Utc
            .timestamp_millis_opt(ts)
            .single()
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| ts.to_string());
        println!("  {}: {}", source.name(), when);
    }

    // Keys no longer polled are still shown
    for (key, ts) in &state.last_seen_timestamp {
        if registry.find(key).is_none() {
            println!("  {} (not polled): {}", key, ts);
        }
    }

    if state.last_seen_version.is_empty() {
        println!("  WinBox: never seen");
    } else {
        println!("  WinBox: {}", state.last_seen_version);
    }

    Ok(())
}

fn cmd_sources(registry: SourceRegistry) -> BotResult<()> {
    println!("Polled sources:\n");
    for source in registry.sources() {
        let category = source
            .default_category()
            .map(|c| c.label())
            .unwrap_or("-");
        println!("  {} [{}]", source.name(), category);
        println!("    {}", source.key());
    }

    Ok(())
}
