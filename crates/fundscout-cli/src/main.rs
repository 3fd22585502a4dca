use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fundscout_core::{load_sources, AppConfig};
use fundscout_pipeline::{Cadences, Orchestrator, RunSettings, Scheduler};
use fundscout_scraper::{AdapterRegistry, AdapterSettings};
use fundscout_store::{MemoryStore, OpportunityStore};

const ACTIVITY_LIMIT: usize = 50;

#[derive(Debug, Parser)]
#[command(name = "fundscout")]
#[command(about = "Collect graduate funding opportunities from configured sources")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one collection pass and print the summary as JSON
    Run {
        /// Also print the activity records written by the pass
        #[arg(long)]
        activity: bool,
    },
    /// Run on the configured cron cadences until interrupted
    Daemon {
        /// Start with an immediate pass before waiting for the first timer
        #[arg(long)]
        run_now: bool,
    },
    /// Validate the source registry and list its entries
    Sources,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = fundscout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Run { activity } => run(&config, activity).await,
        Commands::Daemon { run_now } => daemon(&config, run_now).await,
        Commands::Sources => list_sources(&config),
    }
}

/// Store seeded from the registry, plus a scheduler over it.
fn build(config: &AppConfig) -> anyhow::Result<(Arc<MemoryStore>, Scheduler)> {
    let registry = load_sources(&config.sources_path)
        .with_context(|| format!("loading {}", config.sources_path.display()))?;
    let store = Arc::new(MemoryStore::with_sources(registry.to_sources()));

    let adapters = AdapterRegistry::new(&AdapterSettings::from_config(config))
        .context("building source adapters")?;
    let orchestrator = Orchestrator::new(
        store.clone(),
        Arc::new(adapters),
        RunSettings::from_config(config),
    );
    let scheduler = Scheduler::new(Arc::new(orchestrator), Cadences::from_config(config));
    Ok((store, scheduler))
}

async fn run(config: &AppConfig, show_activity: bool) -> anyhow::Result<()> {
    let (store, scheduler) = build(config)?;
    let summary = scheduler.run_once().await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if show_activity {
        let activity = store.list_activity(ACTIVITY_LIMIT).await?;
        println!("{}", serde_json::to_string_pretty(&activity)?);
    }
    Ok(())
}

async fn daemon(config: &AppConfig, run_now: bool) -> anyhow::Result<()> {
    let (_store, scheduler) = build(config)?;
    tracing::info!(env = %config.env, "starting fundscout daemon");

    scheduler.start_schedule().await?;

    if run_now {
        match scheduler.run_once().await {
            Ok(summary) => tracing::info!(
                stored = summary.total_opportunities_stored,
                duplicates = summary.total_duplicates_filtered,
                failed = summary.errors.len(),
                "initial run complete"
            ),
            Err(e) => tracing::error!(error = %e, "initial run failed"),
        }
    }

    shutdown_signal().await;
    scheduler.shutdown().await?;
    Ok(())
}

fn list_sources(config: &AppConfig) -> anyhow::Result<()> {
    let registry = load_sources(&config.sources_path)
        .with_context(|| format!("loading {}", config.sources_path.display()))?;
    for source in registry.to_sources() {
        let state = if source.is_active { "active" } else { "inactive" };
        println!(
            "{:<32} {:<16} {:<8} {}",
            source.id,
            source.category.to_string(),
            state,
            source.url
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping scheduler");
}
