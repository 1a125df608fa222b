use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use jobagg_storage::{ListingStore, MemoryListingStore, PgListingStore};
use jobagg_sync::{Aggregator, AggregatorConfig, TriggerSource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "jobagg-cli")]
#[command(about = "Job listing aggregator command-line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one aggregation and wait for it to finish.
    Sync {
        /// Write to an in-process store instead of Postgres.
        #[arg(long)]
        memory: bool,
    },
    /// Apply database migrations.
    Migrate,
    /// Serve the trigger API and run the scheduler.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,jobagg_sync=debug,jobagg_adapters=debug,jobagg_storage=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    let config = AggregatorConfig::from_env();

    match cli.command.unwrap_or(Commands::Sync { memory: false }) {
        Commands::Sync { memory } => {
            let store: Arc<dyn ListingStore> = if memory {
                Arc::new(MemoryListingStore::new())
            } else {
                Arc::new(PgListingStore::connect(&config.database_url).await?)
            };
            let aggregator = Aggregator::from_config(&config, store).await?;
            let summary = aggregator.run_aggregation(TriggerSource::Cli).await?;
            for provider in &summary.providers {
                match &provider.error {
                    Some(err) => println!("  {}: failed ({err})", provider.provider),
                    None => println!("  {}: {} listings", provider.provider, provider.listings),
                }
            }
            println!(
                "sync complete: run_id={} fetched={} stored={} existing={} failed={}",
                summary.run_id,
                summary.total_listings,
                summary.stored,
                summary.skipped_existing,
                summary.failed
            );
        }
        Commands::Migrate => {
            let store = PgListingStore::connect(&config.database_url).await?;
            store.migrate().await?;
            tracing::info!("migrations applied");
        }
        Commands::Serve => {
            jobagg_web::serve_from_env().await?;
        }
    }

    Ok(())
}
