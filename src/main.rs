//! Reelvault server binary
//!
//! Runs the slot machine behind the HTTP API with an in-process VRF oracle,
//! and offers offline inspection of a RocksDB data directory.

use clap::{Parser, Subcommand};
use reelvault::{
    api::{ApiServer, AppState},
    common::types::current_timestamp_secs,
    config::StorageBackend,
    errors::SlotResult,
    spin_store,
    storage::OptimizedStorage,
    ConfigLoader, SlotMachineFactory, StaticPriceFeed, CREDIT_UNIT,
};
use std::{path::PathBuf, sync::Arc};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Reelvault slot machine settlement service
#[derive(Parser)]
#[command(name = "reelvault")]
#[command(about = "Wager settlement core of a reel slot machine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Initial base-asset price in whole USD
        #[arg(long, default_value = "2500")]
        base_price_usd: u64,

        /// Initial fee-asset price in whole USD
        #[arg(long, default_value = "15")]
        fee_price_usd: u64,

        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Summarize the state stored in a data directory
    InspectDb {
        /// Path to database directory (defaults to the configured one)
        #[arg(short, long)]
        db_path: Option<PathBuf>,
    },

    /// Write the effective configuration as TOML
    WriteConfig {
        #[arg(short, long, default_value = "reelvault.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> SlotResult<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "reelvault=debug,tower_http=debug"
    } else {
        "reelvault=info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .init();

    let loader = match cli.config {
        Some(ref path) => ConfigLoader::new().with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;

    match cli.command {
        Commands::Serve {
            base_price_usd,
            fee_price_usd,
            port,
        } => {
            if let Some(port) = port {
                config.api.port = port;
            }

            let feed = Arc::new(StaticPriceFeed::with_prices(
                base_price_usd,
                fee_price_usd,
                current_timestamp_secs(),
            ));
            let handle = SlotMachineFactory::create(config.clone(), feed.clone()).await?;

            let state = Arc::new(AppState {
                machine: handle.machine().clone(),
                price_feed: Some(feed),
                version: env!("CARGO_PKG_VERSION").to_string(),
                result_wait: config.result_wait(),
                vrf_public_key: Some(handle.vrf_public_key().to_string()),
            });

            info!(
                backend = ?handle.backend(),
                shortfall_policy = ?config.ledger.shortfall_policy,
                "Starting reelvault"
            );
            ApiServer::new(config.api.clone(), state).run().await
        }
        Commands::InspectDb { db_path } => {
            let path = db_path.unwrap_or_else(|| PathBuf::from(&config.storage.data_dir));
            inspect_database(path, config.storage.backend)
        }
        Commands::WriteConfig { output } => {
            loader.save(&config, &output.to_string_lossy())?;
            println!("Configuration written to {}", output.display());
            Ok(())
        }
    }
}

fn inspect_database(path: PathBuf, backend: StorageBackend) -> SlotResult<()> {
    if backend == StorageBackend::Memory {
        println!("Configured backend is in-memory; inspecting {} anyway", path.display());
    }

    let storage = OptimizedStorage::new(&path)?;
    let state = spin_store::load_state(&storage)?;

    let settled = state.records.iter().filter(|r| r.is_settled()).count();
    let pending = state.records.iter().filter(|r| !r.fulfilled).count();
    let ledger = &state.ledger;

    println!("Database: {}", path.display());
    println!("Spin records: {} ({} settled, {} pending)", state.records.len(), settled, pending);
    println!("Last request id: {:?}", state.max_request_id());
    println!("Players: {}", ledger.balances.len());
    println!("Prize pool: {}", format_credits(ledger.prize_pool));
    println!("House bankroll: {}", format_credits(ledger.house));
    println!("Total wagered: {}", format_credits(ledger.game_stats.total_wagered));
    println!("Total paid: {}", format_credits(ledger.game_stats.total_paid));
    for (tier, count) in &ledger.game_stats.tier_counts {
        println!("  {:<14} {}", tier.name(), count);
    }

    let mut players: Vec<_> = ledger.balances.iter().collect();
    players.sort_by(|a, b| b.1.cmp(a.1));
    for (player, balance) in players.into_iter().take(10) {
        println!("  {:<20} {}", player, format_credits(*balance));
    }

    Ok(())
}

fn format_credits(amount: u128) -> String {
    format!("{}.{:04}", amount / CREDIT_UNIT, amount % CREDIT_UNIT / (CREDIT_UNIT / 10_000))
}
