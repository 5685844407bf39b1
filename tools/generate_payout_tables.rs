//! Offline payout table generator
//!
//! Builds the per-reel-count lookup tables from the reference rules, writes
//! them as a bincode artefact the server loads via `tables.artefact_path`,
//! and prints fast-path coverage for each reel count.

use clap::Parser;
use reelvault::{
    payouts::{PayoutClassifier, PayoutTables},
    ConfigLoader, SlotResult,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "generate_payout_tables")]
#[command(about = "Generate the payout lookup table artefact")]
struct Args {
    /// Output artefact path
    #[arg(short, long, default_value = "payout_tables.bin")]
    output: PathBuf,

    /// Configuration file supplying the table limits
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print coverage only
    #[arg(long)]
    dry_run: bool,
}

fn main() -> SlotResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "reelvault=info".into()))
        .init();

    let args = Args::parse();
    let loader = match args.config {
        Some(ref path) => ConfigLoader::new().with_path(path),
        None => ConfigLoader::new(),
    };
    let mut table_config = loader.load()?.tables;
    // the artefact is generated, never read, here
    table_config.artefact_path = None;

    let (tables, reports) = PayoutTables::generate_with_report(&table_config)?;

    println!(
        "{:>5} {:>8} {:>8} {:>8} {:>10} {:>10}  shards",
        "reels", "combos", "certain", "stored", "fast-path", "tentative"
    );
    for report in &reports {
        println!(
            "{:>5} {:>8} {:>8} {:>8} {:>9.2}% {:>9.2}%  {:?}",
            report.reel_count,
            report.combinations,
            report.certain,
            report.stored,
            report.certain_share() * 100.0,
            report.tentative_accuracy() * 100.0,
            report.shard_sizes
        );
    }

    if args.dry_run {
        return Ok(());
    }

    tables.save(&args.output)?;
    // read it back through the same validation the server applies
    let reloaded = PayoutTables::load(&args.output, &table_config)?;
    let classifier = PayoutClassifier::new(reloaded);
    println!(
        "Wrote {} ({} tables, {} stored entries)",
        args.output.display(),
        classifier.tables().tables().len(),
        classifier.tables().tables().iter().map(|t| t.len()).sum::<usize>()
    );

    Ok(())
}
