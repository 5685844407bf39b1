//! Spin simulator
//!
//! Drives spins for a set of players through the in-process VRF oracle and
//! reports player and game statistics once every spin has settled.

use chrono::Utc;
use clap::Parser;
use rand::{rngs::StdRng, Rng, SeedableRng};
use reelvault::{
    common::types::current_timestamp_secs,
    payouts::{MAX_REELS, MIN_REELS},
    Amount, SlotConfig, SlotMachineFactory, SlotResult, SpinStatus, StaticPriceFeed, CREDIT_UNIT,
};
use std::{
    collections::BTreeMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spin_simulator")]
#[command(about = "Simulate players spinning against an in-memory slot machine")]
struct Args {
    /// Total spins to place
    #[arg(short, long, default_value = "1000")]
    spins: usize,

    /// Number of players
    #[arg(short, long, default_value = "10")]
    players: usize,

    /// Fixed reel count; random in [3, 7] when absent
    #[arg(short, long)]
    reels: Option<u8>,

    /// Whole credits deposited per player
    #[arg(long, default_value = "1000")]
    deposit: u64,

    /// Whole credits seeded into the house bankroll
    #[arg(long, default_value = "100000")]
    house: u64,

    /// Whole credits seeded into the prize pool
    #[arg(long, default_value = "1000")]
    prize_pool: u64,

    /// Seed for player and reel-count selection
    #[arg(long, default_value = "7")]
    seed: u64,
}

fn credits(whole: u64) -> Amount {
    whole as Amount * CREDIT_UNIT
}

fn fmt_credits(amount: Amount) -> String {
    format!("{:.4}", amount as f64 / CREDIT_UNIT as f64)
}

#[tokio::main]
async fn main() -> SlotResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "reelvault=warn,spin_simulator=info".into()))
        .init();

    let args = Args::parse();
    let feed = Arc::new(StaticPriceFeed::with_prices(2_500, 15, current_timestamp_secs()));
    let handle = SlotMachineFactory::create(SlotConfig::testing(), feed).await?;
    let machine = handle.machine();

    let players: Vec<String> = (0..args.players.max(1)).map(|i| format!("player-{:03}", i)).collect();
    for player in &players {
        machine.deposit(player, credits(args.deposit))?;
    }
    if args.house > 0 {
        machine.fund_house(credits(args.house))?;
    }
    if args.prize_pool > 0 {
        machine.fund_prize_pool(credits(args.prize_pool))?;
    }

    info!(
        spins = args.spins,
        players = players.len(),
        started_at = %Utc::now().to_rfc3339(),
        "Simulation started"
    );

    let mut rng = StdRng::seed_from_u64(args.seed);
    let started = Instant::now();
    let mut refused: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut placed = Vec::with_capacity(args.spins);

    for _ in 0..args.spins {
        let player = &players[rng.gen_range(0..players.len())];
        let reels = args.reels.unwrap_or_else(|| rng.gen_range(MIN_REELS..=MAX_REELS));

        match machine.spin(player, reels, credits(args.deposit)) {
            Ok(id) => placed.push(id),
            Err(e) => *refused.entry(e.kind().as_str()).or_insert(0) += 1,
        }
    }

    let mut unsettled = 0;
    for id in &placed {
        let result = machine.wait_for_result(*id, Duration::from_secs(10)).await?;
        if result.status != SpinStatus::Settled {
            unsettled += 1;
        }
    }
    if unsettled > 0 {
        warn!(unsettled, "Spins still unsettled after waiting");
    }

    let elapsed = started.elapsed();
    let stats = machine.stats();

    println!("Spins placed: {} in {:.2?} ({:.0}/s)", placed.len(), elapsed, placed.len() as f64 / elapsed.as_secs_f64().max(1e-9));
    for (kind, count) in &refused {
        println!("  refused {:<24} {}", kind, count);
    }
    println!("Settled: {}", stats.game.settled_spins);
    println!("Wagered: {}", fmt_credits(stats.game.total_wagered));
    println!("Paid: {}", fmt_credits(stats.game.total_paid));
    println!("Shortfall: {}", fmt_credits(stats.game.total_shortfall));
    if stats.game.total_wagered > 0 {
        println!("Return to player: {:.2}%", stats.game.total_paid as f64 / stats.game.total_wagered as f64 * 100.0);
    }
    println!("Prize pool: {}", fmt_credits(stats.prize_pool));
    println!("House bankroll: {}", fmt_credits(stats.house_bankroll));
    println!("Conserved: {}", stats.conserved);

    println!("\nTiers:");
    for (tier, count) in &stats.game.tier_counts {
        println!("  {:<14} {:>8} ({:.2}%)", tier.name(), count, *count as f64 / stats.game.settled_spins.max(1) as f64 * 100.0);
    }

    println!("\nPlayers:");
    for player in &players {
        let player_stats = machine.player_stats(player);
        println!(
            "  {}  balance {:>14}  spins {:>5}  wagered {:>12}  won {:>12}  jackpots {}",
            player,
            fmt_credits(machine.balance(player)),
            player_stats.total_spins,
            fmt_credits(player_stats.total_wagered),
            fmt_credits(player_stats.total_won),
            player_stats.jackpots_won
        );
    }

    Ok(())
}
