//! drip-sim: simulate and inspect the dual-stream drip scheduler.
//!
//! `simulate` runs a configure-then-trigger-bot scenario against in-memory
//! collaborators and reports per-stream totals. `inspect` loads a saved
//! ledger snapshot and shows what a trigger would do at a given time.

mod scenario;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use clap::{Args, Parser, Subcommand};
use drip_core::constants::{DEFAULT_MIN_INTERVAL_SECS, SECONDS_PER_DAY};
use drip_core::types::StreamId;
use drip_engine::{SchedulerConfig, StreamLedger};
use scenario::{Outage, Scenario, Summary};
use tracing::info;

#[derive(Parser)]
#[command(name = "drip-sim")]
#[command(version, about = "Dual-stream linear emission scheduler simulator")]
struct Cli {
    /// Config file (default: <config dir>/drip/drip.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the minimum seconds between trigger settlements.
    #[arg(long, global = true)]
    min_interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure both streams and run a jittered trigger bot until they drain.
    Simulate(SimulateArgs),
    /// Show stream states and a trigger preview from a ledger snapshot.
    Inspect(InspectArgs),
}

#[derive(Args)]
struct SimulateArgs {
    /// Amount configured on the primary stream.
    #[arg(long, default_value_t = 1_000_000_000)]
    primary: u64,

    /// Amount configured on the secondary stream.
    #[arg(long, default_value_t = 1_000_000_000)]
    secondary: u64,

    /// Schedule length in days.
    #[arg(long, default_value_t = 30)]
    days: u64,

    /// Average seconds between trigger calls.
    #[arg(long, default_value_t = DEFAULT_MIN_INTERVAL_SECS)]
    cadence: u64,

    /// Maximum deviation from the cadence in seconds.
    #[arg(long, default_value_t = DEFAULT_MIN_INTERVAL_SECS / 2)]
    jitter: u64,

    /// Eligible weight reported by the accumulator outside outages.
    #[arg(long, default_value_t = 1)]
    weight: u64,

    /// Day (from start) at which recipients become ineligible.
    #[arg(long)]
    outage_start: Option<u64>,

    /// Length of the outage in days.
    #[arg(long, default_value_t = 1, requires = "outage_start")]
    outage_days: u64,

    /// RNG seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Start timestamp in unix seconds (default: now).
    #[arg(long)]
    start: Option<u64>,

    /// Write the final ledger snapshot to this file.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct InspectArgs {
    /// Ledger snapshot file.
    snapshot: PathBuf,

    /// Timestamp to evaluate at in unix seconds (default: now).
    #[arg(long)]
    now: Option<u64>,

    /// Eligible weight to assume for the secondary stream gate.
    #[arg(long, default_value_t = 1)]
    weight: u64,

    /// Print as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    let config = load_config(&cli)?;
    info!(min_interval_secs = config.min_interval_secs, "configuration loaded");

    match cli.command {
        Commands::Simulate(args) => cmd_simulate(args, config),
        Commands::Inspect(args) => cmd_inspect(args, &config),
    }
}

fn cmd_simulate(args: SimulateArgs, config: SchedulerConfig) -> Result<()> {
    if args.days == 0 {
        bail!("--days must be at least 1");
    }
    if args.cadence == 0 {
        bail!("--cadence must be at least 1 second");
    }

    let scenario = Scenario {
        start: match args.start {
            Some(start) => start,
            None => unix_now()?,
        },
        days: args.days,
        primary_amount: args.primary,
        secondary_amount: args.secondary,
        cadence_secs: args.cadence,
        jitter_secs: args.jitter,
        weight: args.weight,
        outage: args.outage_start.map(|start_day| Outage { start_day, days: args.outage_days }),
        seed: args.seed,
    };
    let outcome = scenario.run(config)?;

    if let Some(path) = &args.snapshot {
        outcome
            .ledger
            .save(path)
            .with_context(|| format!("writing snapshot to {}", path.display()))?;
        info!(path = %path.display(), "snapshot written");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
    } else {
        print_summary(&outcome.summary);
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs, config: &SchedulerConfig) -> Result<()> {
    let ledger = StreamLedger::load(&args.snapshot)
        .with_context(|| format!("loading snapshot {}", args.snapshot.display()))?;
    let now = match args.now {
        Some(now) => now,
        None => unix_now()?,
    };
    let preview = ledger.preview(now, config.min_interval_secs, args.weight > 0);
    let eligibility = ledger.eligibility(now, config.min_interval_secs, args.weight > 0);

    if args.json {
        let streams: Vec<serde_json::Value> = ledger
            .iter()
            .map(|(id, stream)| {
                serde_json::json!({
                    "stream": id,
                    "state": stream,
                    "can_drip": eligibility.get(id),
                    "preview": preview.get(id),
                })
            })
            .collect();
        let out = serde_json::json!({
            "now": now,
            "min_interval_secs": config.min_interval_secs,
            "eligible_weight": args.weight,
            "streams": streams,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("\n=== LEDGER SNAPSHOT ===");
    println!("File:         {}", args.snapshot.display());
    println!("Evaluated at: {}", fmt_ts(now));
    println!("Min interval: {}s", config.min_interval_secs);
    println!("Weight:       {}", args.weight);
    for (id, stream) in ledger.iter() {
        println!();
        println!("[{id}]");
        println!("  remaining:       {}", stream.remaining);
        println!("  start:           {}", fmt_ts(stream.start));
        println!("  end:             {}", fmt_ts(stream.end));
        println!("  last settlement: {}", fmt_ts(stream.last_settlement));
        println!("  can drip:        {}", eligibility.get(id));
        println!("  would release:   {}", preview.get(id));
    }
    Ok(())
}

fn print_summary(summary: &Summary) {
    println!("\n=== SIMULATION SUMMARY ===");
    println!("Start:        {}", fmt_ts(summary.start));
    println!("End:          {}", fmt_ts(summary.end));
    println!("Finished:     {}", fmt_ts(summary.finished_at));
    println!("Min interval: {}s", summary.min_interval_secs);
    println!(
        "Triggers:     {} ({} throttled, {} without eligible recipients)",
        summary.triggers, summary.throttled, summary.ineligible_triggers
    );
    if let Some(outage) = summary.outage {
        println!(
            "Outage:       day {} for {} day(s)",
            outage.start_day, outage.days
        );
    }
    for s in &summary.streams {
        println!();
        println!("[{}]", s.stream);
        println!("  configured:  {}", s.configured);
        println!("  delivered:   {}", s.delivered);
        println!("  remaining:   {}", s.remaining);
        println!("  settlements: {}", s.settlements);
        match s.drained_at {
            Some(at) => println!(
                "  drained:     {} (+{:.2} days)",
                fmt_ts(at),
                at.saturating_sub(summary.start) as f64 / SECONDS_PER_DAY as f64
            ),
            None if s.stream == StreamId::Secondary && s.remaining > 0 => {
                println!("  drained:     no (frozen without eligible recipients)")
            }
            None => println!("  drained:     no"),
        }
    }
}

/// Resolve the config file, apply environment and CLI overrides.
fn load_config(cli: &Cli) -> Result<SchedulerConfig> {
    let path = cli.config.clone().or_else(default_config_path);
    let mut config = SchedulerConfig::load(path.as_deref()).with_context(|| match &path {
        Some(p) => format!("loading config from {}", p.display()),
        None => "loading config from environment".to_string(),
    })?;
    if let Some(secs) = cli.min_interval {
        config.min_interval_secs = secs;
    }
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("drip").join("drip.toml"))
}

fn unix_now() -> Result<u64> {
    u64::try_from(chrono::Utc::now().timestamp()).context("system clock is before the unix epoch")
}

/// Render a unix timestamp as UTC, falling back to the raw number.
fn fmt_ts(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Pass `format = "json"` for structured JSON output. Any other value
/// defaults to human-readable text.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_simulate_with_outage() {
        let cli = Cli::try_parse_from([
            "drip-sim", "--min-interval", "60", "simulate", "--days", "5", "--outage-start", "1",
            "--outage-days", "2", "--seed", "3",
        ])
        .unwrap();
        assert_eq!(cli.min_interval, Some(60));
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.days, 5);
                assert_eq!(args.outage_start, Some(1));
                assert_eq!(args.outage_days, 2);
                assert_eq!(args.seed, Some(3));
            }
            Commands::Inspect(_) => panic!("expected simulate"),
        }
    }

    #[test]
    fn outage_days_requires_start() {
        assert!(Cli::try_parse_from(["drip-sim", "simulate", "--outage-days", "2"]).is_err());
    }

    #[test]
    fn timestamps_render_as_utc() {
        assert_eq!(fmt_ts(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(fmt_ts(u64::MAX), u64::MAX.to_string());
    }
}
