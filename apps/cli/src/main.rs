#![deny(warnings)]

//! Headless CLI: load a session config, autoplay one run and print KPIs.

use anyhow::{Context, Result};
use farm_core::{validate_config, FarmConfig};
use farm_runtime::Session;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    seed: Option<u64>,
    months: Option<u32>,
    json: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next(),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--months" => args.months = it.next().and_then(|s| s.parse().ok()),
            "--json" => args.json = true,
            _ => {}
        }
    }
    args
}

fn load_config(path: Option<&str>) -> Result<FarmConfig> {
    let Some(path) = path else {
        return Ok(FarmConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing config {path}"))
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args();
    info!(?args, "starting CLI");

    let mut config = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.rng_seed = Some(seed);
    }
    if let Some(months) = args.months {
        config.duration_months = months;
    }
    validate_config(&config)?;

    let mut session = Session::new(config)?;
    // The last month's advance returns the report.
    let max_months = session.config().duration_months;
    println!(
        "Farm OK | plots: {} | money: {} | months: {}",
        session.grid().len(),
        session.money(),
        session.config().duration_months
    );

    let report = farm_ai::play_session(&mut session, max_months, |m| {
        println!(
            "KPI | month: {} | planted: {} | harvested: {} | spent: {} | revenue: {} | money: {}",
            m.month, m.planted, m.harvested, m.spent, m.revenue, m.money
        );
    })?;

    println!(
        "Run {} | months: {} | start: {} | final: {} | profit: {}",
        if session.is_game_over() { "over" } else { "paused" },
        report.duration_months,
        report.starting_money,
        report.final_money,
        report.profit
    );
    if args.json {
        println!("{}", serde_json::to_string_pretty(&session.snapshot()?)?);
    }

    Ok(())
}
