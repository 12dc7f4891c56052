//! Single simulation run
//!
//! Loads a config file (or the built-in demo shop), runs until every
//! customer is handled, then prints the statistics.

use anyhow::{Context, Result};
use barbershop::{init_tracing, write_csv, ShopConfig, Simulation};
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "barbershop", about = "Sleeping barber simulation")]
struct Args {
    /// JSON config file (built-in demo shop when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write one CSV row per customer to this file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print statistics as JSON
    #[arg(long)]
    json: bool,

    /// Give up waiting for completion after this many seconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ShopConfig::from_file(path)
            .with_context(|| format!("invalid config {}", path.display()))?,
        None => ShopConfig::default(),
    };

    init_tracing(&config.logging).context("failed to initialize logging")?;

    let sim = Simulation::from_config(&config)?;
    sim.start()?;

    if !sim.wait_until_done(Duration::from_secs(args.timeout)) {
        tracing::warn!(timeout_secs = args.timeout, "stopping before every customer was handled");
    }
    sim.stop().context("simulation failed")?;

    let stats = sim.compute_stats();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{}", stats.report());
    }

    if let Some(path) = &args.csv {
        let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
        write_csv(&sim.customer_records(), file)?;
        println!("Customer records written to {}", path.display());
    }

    Ok(())
}
