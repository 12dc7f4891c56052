//! Capacity Sweep
//!
//! Runs one simulation per waiting room capacity with the same arrival and
//! service intervals, and reports which capacity turned away the fewest
//! customers.

use anyhow::{Context, Result};
use barbershop::{init_tracing, LoggingConfig, NullSink, ShopParams, ShopStats, Simulation, Timing};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "sweep", about = "Waiting room capacity sweep")]
struct Args {
    /// Capacities to try
    #[arg(long, value_delimiter = ',', default_value = "1,2,4,8")]
    capacities: Vec<usize>,

    #[arg(long, default_value_t = 20)]
    customers: usize,

    #[arg(long, default_value_t = 0.05)]
    arrival_min: f64,

    #[arg(long, default_value_t = 0.2)]
    arrival_max: f64,

    #[arg(long, default_value_t = 0.1)]
    cut_min: f64,

    #[arg(long, default_value_t = 0.3)]
    cut_max: f64,
}

fn run_simulation(params: ShopParams) -> Result<ShopStats> {
    let sim = Simulation::new(params, Arc::new(NullSink))?.with_timing(Timing {
        idle_wait: Duration::from_millis(100),
        poll_interval: Duration::from_millis(20),
    });

    sim.start()?;
    sim.wait_until_done(Duration::from_secs(600));
    sim.stop()?;

    Ok(sim.compute_stats())
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&LoggingConfig {
        log_level: "WARN".to_string(),
        log_file: None,
    })?;

    println!("=== Capacity Sweep ===");
    println!(
        "{} customers, arrivals {:.2}-{:.2} s, cuts {:.2}-{:.2} s\n",
        args.customers, args.arrival_min, args.arrival_max, args.cut_min, args.cut_max
    );
    println!(
        "{:<10} {:>8} {:>8} {:>14} {:>14}",
        "Capacity", "Served", "Left", "Avg wait (s)", "Avg cut (s)"
    );
    println!("{:-<58}", "");

    let secs = |d: Option<Duration>| d.map_or(f64::NAN, |d| d.as_secs_f64());
    let mut best: Option<(usize, usize)> = None; // (capacity, left)

    for capacity in args.capacities {
        let params = ShopParams {
            waiting_room_capacity: capacity,
            arrival_time_min: args.arrival_min,
            arrival_time_max: args.arrival_max,
            cut_time_min: args.cut_min,
            cut_time_max: args.cut_max,
            total_customers: args.customers,
        };

        let stats = run_simulation(params).with_context(|| format!("capacity {}", capacity))?;

        println!(
            "{:<10} {:>8} {:>8} {:>14.3} {:>14.3}",
            capacity,
            stats.served,
            stats.left,
            secs(stats.avg_wait),
            secs(stats.avg_service)
        );

        if best.map_or(true, |(_, left)| stats.left < left) {
            best = Some((capacity, stats.left));
        }
    }

    if let Some((capacity, left)) = best {
        println!("\n=== Fewest balks ===");
        println!("Capacity: {} ({} customers left)", capacity, left);
    }

    Ok(())
}
