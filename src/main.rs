use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use transit_sim::advisory::OfflineContentGenerator;
use transit_sim::driver::SimulationDriver;
use transit_sim::simulation::{SimConfig, SimWorld};

#[derive(Parser)]
#[command(name = "transit_sim")]
#[command(about = "Headless transit network simulation")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "5000")]
    ticks: u32,

    /// Simulated milliseconds per tick
    #[arg(long, default_value = "16.0")]
    delta: f64,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// TOML file overriding simulation parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Generate random events and station names with the offline generator
    #[arg(long)]
    events: bool,

    /// Wall-clock milliseconds between event polls (defaults to the config value)
    #[arg(long)]
    event_interval_ms: Option<u64>,

    /// Print a summary every N ticks (0 disables)
    #[arg(long, default_value = "1000")]
    report_every: u32,

    /// Draw an ASCII map with each summary
    #[arg(long)]
    map: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    run_headless(cli).await
}

/// Run the simulation in headless mode (no graphics)
async fn run_headless(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => SimConfig::from_file(path)?,
        None => SimConfig::default(),
    };
    if let Some(interval) = cli.event_interval_ms {
        config.event_check_interval_ms = interval;
    }
    let advisory_timeout = Duration::from_millis(config.advisory_timeout_ms);
    let poll_period = Duration::from_millis(config.event_check_interval_ms.max(1));

    println!("Running transit simulation in headless mode...");
    println!("Ticks: {}, Delta: {}ms", cli.ticks, cli.delta);
    println!();

    let world = SimWorld::build_demo_world(SimWorld::with_config(config, cli.seed))?;
    let mut driver = SimulationDriver::new(world);

    println!("Initial state:");
    driver.world().print_summary();
    if cli.map {
        driver.world().draw_map();
    }
    println!();

    driver.start();

    if cli.events {
        let generator = Arc::new(OfflineContentGenerator::new(cli.seed.unwrap_or(0)));
        driver.attach_generator(generator, poll_period, advisory_timeout);

        // Give every default-named station a suggested name
        let stations: Vec<_> = driver.world().stations().map(|s| s.id).collect();
        for station in stations {
            driver.request_station_name(station);
        }
    }

    // Frame timestamps come from a simulated clock advancing `delta` per frame
    let mut now_ms = 0.0;
    driver.frame(now_ms);
    while driver.ticks() < u64::from(cli.ticks) {
        now_ms += cli.delta;
        driver.frame(now_ms);

        if cli.report_every > 0 && driver.ticks() % u64::from(cli.report_every) == 0 {
            println!(
                "--- After tick {} ({:.1}s simulated time) ---",
                driver.ticks(),
                driver.world().time() / 1000.0
            );
            driver.world().print_summary();
            if cli.map {
                driver.world().draw_map();
            }
            println!();
        }

        // Let advisory tasks make progress between frames
        tokio::task::yield_now().await;
    }

    driver.pause();

    if let Err(e) = driver.world().check_invariants() {
        warn!("Network invariant violated: {:#}", e);
    }

    println!("=== Final State ===");
    driver.world().print_summary();
    if cli.map {
        driver.world().draw_map();
    }

    let world = driver.world();
    info!("=== SIMULATION COMPLETE ===");
    info!("Simulated time: {:.2}s", world.time() / 1000.0);
    info!("Passengers waiting: {}", world.total_passengers_waiting());
    info!("Passengers served: {}", world.passengers_served());
    info!("Average wait: {:.1}ms", world.average_wait_time());
    info!("Active trains: {}", world.train_count());
    info!("Total stations: {}", world.station_count());
    info!("Total lines: {}", world.line_count());

    Ok(())
}
