use anyhow::Context;
use atc_sim::config::{self, Timing};
use atc_sim::simulation::Simulation;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Decentralized air-traffic landing coordination simulator.
#[derive(Parser, Debug)]
#[command(name = "atc-sim", version, about)]
struct Args {
    /// Fleet configuration file, one airplane per line:
    /// `<name>, <Regular|Large>, <Normal|Emergency>, <arrival-seconds>`
    #[arg(default_value = "fleet.txt")]
    config: PathBuf,

    /// Real milliseconds per simulated second.
    #[arg(long, default_value_t = 1000)]
    second_ms: u64,

    /// Print the landing reports as JSON instead of a plain summary.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let fleet = config::load_fleet(&args.config)
        .with_context(|| format!("loading fleet from {}", args.config.display()))?;
    anyhow::ensure!(!fleet.is_empty(), "fleet configuration contains no airplanes");

    let timing = Timing {
        second: Duration::from_millis(args.second_ms),
        ..Timing::default()
    };
    let reports = Simulation::new(fleet).with_timing(timing).run().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            match (report.chosen_runway, report.execution_time_secs) {
                (Some(runway), Some(secs)) => println!(
                    "{}: landed on runway {runway} after {secs}s (arrived at +{}s)",
                    report.airplane_name, report.start_offset_secs
                ),
                _ => println!("{}: did not land", report.airplane_name),
            }
        }
    }
    Ok(())
}
