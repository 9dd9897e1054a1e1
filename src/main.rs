use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use strum::IntoEnumIterator;
use tracing_subscriber::EnvFilter;

use cervsim::config::SimulationConfig;
use cervsim::error::ScreeningError;
use cervsim::events::EventLog;
use cervsim::protocol::ProtocolKind;
use cervsim::simulation::Simulation;

#[derive(Parser, Debug)]
#[command(name = "cervsim")]
#[command(about = "Run a cervical screening policy over a synthetic cohort", long_about = None)]
struct Args {
    /// Screening policy (none, via, dna_then_treatment, dna_then_via, dna_then_triage, cytology)
    #[arg(short, long)]
    policy: Option<String>,

    /// Run every registered policy on the same cohort and compare totals
    #[arg(long, conflicts_with = "policy")]
    compare: bool,

    /// Master seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Years to simulate
    #[arg(short, long)]
    years: Option<u32>,

    /// Cohort size
    #[arg(short, long)]
    agents: Option<usize>,

    /// JSON simulation config; omitted fields keep their canonical values
    #[arg(long)]
    params: Option<PathBuf>,

    /// Write the event log as NDJSON (one file per policy with --compare)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Suppress the summary table
    #[arg(short, long)]
    quiet: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.params {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading parameters: {}", path.display()))?;
            SimulationConfig::from_json(&text)
                .with_context(|| format!("parsing parameters: {}", path.display()))?
        }
        None => SimulationConfig::canonical(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(years) = args.years {
        config.years = years;
    }
    if let Some(agents) = args.agents {
        config.cohort.agents = agents;
    }
    if let Some(name) = &args.policy {
        config.screening.protocol = ProtocolKind::from_str(name)
            .map_err(|_| ScreeningError::UnknownProtocol(name.clone()))?;
    }

    let kinds: Vec<ProtocolKind> = if args.compare {
        ProtocolKind::iter().collect()
    } else {
        vec![config.screening.protocol]
    };

    for kind in kinds {
        let mut sim = Simulation::from_config(config.clone())?.with_protocol(kind);
        sim.run().with_context(|| format!("running policy {kind}"))?;

        if let Some(output) = &args.output {
            let path = if args.compare { per_policy_path(output, kind) } else { output.to_path_buf() };
            let file = File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            sim.log()
                .write_ndjson(BufWriter::new(file))
                .with_context(|| format!("writing {}", path.display()))?;
        }

        if !args.quiet {
            print_summary(kind, sim.cohort.len(), sim.log());
        }
    }
    Ok(())
}

fn per_policy_path(output: &Path, kind: ProtocolKind) -> PathBuf {
    let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("events");
    let ext = output.extension().and_then(|s| s.to_str()).unwrap_or("ndjson");
    output.with_file_name(format!("{stem}_{kind}.{ext}"))
}

fn print_summary(kind: ProtocolKind, agents: usize, log: &EventLog) {
    println!("\n=== {kind} ({agents} agents) ===");
    println!("{:<32} | {:>8} | {:>12}", "Event", "Count", "Cost");
    println!("{}", "-".repeat(58));
    for (event, totals) in log.totals_by_event() {
        println!("{:<32} | {:>8} | {:>12.2}", event, totals.count, totals.cost);
    }
    println!("{}", "-".repeat(58));
    println!("{:<32} | {:>8} | {:>12.2}", "total", log.len(), log.total_cost());
}
