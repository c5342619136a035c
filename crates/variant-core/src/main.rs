//! Variant Competition Simulator
//!
//! Command line entry point: run a simulation from a TOML config, generate a
//! network edge list, or print the default configuration.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use variant_core::net::write_edge_list_file;
use variant_core::{make_network, NetworkKind, SeedSource, SimConfig, SimError, Simulation};

/// Command line arguments for the simulator
#[derive(Parser, Debug)]
#[command(name = "variant_sim")]
#[command(about = "Exemplar-based simulation of two variants competing on a social network")]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a simulation
    Run(RunArgs),
    /// Generate a network and write it as an edge list
    Network(NetworkArgs),
    /// Print the default configuration as TOML
    DefaultConfig {
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Path to the TOML configuration; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the number of epochs
    #[arg(long)]
    epochs: Option<u64>,

    /// Override the output directory
    #[arg(long)]
    out: Option<PathBuf>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the worker thread count
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(clap::Args, Debug)]
struct NetworkArgs {
    /// Path to the TOML configuration whose [network] section is used
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for the rewiring
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Output edge list path
    #[arg(long, default_value = "network.csv")]
    out: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let result = match cli.command {
        Command::Run(args) => run(args),
        Command::Network(args) => network(args),
        Command::DefaultConfig { out } => default_config(out),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SimConfig, SimError> {
    match path {
        Some(path) => Ok(SimConfig::from_file(path)?),
        None => Ok(SimConfig::default()),
    }
}

fn run(args: RunArgs) -> Result<(), SimError> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(epochs) = args.epochs {
        config.simulation.epochs = epochs;
    }
    if let Some(out) = args.out {
        config.output.dir = out;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }
    if let Some(threads) = args.threads {
        config.simulation.threads = Some(threads);
    }

    let mut sim = Simulation::new(config)?;
    let config = sim.config();
    println!("Variant Competition Simulator");
    println!("=============================");
    println!("Seed: {}", sim.seed());
    println!("Network: {} ({} nodes)", config.network.kind.as_str(), sim.population().size());
    println!("Speaker selection: {:?}", config.population.interaction);
    println!("Epochs: {}", config.simulation.epochs);
    println!("Output: {}", config.output.dir.display());
    println!();

    let summary = sim.run_to_dir()?;

    println!();
    println!("Epochs run: {} ({:?})", summary.epochs_run, summary.stop_reason);
    println!(
        "Productions: A={} B={}",
        summary.total_productions_a, summary.total_productions_b
    );
    match summary.final_ratio_a {
        Some(ratio) => println!("Final ratio A: {:.3}", ratio),
        None => println!("Final ratio A: n/a"),
    }
    if let Some(ratio) = summary.overall_ratio_a {
        println!("Overall ratio A: {:.3}", ratio);
    }
    println!("Elapsed: {} ms", summary.elapsed_ms);
    Ok(())
}

fn network(args: NetworkArgs) -> Result<(), SimError> {
    let config = load_config(args.config.as_ref())?;
    let mut rng = SeedSource::new(args.seed).setup();
    let topology = make_network(&config.network, &mut rng)?;
    write_edge_list_file(topology.matrix(), &args.out)?;

    let kind = match topology.kind() {
        NetworkKind::Undefined => "edge list",
        kind => kind.as_str(),
    };
    println!("Network: {}", kind);
    println!("Nodes: {}", topology.size());
    println!("Edges: {}", topology.matrix().edge_count() / 2);
    println!("Mean distance: {:.3}", topology.mean_distance());
    println!("Max distance: {}", topology.max_distance());
    println!("Written to {}", args.out.display());
    Ok(())
}

fn default_config(out: Option<PathBuf>) -> Result<(), SimError> {
    let content = SimConfig::default().to_toml()?;
    match out {
        Some(path) => {
            std::fs::write(&path, content)
                .map_err(|e| SimError::Config(variant_core::ConfigError::Io { path, source: e }))?;
        }
        None => print!("{}", content),
    }
    Ok(())
}
