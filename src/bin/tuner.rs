use anyhow::Context;
use clap::{Parser, Subcommand};
use gain_tuner::bootstrap_tuner;
use gain_tuner::config::{DEFAULT_CONFIG_PATH, TunerConfig};
use gain_tuner::console::Console;
use gain_tuner::models::{Morphology, MutationRate};
use gain_tuner::repositories::best;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tuner")]
#[command(about = "Interactive evolutionary tuning of PID/PD controller gains")]
struct Args {
    /// Path to config file
    #[arg(short = 'c', long, env = "GAIN_TUNER_CONFIG")]
    config: Option<PathBuf>,

    /// Last generation to score (overrides config)
    #[arg(short = 'g', long)]
    generations: Option<u32>,

    /// Chromosomes per generation (overrides config)
    #[arg(short = 'n', long)]
    population_size: Option<usize>,

    /// Per-gene mutation probability (overrides config)
    #[arg(short = 'm', long, value_parser = parse_mutation_rate)]
    mutation_rate: Option<MutationRate>,

    /// Gene layout, pd or pid (overrides config)
    #[arg(long, value_parser = parse_morphology)]
    morphology: Option<Morphology>,

    /// Best-of-generation log (overrides config)
    #[arg(long)]
    best_log: Option<PathBuf>,

    /// Seed for a reproducible run (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an interactive tuning session (default)
    Run,
    /// Print gain sets drawn from the initial distribution
    Seed {
        #[arg(long, default_value_t = 4)]
        count: usize,
    },
    /// Print the best-of-generation log
    History,
}

fn parse_mutation_rate(value: &str) -> Result<MutationRate, String> {
    let value: f64 = value.parse().map_err(|e| format!("{e}"))?;
    MutationRate::new(value).map_err(|e| e.to_string())
}

fn parse_morphology(value: &str) -> Result<Morphology, String> {
    match value.to_lowercase().as_str() {
        "pd" => Ok(Morphology::Pd),
        "pid" => Ok(Morphology::Pid),
        other => Err(format!("unknown morphology '{other}', expected pd or pid")),
    }
}

impl Args {
    fn load_config(&self) -> anyhow::Result<TunerConfig> {
        let mut config = match &self.config {
            Some(path) => TunerConfig::load(path, true)?,
            None => TunerConfig::load(Path::new(DEFAULT_CONFIG_PATH), false)?,
        };

        if let Some(generations) = self.generations {
            config.generations = generations;
        }
        if let Some(population_size) = self.population_size {
            config.population_size = population_size;
        }
        if let Some(mutation_rate) = self.mutation_rate {
            config.mutation_rate = mutation_rate;
        }
        if let Some(morphology) = self.morphology {
            config.morphology = morphology;
        }
        if let Some(best_log) = &self.best_log {
            config.best_log = best_log.clone();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        Ok(config)
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG only applies when no -v was given
    let filter = if verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(config: &TunerConfig) -> anyhow::Result<()> {
    let mut service = bootstrap_tuner(config)?.build();
    println!(
        "Tuning {} chromosomes per generation through generation {}",
        service.population_size(),
        service.generations()
    );
    let mut console = Console::new(io::stdin().lock(), io::stdout());

    let summary = service.run(&mut console).context("Tuning session failed")?;

    if let Some(best) = summary.best {
        println!("Best overall: {best}");
    }
    Ok(())
}

fn seed(config: &TunerConfig, count: usize) -> anyhow::Result<()> {
    config.validate()?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let sets = config
        .initial
        .distribute(&mut rng, config.morphology, count)
        .context("Could not draw initial gains")?;
    for (i, gains) in sets.iter().enumerate() {
        println!("Set {}: {gains}", i + 1);
    }
    Ok(())
}

fn history(config: &TunerConfig) -> anyhow::Result<()> {
    let records = best::Repository::new(config.best_log.clone())
        .read_all()
        .with_context(|| format!("Could not read {}", config.best_log.display()))?;

    if records.is_empty() {
        println!("No history in {}", config.best_log.display());
        return Ok(());
    }

    println!("iteration\tgen\tnumber\tkp\tki\tkd\tlap_time");
    for (iteration, record) in records.iter().enumerate() {
        let ki = record.ki.map(|ki| ki.to_string()).unwrap_or_default();
        let lap_time = record
            .lap_time
            .map(|t| t.to_string())
            .unwrap_or_default();
        println!(
            "{iteration}\t{}\t{}\t{}\t{ki}\t{}\t{lap_time}",
            record.generation, record.number, record.kp, record.kd
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenv::from_filename(".env.local").ok();
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = args.load_config()?;

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(&config),
        Command::Seed { count } => seed(&config, count),
        Command::History => history(&config),
    }
}
