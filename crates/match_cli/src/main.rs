//! match_sim CLI
//!
//! Runs single trials, batches and symmetry checks from the command line and
//! prints JSON on stdout. Logs go to stderr (`RUST_LOG`, default `info`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use match_core::api;
use match_core::calibration::SymmetryCheck;
use match_core::config::{CONFIG_PATH_ENV, WORKERS_ENV};
use match_core::{CancellationToken, Competitor, EngineConfig, MatchEngine, MatchRequest};

#[derive(Parser)]
#[command(name = "match_sim")]
#[command(about = "Monte Carlo match simulation", version, long_about = None)]
struct Cli {
    /// Engine config YAML; falls back to MATCH_ENGINE_CONFIG, then the preset
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Built-in tuning preset used when no config file is given
    #[arg(long, value_enum, default_value_t = Preset::Realistic, global = true)]
    preset: Preset,

    /// Worker threads (0 = all cores)
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one trial and print its full result
    Simulate {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Run a batch and print the outcome distribution
    Batch {
        #[command(flatten)]
        request: RequestArgs,

        /// Number of trials
        #[arg(long, default_value_t = 10_000)]
        trials: u32,

        /// Cancel the batch after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Compare a batch against its side-swapped mirror
    Symmetry {
        #[command(flatten)]
        request: RequestArgs,

        #[arg(long, default_value_t = 10_000)]
        trials: u32,

        /// Largest accepted probability delta
        #[arg(long, default_value_t = 0.02)]
        tolerance: f64,
    },

    /// Print a JSON Schema
    Schema {
        #[arg(value_enum, default_value_t = SchemaKind::Request)]
        kind: SchemaKind,
    },

    /// Print service name and version
    Info,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Realistic,
    HighScoring,
    Defensive,
    Testing,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaKind {
    Request,
    Result,
    Distribution,
}

/// Request from a JSON file, or built from inline flags.
#[derive(Args, Debug)]
struct RequestArgs {
    /// JSON MatchRequest file; inline competitor flags are ignored when set
    #[arg(long)]
    request: Option<PathBuf>,

    #[arg(long, default_value = "a")]
    a_id: String,
    #[arg(long, default_value_t = 1.0)]
    a_offense: f64,
    #[arg(long, default_value_t = 1.0)]
    a_defense: f64,
    #[arg(long, default_value_t = 1.0)]
    a_form: f64,

    #[arg(long, default_value = "b")]
    b_id: String,
    #[arg(long, default_value_t = 1.0)]
    b_offense: f64,
    #[arg(long, default_value_t = 1.0)]
    b_defense: f64,
    #[arg(long, default_value_t = 1.0)]
    b_form: f64,

    /// Fixed seed; a random one is picked and reported otherwise
    #[arg(long)]
    seed: Option<u64>,

    /// Match length in ticks
    #[arg(long)]
    match_length: Option<u32>,
}

impl RequestArgs {
    /// `trials` overrides the file's value when given.
    fn build(&self, trials: Option<u32>) -> Result<MatchRequest> {
        let mut request = match &self.request {
            Some(path) => load_request(path)?,
            None => MatchRequest::batch(
                Competitor::new(self.a_id.clone(), self.a_offense, self.a_defense)
                    .with_form(self.a_form),
                Competitor::new(self.b_id.clone(), self.b_offense, self.b_defense)
                    .with_form(self.b_form),
                1,
            ),
        };
        if let Some(trials) = trials {
            request.trials = trials;
        }
        if self.seed.is_some() {
            request.seed = self.seed;
        }
        if self.match_length.is_some() {
            request.match_length = self.match_length;
        }
        Ok(request)
    }
}

fn load_request(path: &Path) -> Result<MatchRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading request {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing request {}", path.display()))
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    load_config_with(cli, |key| std::env::var(key).ok())
}

/// `--config`, then MATCH_ENGINE_CONFIG, then the preset. MATCH_ENGINE_WORKERS
/// applies to every source and `--workers` beats it.
fn load_config_with(cli: &Cli, lookup: impl Fn(&str) -> Option<String>) -> Result<EngineConfig> {
    let env_path = lookup(CONFIG_PATH_ENV).filter(|path| !path.trim().is_empty());
    let mut config = match (&cli.config, env_path) {
        (Some(path), _) => EngineConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        (None, Some(path)) => EngineConfig::from_yaml_file(path.trim())
            .with_context(|| format!("loading config {} from {CONFIG_PATH_ENV}", path.trim()))?,
        (None, None) => match cli.preset {
            Preset::Realistic => EngineConfig::realistic(),
            Preset::HighScoring => EngineConfig::high_scoring(),
            Preset::Defensive => EngineConfig::defensive(),
            Preset::Testing => EngineConfig::testing(),
        },
    };
    config.apply_overrides_from(&lookup).context("applying environment overrides")?;
    if let Some(workers) = cli.workers {
        config.runner.workers = workers;
    }
    Ok(config)
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Simulate { request } => {
            let engine = MatchEngine::new(load_config(&cli)?)?;
            let result = engine.simulate(&request.build(Some(1))?)?;
            tracing::info!(score_a = result.score_a, score_b = result.score_b, "trial finished");
            emit(&result, cli.pretty)
        }

        Commands::Batch { request, trials, timeout_ms } => {
            let engine = MatchEngine::new(load_config(&cli)?)?;
            let token = match timeout_ms {
                Some(ms) => CancellationToken::with_timeout(Duration::from_millis(*ms)),
                None => CancellationToken::new(),
            };
            let distribution =
                engine.simulate_batch_with_cancel(&request.build(Some(*trials))?, &token)?;
            emit(&distribution, cli.pretty)
        }

        Commands::Symmetry { request, trials, tolerance } => {
            let engine = MatchEngine::new(load_config(&cli)?)?;
            let request = request.build(Some(*trials))?;
            let seed = request.seed.unwrap_or_else(rand::random);
            let report = SymmetryCheck::new(seed).with_tolerance(*tolerance).run(&engine, &request)?;
            emit(&report, cli.pretty)?;
            if !report.is_symmetric {
                bail!("{} symmetry violation(s) above tolerance {}", report.violations.len(), tolerance);
            }
            Ok(())
        }

        Commands::Schema { kind } => {
            let schema = match kind {
                SchemaKind::Request => api::request_schema(),
                SchemaKind::Result => api::result_schema(),
                SchemaKind::Distribution => api::distribution_schema(),
            };
            emit(&schema, cli.pretty)
        }

        Commands::Info => emit(&api::engine_info(), cli.pretty),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);
    run(cli)
}
