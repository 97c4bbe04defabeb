//! `quench`: run the two-stage hydro pipeline from the command line.
//!
//! ```text
//! quench --events 10 --reuse-period 5 --seed 42 --output events.dat
//! quench --events 3 --no-reuse
//! ```
//!
//! Logging goes through `tracing`; set `RUST_LOG` to override the default
//! `quench=info` filter.

use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use quench::engine::{ConfigError, Orchestrator, ReuseConfig, RunConfig, RunFailure, RunMetrics};
use quench::modules::two_stage_hydro;
use quench::resource::RegistryError;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "quench")]
#[command(about = "Run the two-stage hydro pipeline with upstream event reuse")]
struct Cli {
    /// Number of events to generate
    #[arg(long, default_value_t = 1)]
    events: u64,

    /// Regenerate the upstream stages every K events
    #[arg(long, value_name = "K", default_value_t = 5, conflicts_with = "no_reuse")]
    reuse_period: u64,

    /// Regenerate every stage on every event
    #[arg(long)]
    no_reuse: bool,

    /// Run seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Where to write the ASCII event record
    #[arg(long, default_value = "quench_out.dat")]
    output: PathBuf,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        let reuse = if self.no_reuse {
            ReuseConfig::disabled()
        } else {
            ReuseConfig::every(self.reuse_period)
        };
        RunConfig {
            events: self.events,
            reuse,
            seed: self.seed,
        }
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug)]
enum CliError {
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
    Config(ConfigError),
    Registry(RegistryError),
    Run(Box<RunFailure>),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output { path, source } => {
                write!(f, "cannot create '{}': {source}", path.display())
            }
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Registry(e) => write!(f, "pipeline assembly failed: {e}"),
            Self::Run(failure) => write!(f, "run failed: {failure}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Output { source, .. } => Some(source),
            Self::Config(e) => Some(e),
            Self::Registry(e) => Some(e),
            Self::Run(failure) => Some(failure.as_ref()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl From<RunFailure> for CliError {
    fn from(failure: RunFailure) -> Self {
        Self::Run(Box::new(failure))
    }
}

// ── Driver ─────────────────────────────────────────────────────────

fn run(cli: &Cli) -> Result<RunMetrics, CliError> {
    let config = cli.run_config();
    config.validate()?;
    let file = File::create(&cli.output).map_err(|source| CliError::Output {
        path: cli.output.clone(),
        source,
    })?;

    let mut orchestrator = Orchestrator::new(config)?;
    let tasks = two_stage_hydro(orchestrator.registry_mut(), BufWriter::new(file))?;
    orchestrator.extend(tasks);
    Ok(orchestrator.run()?)
}

fn show_banner() {
    info!("-----------------------------------------------");
    info!("| Quench two-stage hydro pipeline             |");
    info!("-----------------------------------------------");
}

fn print_summary(metrics: &RunMetrics, real_time_s: f64) {
    println!();
    println!("Events executed:      {}", metrics.events_executed);
    println!("  regenerating:       {}", metrics.regenerating_events);
    println!("  reusing upstream:   {}", metrics.reusing_events);
    println!(
        "Init / exec / finish: {:.3} / {:.3} / {:.3} ms",
        metrics.init_us as f64 / 1e3,
        metrics.exec_us as f64 / 1e3,
        metrics.finish_us as f64 / 1e3
    );
    if let Some(mean) = metrics.mean_event_us() {
        println!("Mean event time:      {:.3} ms", mean as f64 / 1e3);
    }
    for (task, us) in &metrics.task_us {
        println!("  {task:<24} {:.3} ms", *us as f64 / 1e3);
    }
    println!("Real time: {real_time_s:.6} seconds.");
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quench=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    show_banner();

    let start = Instant::now();
    match run(&cli) {
        Ok(metrics) => {
            info!(output = %cli.output.display(), "finished");
            print_summary(&metrics, start.elapsed().as_secs_f64());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            if let CliError::Run(failure) = &e {
                print_summary(&failure.metrics, start.elapsed().as_secs_f64());
            }
            ExitCode::FAILURE
        }
    }
}
