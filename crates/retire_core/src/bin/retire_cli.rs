//! Command-line front end for the retirement Monte Carlo engine.
//!
//! Reads a `Profile` as JSON (from a file or stdin), maps and validates it,
//! runs a batch, and prints the aggregated result as JSON. Logging goes to
//! stderr so stdout stays machine-parseable.

use std::io::Read as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use retire_core::cma::Cma;
use retire_core::config::EngineConfig;
use retire_core::model::Profile;
use retire_core::returns::ReturnGeneratorConfig;
use retire_core::simulation::{self, SimulationConfig};
use retire_core::{profile_to_retirement_params, MonteCarloValidator};

/// Run a retirement Monte Carlo simulation from a profile file.
#[derive(Parser, Debug)]
#[command(name = "retire-cli")]
#[command(about = "Run a retirement Monte Carlo simulation from a profile")]
struct Args {
    /// Path to a JSON-encoded profile. Reads stdin when omitted.
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Number of trials to simulate.
    #[arg(short, long)]
    iterations: Option<usize>,

    /// Calendar year used to resolve ages from birth years.
    #[arg(long, default_value_t = 2026)]
    current_year: i32,

    /// Run trials sequentially even if the `parallel` feature is enabled.
    #[arg(long)]
    sequential: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn read_profile(path: Option<&PathBuf>) -> Result<Profile, Box<dyn std::error::Error>> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&raw)?)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let engine_config = EngineConfig::from_env()?;
    let profile = read_profile(args.profile.as_ref())?;
    let cma = Cma::resolve(&engine_config.cma_version);

    let params = profile_to_retirement_params(&profile, &cma, args.current_year);

    let outcome = MonteCarloValidator::validate_parameters(&params);
    for warning in &outcome.warnings {
        tracing::warn!(%warning, "parameter warning");
    }
    if !outcome.is_valid {
        for err in &outcome.errors {
            tracing::error!(field = %err.field, message = %err.message, "validation error");
        }
        return Err(format!("{} validation error(s), see log", outcome.errors.len()).into());
    }

    let return_config = ReturnGeneratorConfig {
        use_fat_tails: true,
        disable_crash_overlay: engine_config.disable_crash_overlay,
        strict_baseline: engine_config.iid_lognormal_baseline,
        crash_overlay: engine_config.crash_overlay,
    };
    let sim_config = SimulationConfig {
        iterations: args.iterations.unwrap_or(engine_config.default_iterations),
        worker_count: if args.sequential || engine_config.force_inline {
            1
        } else {
            simulation::default_worker_count()
        },
        timeout: None,
    };

    tracing::info!(
        iterations = sim_config.iterations,
        workers = sim_config.worker_count,
        "starting simulation batch"
    );

    let result = simulation::run_simulation(&params, &cma, &return_config, &sim_config)?;

    tracing::info!(
        success_probability = result.success_probability,
        calculation_time_ms = result.calculation_time_ms,
        "simulation complete"
    );

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
