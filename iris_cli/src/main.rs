use std::path::{Path, PathBuf};

use clap::{Parser, error::ErrorKind};
use iris_optimizer::json::types::{JsonError, JsonStatusCode};
use mimalloc::MiMalloc;
use tracing::{error, info};

use crate::solve::{InputSource, OSRM_URL_ENV, SolveArgs};

mod parsers;
mod solve;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None, disable_version_flag = true)]
struct Cli {
    /// Problem as inline JSON, read from stdin when neither this nor `--input` is given
    problem: Option<String>,

    /// Host of the OSRM server
    #[arg(short, long, default_value = "0.0.0.0")]
    address: String,

    /// Port of the OSRM server
    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// Routing profile
    #[arg(short = 'm', long, default_value = "car")]
    profile: String,

    /// Add the route geometries to the solution
    #[arg(short, long)]
    geometry: bool,

    /// Read the problem from a file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Write the solution to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of threads running trajectories
    #[arg(short, long, default_value_t = 4)]
    threads: usize,

    /// Exploration level, from 0 to 5
    #[arg(short = 'x', long, default_value_t = 1)]
    explore: usize,

    /// Wall-clock limit of every trajectory (e.g., "10s", "5m", "PT1M30S"). Long form only,
    /// `-l` is left free for a local routing engine
    #[arg(long, value_parser = parsers::parse_duration)]
    limit: Option<jiff::SignedDuration>,

    /// Log the run milestones
    #[arg(short, long)]
    verbose: bool,

    /// Log everything
    #[arg(short = 'V', long)]
    very_verbose: bool,
}

impl Cli {
    fn input_source(&self) -> InputSource {
        match (&self.input, &self.problem) {
            (Some(path), _) => InputSource::File(path.clone()),
            (None, Some(problem)) => InputSource::Inline(problem.clone()),
            (None, None) => InputSource::Stdin,
        }
    }

    fn log_level(&self) -> tracing::Level {
        if self.very_verbose {
            tracing::Level::TRACE
        } else if self.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}

fn write_output(path: Option<&Path>, content: &str) -> Result<(), std::io::Error> {
    match path {
        Some(path) => std::fs::write(path, content),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::ValueValidation | ErrorKind::InvalidValue) => {
            let error = JsonError::new(JsonStatusCode::Internal.code(), "Wrong numerical value.");
            println!("{}", serde_json::to_string(&error)?);
            std::process::exit(JsonStatusCode::Internal.code());
        }
        Err(err) => err.exit(),
    };

    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(cli.log_level())
        .init();

    let args = SolveArgs {
        input: cli.input_source(),
        osrm_url: solve::osrm_url(&cli.address, cli.port, std::env::var(OSRM_URL_ENV).ok()),
        profile: cli.profile.clone(),
        geometry: cli.geometry,
        threads: cli.threads,
        exploration_level: cli.explore,
        limit: cli.limit,
    };

    match solve::run(args).await {
        Ok(solution) => {
            if cli.verbose || cli.very_verbose {
                eprintln!("{}", solve::summary_table(&solution));
            }

            write_output(cli.output.as_deref(), &serde_json::to_string(&solution)?)?;
            info!(
                cost = solution.summary.cost,
                unassigned = solution.summary.unassigned,
                "Solution written"
            );
        }
        Err(err) => {
            let code = solve::error_code(&err);
            error!(code, "{err:#}");

            let document = JsonError::new(code, err.to_string());
            write_output(cli.output.as_deref(), &serde_json::to_string(&document)?)?;
            std::process::exit(code);
        }
    }

    Ok(())
}
