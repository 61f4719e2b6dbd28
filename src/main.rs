//! dr-e2e - run the DR end-to-end suite.
//!
//! Loads the suite configuration, runs every scenario and prints a
//! PASS/FAIL/SKIP summary. Exits with status 1 when a scenario failed.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::signal;
use tracing::{error, info, warn};

use dr_e2e::Config;
use dr_e2e::wait::ExecContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// End-to-end test suite for DR protected workloads
#[derive(Debug, Parser)]
#[command(name = "dr-e2e", version, about)]
struct Args {
    /// Suite configuration file
    #[arg(short, long, env = "DR_E2E_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Write a JSON report to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Per-scenario timeout in seconds, overriding the configuration
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
}

fn init_tracing(format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("dr_e2e=info".parse()?)
        .add_directive("kube=warn".parse()?);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.log_format)?;

    let mut config = Config::load(&args.config)?;
    if let Some(timeout) = args.timeout {
        config.timeouts.scenario = timeout;
    }
    info!(
        config = %args.config.display(),
        tests = config.tests.len(),
        "Starting dr-e2e"
    );

    let root = ExecContext::new();
    let interrupt = root.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Received interrupt, cancelling scenarios");
            interrupt.cancel();
        }
    });

    let report = match dr_e2e::run(Arc::new(config), &root).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Suite aborted");
            return Ok(ExitCode::FAILURE);
        }
    };

    println!("{}", report);

    if let Some(path) = &args.report {
        std::fs::write(path, serde_json::to_vec_pretty(&report)?)?;
        info!(path = %path.display(), "Wrote report");
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
