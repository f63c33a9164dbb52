//! SDS Sample Binary
//!
//! Loads the settings document, connects a client session and runs the
//! stream lifecycle once. The exit status reflects the outcome.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use clap::Parser;
use sds_client::ClientConfig;
use sds_common::{AppSettings, Result};
use sds_sample::{connect, coordinator, RunMode, RunReport};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sds-sample")]
#[command(author = "AutomataNexus Development Team")]
#[command(version = "0.1.0")]
#[command(about = "Sequential Data Store time series sample", long_about = None)]
struct Args {
    /// Settings document
    #[arg(short, long, default_value = "appsettings.json")]
    config: PathBuf,

    /// Return the first failure after cleanup instead of only reporting it
    #[arg(long)]
    test: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    match run(&args).await {
        Ok(report) if report.succeeded() => {
            tracing::info!("Complete!");
            ExitCode::SUCCESS
        }
        Ok(report) => {
            tracing::error!(
                phase = ?report.phase_reached,
                error = ?report.error,
                "sample finished with errors"
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<RunReport> {
    let settings = AppSettings::from_file(&args.config)?;
    let client = connect(&settings, ClientConfig::default())?;
    let mode = if args.test {
        RunMode::Test
    } else {
        RunMode::Standard
    };

    coordinator(&settings, client, mode).run().await
}
