//! Prints the current date by running the system `date` utility.
//!
//! A missing or failing `date` is logged and turned into exit code 1.
//!
//! Logging is controlled by `RUST_LOG` (default `runcheck=info,print_date=info`) and
//! `RUNCHECK_LOG_FORMAT` (`pretty`, the default, or `json`).

use std::process::ExitCode;

use anyhow::Context;
use runcheck::{date, Shell};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    if let Err(err) = init_logging() {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }
    match try_main() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            let message = format!("{err:#}");
            tracing::error!(error = %message, "print-date failed");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> anyhow::Result<bool> {
    let sh = Shell::new().context("failed to set up shell")?;
    let report = date::print_date(&sh);
    Ok(report.is_success())
}

fn init_logging() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("runcheck=info,print_date=info"))
        .context("invalid log filter")?;

    let log_format = std::env::var("RUNCHECK_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let registry = tracing_subscriber::registry().with(env_filter);
    match log_format.as_str() {
        "json" => registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init(),
        _ => registry.with(fmt::layer().with_writer(std::io::stderr)).try_init(),
    }
    .context("failed to install tracing subscriber")
}
