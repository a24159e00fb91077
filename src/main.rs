use clap::Parser;
use std::process::ExitCode;

mod catalog;
mod classify;
mod cli;
mod commands;
mod config;
mod console;
mod executor;
mod followup;
mod gate;
mod lock;
mod process;
mod queue;
mod record;
mod report;
mod session;

const LOG_ENV: &str = "STEPQ_LOG";

fn main() -> ExitCode {
    let args = cli::RootArgs::parse();
    init_tracing(args.verbose);

    match commands::dispatch(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Logs go to stderr so step output on stdout stays clean.
fn init_tracing(verbose: bool) {
    let fallback_level = if verbose { "debug" } else { "warn" };
    let filter = std::env::var(LOG_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| tracing_subscriber::EnvFilter::try_new(value).ok())
        .or_else(|| tracing_subscriber::EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new(fallback_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
