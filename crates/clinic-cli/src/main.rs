//! clinic-admin - command-line administration for the campus clinic site.
//!
//! Logs in against the clinic backend, keeps the session tokens between
//! runs and exposes the department, doctor, schedule and article calls.

mod commands;
mod prompt;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clinic_core::{Clinic, Config, SessionEvent};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clap::Parser;
use commands::Cli;

// ============================================================================
// Constants
// ============================================================================

/// Prefix of the daily log files in the cache directory
const LOG_FILE_PREFIX: &str = "clinic-admin.log";

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` controls the level (default `warn`). Events go to stderr and,
/// when `log_dir` is usable, to a daily rolling file. The returned guard
/// flushes the file writer when dropped.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir.filter(|dir| std::fs::create_dir_all(dir).is_ok()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();

    guard
}

/// Print the session notifications that piled up while a command ran.
fn report_events(events: &mut broadcast::Receiver<SessionEvent>) {
    loop {
        match events.try_recv() {
            Ok(SessionEvent::Expired { reason }) => {
                eprintln!("Session expired: {}", reason);
                eprintln!("Run `clinic-admin login` to sign in again.");
            }
            Ok(SessionEvent::Refreshed) => info!("Access token was refreshed"),
            Ok(_) => {}
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    let _guard = init_tracing(config.cache_dir().ok().as_deref());
    info!(json = cli.json, "clinic-admin starting");

    let clinic = Clinic::from_config(&config)?;
    let mut events = clinic.subscribe();

    let result = commands::execute(&clinic, &mut config, cli).await;
    report_events(&mut events);
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
