//! Binary keeping derived hashring files in sync with member readiness.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ringkeeper_hashring::{
    HashringReconciler, HashringSource, Materializer, Ownership, ReconciliationRun, Scheduler,
    SchedulerConfig,
};
use ringkeeper_readiness::ReadinessProber;
use ringkeeper_readiness_http::{HttpProberOptions, HttpReadinessProber, Scheme};
use tracing::{error, info};

/// CLI-specific error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Hashring reconciliation error
    #[error(transparent)]
    Hashring(#[from] ringkeeper_hashring::Error),

    /// IO operation failed.
    #[error("{0}: {1}")]
    Io(&'static str, #[source] std::io::Error),

    /// Readiness prober error
    #[error(transparent)]
    Readiness(#[from] ringkeeper_readiness_http::Error),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory path to watch hashring files (mutually exclusive with '--file')
    #[arg(long, env = "RINGKEEPER_DIRECTORY")]
    directory: Option<PathBuf>,

    /// Endpoint port offset to perform readiness requests
    #[arg(
        long,
        default_value_t = 1,
        allow_negative_numbers = true,
        env = "RINGKEEPER_ENDPOINT_PORT_OFFSET"
    )]
    endpoint_port_offset: i32,

    /// Endpoint scheme to perform readiness requests (http or https)
    #[arg(long, default_value = "http", env = "RINGKEEPER_ENDPOINT_SCHEME")]
    endpoint_scheme: String,

    /// Endpoint timeout in seconds to perform readiness requests
    #[arg(long, default_value_t = 5, env = "RINGKEEPER_ENDPOINT_TIMEOUT")]
    endpoint_timeout: u64,

    /// Hashring filepath to watch (mutually exclusive with '--directory')
    #[arg(long, env = "RINGKEEPER_FILE")]
    file: Option<PathBuf>,

    /// Watcher scheduler interval in seconds
    #[arg(long, default_value_t = 10, env = "RINGKEEPER_INTERVAL")]
    interval: u64,

    /// Leave ownership of generated files untouched
    #[arg(long, default_value_t = false, env = "RINGKEEPER_NO_CHOWN")]
    no_chown: bool,

    /// Owner set on generated hashring files
    #[arg(long, default_value = "thanos", env = "RINGKEEPER_OWNER")]
    owner: String,

    /// Enable hashring files watcher scheduler
    #[arg(long, default_value_t = false, env = "RINGKEEPER_SCHEDULE")]
    schedule: bool,

    /// Enable verbose mode
    #[arg(long, default_value_t = false, env = "RINGKEEPER_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    launch(args, |options| Ok(HttpReadinessProber::new(options)?)).await
}

/// Validates `args`, then runs one pass or the scheduler until a shutdown
/// signal. No prober is built, and nothing probed, before validation passes.
async fn launch<P, F>(args: Args, make_prober: F) -> Result<(), Error>
where
    P: ReadinessProber,
    F: FnOnce(HttpProberOptions) -> Result<P, Error>,
{
    let source = HashringSource::from_options(args.file.clone(), args.directory.clone())?;
    let timeout = Duration::from_secs(args.endpoint_timeout);
    let config = SchedulerConfig::new(Duration::from_secs(args.interval), timeout)?;
    let scheme = args.endpoint_scheme.parse::<Scheme>()?;

    let prober = make_prober(HttpProberOptions {
        scheme,
        port_offset: args.endpoint_port_offset,
        timeout,
    })?;

    let ownership = if args.no_chown {
        Ownership::Unchanged
    } else {
        Ownership::User(args.owner.clone())
    };

    let run = ReconciliationRun::new(
        HashringReconciler::new(prober),
        Materializer::new(ownership),
    );

    if !args.schedule {
        let report = run.execute_source(&source).await?;
        info!(
            "{} written, {} unchanged, {} failed",
            report.written(),
            report.unchanged(),
            report.failed()
        );
        return Ok(());
    }

    let scheduler = Scheduler::new(config, source, run);
    let scheduler_handle = scheduler.start()?;

    let outcome = tokio::select! {
        result = shutdown_signal() => result,
        result = scheduler_handle => {
            if let Err(e) = result {
                error!("scheduler exited unexpectedly: {:?}", e);
            }
            Ok(())
        }
    };

    scheduler.shutdown().await;

    outcome
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<(), Error> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| Error::Io("failed to create SIGTERM signal", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| Error::Io("failed to create SIGINT signal", e))?;

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = sigint.recv() => info!("received SIGINT"),
    }

    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<(), Error> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| Error::Io("failed to listen for ctrl-c", e))?;
    info!("received ctrl-c");

    Ok(())
}
