//! `counterline` binary: runs one simulation and prints the event log to stdout.
//!
//! Diagnostics go to stderr through `tracing` (`RUST_LOG` overrides the `info` default).

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use counterline::{Config, Controller, LogWriter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "counterline")]
#[command(about = "Token queue feeding a fixed pool of service counters", long_about = None)]
struct Args {
    /// Number of service counters
    #[arg(short, long, default_value_t = 3)]
    counters: usize,

    /// Run duration in milliseconds (0 = until Ctrl-C)
    #[arg(long, default_value_t = 30_000)]
    run_ms: u64,

    /// Interval between generated tokens in milliseconds
    #[arg(long, default_value_t = 1_000)]
    period_ms: u64,

    /// Service duration per token in milliseconds
    #[arg(long, default_value_t = 3_000)]
    service_ms: u64,

    /// Wait for in-flight services on shutdown, in milliseconds (0 = hard stop)
    #[arg(long, default_value_t = 5_000)]
    grace_ms: u64,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            counters: args.counters,
            run_for: Duration::from_millis(args.run_ms),
            token_period: Duration::from_millis(args.period_ms),
            service_time: Duration::from_millis(args.service_ms),
            grace: Duration::from_millis(args.grace_ms),
            ..Config::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let report = Controller::builder(Config::from(args))
        .with_subscriber(Arc::new(LogWriter::new()))
        .build()
        .run()
        .await?;

    tracing::info!(
        reason = %report.reason,
        generated = report.generated,
        assigned = report.assigned,
        delivered = report.delivered,
        pending = report.pending.len(),
        interrupted = report.interrupted.len(),
        "simulation finished"
    );
    Ok(())
}
