use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use sales_report_api::{
    config, db, jobs::SeedWorker, message_queue, services::seeding::SeedService, shutdown,
    telemetry,
};
use tokio::sync::watch;
use tracing::{info, warn};

/// Consumes seed jobs queued by the API.
#[derive(Debug, Parser)]
#[command(name = "seed-worker", version, about)]
struct Cli {
    /// Process what is queued right now, then exit
    #[arg(long)]
    drain: bool,

    /// Sleep between polls of an empty queue (overrides worker_poll_interval_ms)
    #[arg(long)]
    poll_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    telemetry::init_tracing(&cfg.log_level, cfg.log_json);

    let queue = message_queue::from_config(&cfg)
        .await
        .with_context(|| format!("broker at {} is unreachable", cfg.broker_url))?;
    if queue.is_in_process() {
        warn!("in-memory queue selected; this worker only sees jobs it enqueues itself");
    }

    let db_pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    let seeder = SeedService::new(Arc::new(db_pool), cfg.seed_timeout());

    let poll_interval = cli
        .poll_interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| cfg.worker_poll_interval());
    let worker = SeedWorker::new(queue, cfg.queue_name.clone(), seeder, poll_interval);

    if cli.drain {
        let processed = worker.drain().await.context("failed to read the queue")?;
        info!(processed, "queue drained");
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    worker.run(shutdown_rx).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_drain_and_poll_interval() {
        let cli = Cli::parse_from(["seed-worker", "--drain", "--poll-interval-ms", "250"]);
        assert!(cli.drain);
        assert_eq!(cli.poll_interval_ms, Some(250));
    }
}
