use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info};

use sales_report_api as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config().context("failed to load configuration")?;
    api::telemetry::init_tracing(&cfg.log_level, cfg.log_json);

    // Init DB
    let db_pool = api::db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    let db_arc = Arc::new(db_pool);

    let message_queue = api::message_queue::from_config(&cfg)
        .await
        .with_context(|| format!("failed to open the {} message queue", cfg.queue_backend))?;
    let app_state = api::AppState::new(db_arc.clone(), cfg.clone(), message_queue.clone());

    // Jobs queued in this process are invisible to a standalone worker
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = if cfg.embedded_worker || message_queue.is_in_process() {
        let worker = api::jobs::SeedWorker::new(
            message_queue.clone(),
            cfg.queue_name.clone(),
            (*app_state.services.seeder).clone(),
            cfg.worker_poll_interval(),
        );
        info!(backend = message_queue.backend_name(), "starting embedded seed worker");
        Some(tokio::spawn(async move { worker.run(shutdown_rx).await }))
    } else {
        None
    };

    let app = api::app_router(app_state);

    // Bind and serve
    let ip = cfg
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("invalid host address '{}'", cfg.host))?;
    let addr = SocketAddr::new(ip, cfg.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("sales-report-api listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(api::shutdown::shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = worker_handle {
        if let Err(e) = handle.await {
            error!("embedded seed worker panicked: {}", e);
        }
    }

    info!("sales-report-api stopped");
    Ok(())
}
