//! Sales Report API Library
//!
//! Seeds a products/invoices store with synthetic data, in the background or
//! inline, and serves product and state revenue reports over HTTP.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod jobs;
pub mod message_queue;
pub mod openapi;
pub mod schema;
pub mod services;
pub mod shutdown;
pub mod telemetry;

use axum::{
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::timeout::TimeoutLayer;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub queue: Arc<dyn message_queue::MessageQueue>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        queue: Arc<dyn message_queue::MessageQueue>,
    ) -> Self {
        let services = handlers::AppServices::new(db.clone(), queue.clone(), &config);
        Self {
            db,
            config: Arc::new(config),
            queue,
            services,
        }
    }
}

/// Routes for schema bootstrap, seeding and reports.
pub fn api_routes(sync_seed_enabled: bool) -> Router<AppState> {
    let mut router = Router::new()
        .route("/init-db", post(handlers::schema::init_db))
        .route("/seed", post(handlers::seed::seed))
        .route(
            "/reports/product-revenue",
            get(handlers::reports::product_revenue),
        )
        .route("/reports/state-sales", get(handlers::reports::state_sales));

    if sync_seed_enabled {
        router = router.route("/seed-sync", post(handlers::seed::seed_sync));
    }

    router
}

/// Full application router with middleware applied.
pub fn app_router(state: AppState) -> Router {
    let request_timeout = state.config.request_timeout();

    Router::new()
        .route("/health", get(handlers::health::health))
        .merge(api_routes(state.config.sync_seed_enabled))
        .merge(openapi::openapi_routes())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(telemetry::configure_http_tracing())
        .layer(TimeoutLayer::new(request_timeout))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(telemetry::request_id_middleware))
        .with_state(state)
}
