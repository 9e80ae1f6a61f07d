use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::{
    errors::ErrorResponse,
    handlers::{
        self,
        common::StatusResponse,
        health::{ComponentStatus, DatabaseCheck, HealthChecks, HealthResponse, QueueCheck},
    },
    services::reports::{ProductRevenue, StateSales},
    AppState,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sales Report API",
        version = "1.0.0",
        description = r#"
Seeds a products/invoices store with synthetic data and serves two sales
reports.

`POST /seed` only enqueues work; a seed worker performs it later.
`POST /seed-sync` runs the same work inline and reports the outcome.
"#
    ),
    paths(
        handlers::schema::init_db,
        handlers::seed::seed,
        handlers::seed::seed_sync,
        handlers::reports::product_revenue,
        handlers::reports::state_sales,
        handlers::health::health,
    ),
    components(schemas(
        StatusResponse,
        ErrorResponse,
        ProductRevenue,
        StateSales,
        HealthResponse,
        HealthChecks,
        DatabaseCheck,
        QueueCheck,
        ComponentStatus,
    )),
    tags(
        (name = "schema", description = "Schema bootstrap"),
        (name = "seeding", description = "Synthetic data generation"),
        (name = "reports", description = "Sales aggregations"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Serves the generated document at `/api-docs/openapi.json`.
pub fn openapi_routes() -> Router<AppState> {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}
