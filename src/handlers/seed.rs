use super::common::{SeedQuery, StatusResponse};
use crate::{errors::ServiceError, AppState};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::Response,
};
use tracing::{error, info};

/// Queue a background seeding job
#[utoipa::path(
    post,
    path = "/seed",
    summary = "Seed asynchronously",
    description = "Validate the counts, enqueue a seeding job and return before it runs.",
    params(SeedQuery),
    responses(
        (status = 202, description = "Job accepted", body = StatusResponse,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid counts", body = crate::errors::ErrorResponse),
        (status = 503, description = "Broker unavailable", body = crate::errors::ErrorResponse),
    ),
    tag = "seeding"
)]
pub async fn seed(
    State(state): State<AppState>,
    query: Result<Query<SeedQuery>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let Query(query) = query?;
    let params = query.resolve(&state.config)?;
    let receipt = state.services.dispatcher.seed_async(params).await?;

    info!(job_id = %receipt.job_id, "seed request accepted");
    Ok(StatusResponse::accepted("seeding database").with_status(StatusCode::ACCEPTED))
}

/// Seed inline and report the outcome
#[utoipa::path(
    post,
    path = "/seed-sync",
    summary = "Seed synchronously",
    description = "Run the whole seeding unit of work before responding.",
    params(SeedQuery),
    responses(
        (status = 200, description = "Database seeded", body = StatusResponse),
        (status = 400, description = "Invalid counts", body = crate::errors::ErrorResponse),
        (status = 500, description = "Seeding failed and was rolled back", body = StatusResponse),
    ),
    tag = "seeding"
)]
pub async fn seed_sync(
    State(state): State<AppState>,
    query: Result<Query<SeedQuery>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let Query(query) = query?;
    let params = query.resolve(&state.config)?;

    match state.services.seeder.seed(params).await {
        Ok(summary) => {
            info!(
                products = summary.products_inserted,
                invoices = summary.invoices_inserted,
                "synchronous seed finished"
            );
            Ok(StatusResponse::ok("Database seeded successfully").with_status(StatusCode::OK))
        }
        Err(e) => {
            error!("synchronous seed failed: {}", e);
            Ok(StatusResponse::error(e.to_string()).with_status(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}
