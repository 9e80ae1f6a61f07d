use super::common::StatusResponse;
use crate::{db, errors::ServiceError, schema, AppState};
use axum::{extract::State, Json};
use tracing::info;

/// Create the tables when they do not exist yet
#[utoipa::path(
    post,
    path = "/init-db",
    summary = "Initialize schema",
    description = "Create the products and invoices tables if absent. Safe to call repeatedly.",
    responses(
        (status = 200, description = "Tables are ready", body = StatusResponse),
        (status = 500, description = "Store error", body = crate::errors::ErrorResponse),
        (status = 504, description = "Store did not answer in time", body = crate::errors::ErrorResponse),
    ),
    tag = "schema"
)]
pub async fn init_db(State(state): State<AppState>) -> Result<Json<StatusResponse>, ServiceError> {
    let conn = &*state.db;
    db::with_timeout("init_db", state.config.store_timeout(), async {
        schema::ensure_schema(conn).await?;
        Ok::<_, ServiceError>(())
    })
    .await?;

    info!("schema initialized");
    Ok(Json(StatusResponse::ok("Tables are ready.")))
}
