use super::common::DataResponse;
use crate::{
    errors::ServiceError,
    services::reports::{ProductRevenue, StateSales},
    AppState,
};
use axum::{extract::State, Json};

/// Revenue per product, highest first
#[utoipa::path(
    get,
    path = "/reports/product-revenue",
    summary = "Product revenue",
    responses(
        (status = 200, description = "Report rows", body = DataResponse<ProductRevenue>),
        (status = 500, description = "Store error", body = crate::errors::ErrorResponse),
        (status = 504, description = "Store did not answer in time", body = crate::errors::ErrorResponse),
    ),
    tag = "reports"
)]
pub async fn product_revenue(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<ProductRevenue>>, ServiceError> {
    let data = state.services.reports.product_revenue_report().await?;
    Ok(Json(DataResponse { data }))
}

/// Revenue per customer state, highest first
#[utoipa::path(
    get,
    path = "/reports/state-sales",
    summary = "State sales",
    responses(
        (status = 200, description = "Report rows", body = DataResponse<StateSales>),
        (status = 500, description = "Store error", body = crate::errors::ErrorResponse),
        (status = 504, description = "Store did not answer in time", body = crate::errors::ErrorResponse),
    ),
    tag = "reports"
)]
pub async fn state_sales(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<StateSales>>, ServiceError> {
    let data = state.services.reports.state_sales_report().await?;
    Ok(Json(DataResponse { data }))
}
