use crate::{config::AppConfig, errors::ServiceError, services::seeding::SeedParams};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Status body shared by the schema and seeding endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    /// "ok", "accepted" or "error"
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
        }
    }

    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            status: "accepted".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }

    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Report envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
}

/// Raw seed query string. Values stay textual so that blank, malformed and
/// out-of-range input can be told apart.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SeedQuery {
    /// Number of products to create (default 10)
    pub num_products: Option<String>,
    /// Number of invoices to create (default 100)
    pub num_invoices: Option<String>,
}

impl SeedQuery {
    /// Resolves the query against the configured defaults and caps.
    pub fn resolve(self, cfg: &AppConfig) -> Result<SeedParams, ServiceError> {
        let params = SeedParams::new(
            parse_count(
                "num_products",
                self.num_products.as_deref(),
                cfg.default_num_products,
                cfg.max_num_products,
            )?,
            parse_count(
                "num_invoices",
                self.num_invoices.as_deref(),
                cfg.default_num_invoices,
                cfg.max_num_invoices,
            )?,
        );
        params.check()?;
        Ok(params)
    }
}

/// Missing or blank values fall back to `default`.
fn parse_count(name: &str, raw: Option<&str>, default: u32, max: u32) -> Result<u32, ServiceError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(default),
        Some(value) => value,
    };

    let value: i64 = raw.parse().map_err(|_| {
        ServiceError::ValidationError(format!("{} must be a whole number, got '{}'", name, raw))
    })?;

    if value < 0 {
        return Err(ServiceError::ValidationError(format!(
            "{} must not be negative",
            name
        )));
    }
    if value > i64::from(max) {
        return Err(ServiceError::ValidationError(format!(
            "{} must be at most {}",
            name, max
        )));
    }

    u32::try_from(value).map_err(|_| {
        ServiceError::ValidationError(format!("{} must be at most {}", name, max))
    })
}
