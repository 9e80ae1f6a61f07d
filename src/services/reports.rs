use crate::{
    db::{self, DbPool},
    errors::ServiceError,
    schema,
};
use metrics::histogram;
use sea_orm::{ConnectionTrait, DbBackend, FromQueryResult, Statement};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use utoipa::ToSchema;

/// Revenue attributed to one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductRevenue {
    #[serde(rename = "ProductID")]
    pub product_id: i32,
    #[serde(rename = "ProductName")]
    pub product_name: String,
    #[serde(rename = "TotalRevenue")]
    pub total_revenue: f64,
}

/// Revenue attributed to one customer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StateSales {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "TotalRevenue")]
    pub total_revenue: f64,
}

#[derive(Debug, FromQueryResult)]
struct ProductRevenueRow {
    product_id: i32,
    product_name: String,
    total_revenue: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct StateSalesRow {
    state: String,
    total_revenue: Option<f64>,
}

/// Read-only sales aggregations over products and invoices.
#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
    store_timeout: Duration,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>, store_timeout: Duration) -> Self {
        Self {
            db_pool,
            store_timeout,
        }
    }

    /// Total revenue per product, highest first. Products without invoices
    /// do not appear.
    #[instrument(skip(self))]
    pub async fn product_revenue_report(&self) -> Result<Vec<ProductRevenue>, ServiceError> {
        let started = Instant::now();
        let db = &*self.db_pool;
        let backend = db.get_database_backend();
        let sql = format!(
            "SELECT p.id AS product_id, p.name AS product_name, \
             CAST(SUM(i.quantity * p.unit_price) AS {}) AS total_revenue \
             FROM invoices i \
             INNER JOIN products p ON i.product_id = p.id \
             GROUP BY p.id, p.name \
             ORDER BY total_revenue DESC",
            double_type(backend)
        );

        let rows = db::with_timeout("product_revenue_report", self.store_timeout, async {
            schema::ensure_schema(db).await?;
            let rows = ProductRevenueRow::find_by_statement(Statement::from_string(backend, sql))
                .all(db)
                .await?;
            Ok::<_, ServiceError>(rows)
        })
        .await?;

        histogram!(
            "sales_report.report.duration_seconds",
            started.elapsed().as_secs_f64(),
            "report" => "product_revenue"
        );
        debug!(rows = rows.len(), "product revenue report built");

        Ok(rows
            .into_iter()
            .map(|row| ProductRevenue {
                product_id: row.product_id,
                product_name: row.product_name,
                total_revenue: row.total_revenue.unwrap_or(0.0),
            })
            .collect())
    }

    /// Total revenue per customer state, highest first.
    #[instrument(skip(self))]
    pub async fn state_sales_report(&self) -> Result<Vec<StateSales>, ServiceError> {
        let started = Instant::now();
        let db = &*self.db_pool;
        let backend = db.get_database_backend();
        let sql = format!(
            "SELECT i.customer_state AS state, \
             CAST(SUM(i.quantity * p.unit_price) AS {}) AS total_revenue \
             FROM invoices i \
             INNER JOIN products p ON i.product_id = p.id \
             GROUP BY i.customer_state \
             ORDER BY total_revenue DESC",
            double_type(backend)
        );

        let rows = db::with_timeout("state_sales_report", self.store_timeout, async {
            schema::ensure_schema(db).await?;
            let rows = StateSalesRow::find_by_statement(Statement::from_string(backend, sql))
                .all(db)
                .await?;
            Ok::<_, ServiceError>(rows)
        })
        .await?;

        histogram!(
            "sales_report.report.duration_seconds",
            started.elapsed().as_secs_f64(),
            "report" => "state_sales"
        );
        debug!(rows = rows.len(), "state sales report built");

        Ok(rows
            .into_iter()
            .map(|row| StateSales {
                state: row.state,
                total_revenue: row.total_revenue.unwrap_or(0.0),
            })
            .collect())
    }
}

/// Floating point type name for `CAST`, which differs per backend.
fn double_type(backend: DbBackend) -> &'static str {
    match backend {
        DbBackend::Postgres => "DOUBLE PRECISION",
        DbBackend::MySql => "DOUBLE",
        DbBackend::Sqlite => "REAL",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_serialize_with_report_field_names() {
        let row = ProductRevenue {
            product_id: 3,
            product_name: "Lamp".into(),
            total_revenue: 50.0,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ProductID": 3, "ProductName": "Lamp", "TotalRevenue": 50.0})
        );

        let state = serde_json::to_value(StateSales {
            state: "CA".into(),
            total_revenue: 40.0,
        })
        .unwrap();
        assert_eq!(state, serde_json::json!({"State": "CA", "TotalRevenue": 40.0}));
    }

    #[test]
    fn double_cast_matches_backend() {
        assert_eq!(double_type(DbBackend::Postgres), "DOUBLE PRECISION");
        assert_eq!(double_type(DbBackend::MySql), "DOUBLE");
        assert_eq!(double_type(DbBackend::Sqlite), "REAL");
    }
}
