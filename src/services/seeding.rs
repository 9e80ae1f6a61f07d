use crate::{
    db::{self, DbPool},
    entities::{invoice, product},
    errors::ServiceError,
    schema,
    services::generator::{InvoiceDraft, ProductDraft, SeedGenerator},
};
use metrics::counter;
use sea_orm::{DatabaseTransaction, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};
use utoipa::ToSchema;

/// Invoices are written in batches of this many rows.
pub const INVOICE_BATCH_SIZE: usize = 500;

/// How many rows one seeding run creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SeedParams {
    pub num_products: u32,
    pub num_invoices: u32,
}

impl SeedParams {
    pub fn new(num_products: u32, num_invoices: u32) -> Self {
        Self {
            num_products,
            num_invoices,
        }
    }

    /// Invoices need at least one product to reference.
    pub fn check(&self) -> Result<(), ServiceError> {
        if self.num_products == 0 && self.num_invoices > 0 {
            return Err(ServiceError::ValidationError(
                "num_products must be positive when num_invoices is positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rows written by one seeding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SeedSummary {
    pub products_inserted: usize,
    pub invoices_inserted: usize,
}

/// Bootstraps the schema and fills it with generated products and invoices.
#[derive(Clone)]
pub struct SeedService {
    db_pool: Arc<DbPool>,
    generator: SeedGenerator,
    seed_timeout: Duration,
}

impl SeedService {
    pub fn new(db_pool: Arc<DbPool>, seed_timeout: Duration) -> Self {
        Self {
            db_pool,
            generator: SeedGenerator::new(),
            seed_timeout,
        }
    }

    /// Seeds the store in a single transaction. On any failure nothing from
    /// this run is left behind.
    #[instrument(skip(self), fields(num_products = params.num_products, num_invoices = params.num_invoices))]
    pub async fn seed(&self, params: SeedParams) -> Result<SeedSummary, ServiceError> {
        params.check()?;

        let generator = self.generator;
        let pool = self.db_pool.clone();

        let summary = db::with_timeout("seed", self.seed_timeout, async move {
            schema::ensure_schema(&*pool).await?;
            let (products, invoices) = tokio::task::spawn_blocking(move || {
                generator.generate(params.num_products as usize, params.num_invoices as usize)
            })
            .await
            .map_err(|e| ServiceError::InternalError(format!("data generation failed: {}", e)))?;

            db::transaction::<_, _, ServiceError>(&pool, move |txn| {
                Box::pin(insert_drafts(txn, products, invoices))
            })
            .await
        })
        .await?;

        counter!(
            "sales_report.seed.products_inserted",
            summary.products_inserted as u64
        );
        counter!(
            "sales_report.seed.invoices_inserted",
            summary.invoices_inserted as u64
        );
        info!(
            products = summary.products_inserted,
            invoices = summary.invoices_inserted,
            "database seeded"
        );
        Ok(summary)
    }
}

async fn insert_drafts(
    txn: &DatabaseTransaction,
    products: Vec<ProductDraft>,
    invoices: Vec<InvoiceDraft>,
) -> Result<SeedSummary, ServiceError> {
    let mut product_ids = Vec::with_capacity(products.len());
    for draft in products {
        let model = product::ActiveModel {
            name: Set(draft.name),
            category: Set(Some(draft.category)),
            unit_price: Set(draft.unit_price),
            state: Set(draft.state),
            ..Default::default()
        };
        let inserted = product::Entity::insert(model).exec(txn).await?;
        product_ids.push(inserted.last_insert_id);
    }

    let mut invoices_inserted = 0;
    for batch in invoices.chunks(INVOICE_BATCH_SIZE) {
        let models = batch
            .iter()
            .map(|draft| {
                let product_id = product_ids.get(draft.product_index).copied().ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "invoice references product #{} of {}",
                        draft.product_index,
                        product_ids.len()
                    ))
                })?;
                Ok(invoice::ActiveModel {
                    product_id: Set(product_id),
                    quantity: Set(draft.quantity),
                    invoice_date: Set(draft.invoice_date),
                    customer_state: Set(draft.customer_state.clone()),
                    ..Default::default()
                })
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        invoice::Entity::insert_many(models).exec(txn).await?;
        invoices_inserted += batch.len();
    }

    Ok(SeedSummary {
        products_inserted: product_ids.len(),
        invoices_inserted,
    })
}
