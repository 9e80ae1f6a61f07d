#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QuerySelect, Set, Statement,
};
use serde_json::Value;
use sales_report_api::{
    app_router,
    config::AppConfig,
    db,
    entities::{invoice, product},
    jobs::SeedWorker,
    message_queue::{InMemoryMessageQueue, MessageQueue},
    AppState,
};
use tempfile::TempDir;
use tower::ServiceExt;

/// Helper harness for spinning up the application over a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub queue: Arc<InMemoryMessageQueue>,
    _dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Like [`TestApp::new`], letting the caller adjust the configuration first.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = dir.path().join("sales_report_test.db");

        let mut cfg = AppConfig::with_database_url(format!(
            "sqlite://{}?mode=rwc",
            db_path.display()
        ));
        cfg.environment = "test".to_string();
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        adjust(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        let queue = Arc::new(InMemoryMessageQueue::with_max_size(cfg.queue_max_size));
        let state = AppState::new(Arc::new(pool), cfg, queue.clone());
        let router = app_router(state.clone());

        Self {
            router,
            state,
            queue,
            _dir: dir,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }

    /// Worker consuming the same queue the API enqueues on.
    pub fn worker(&self) -> SeedWorker {
        let queue: Arc<dyn MessageQueue> = self.queue.clone();
        SeedWorker::new(
            queue,
            self.state.config.queue_name.clone(),
            (*self.state.services.seeder).clone(),
            self.state.config.worker_poll_interval(),
        )
    }

    /// Send a request without a body against the router.
    pub async fn request(&self, method: Method, uri: &str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn bootstrap(&self) {
        sales_report_api::schema::ensure_schema(self.db())
            .await
            .expect("failed to create schema");
    }

    pub async fn execute(&self, sql: &str) {
        let backend = self.db().get_database_backend();
        self.db()
            .execute(Statement::from_string(backend, sql.to_string()))
            .await
            .expect("failed to execute statement");
    }

    pub async fn insert_product(&self, name: &str, unit_price: Decimal, state: &str) -> i32 {
        let model = product::ActiveModel {
            name: Set(name.to_string()),
            category: Set(Some("Home".to_string())),
            unit_price: Set(unit_price),
            state: Set(state.to_string()),
            ..Default::default()
        };
        product::Entity::insert(model)
            .exec(self.db())
            .await
            .expect("failed to insert product")
            .last_insert_id
    }

    pub async fn insert_invoice(&self, product_id: i32, quantity: i32, customer_state: &str) {
        invoice::ActiveModel {
            product_id: Set(product_id),
            quantity: Set(quantity),
            invoice_date: Set(NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date")),
            customer_state: Set(customer_state.to_string()),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("failed to insert invoice");
    }

    pub async fn product_count(&self) -> u64 {
        product::Entity::find()
            .count(self.db())
            .await
            .expect("failed to count products")
    }

    pub async fn invoice_count(&self) -> u64 {
        invoice::Entity::find()
            .count(self.db())
            .await
            .expect("failed to count invoices")
    }

    pub async fn product_ids(&self) -> Vec<i32> {
        product::Entity::find()
            .select_only()
            .column(product::Column::Id)
            .into_tuple::<i32>()
            .all(self.db())
            .await
            .expect("failed to list product ids")
    }

    pub async fn invoices(&self) -> Vec<invoice::Model> {
        invoice::Entity::find()
            .all(self.db())
            .await
            .expect("failed to list invoices")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body is not json")
}
