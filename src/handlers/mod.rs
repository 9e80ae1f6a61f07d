pub mod common;
pub mod health;
pub mod reports;
pub mod schema;
pub mod seed;

use crate::{
    config::AppConfig,
    db::DbPool,
    jobs::JobDispatcher,
    message_queue::MessageQueue,
    services::{reports::ReportService, seeding::SeedService},
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub reports: Arc<ReportService>,
    pub seeder: Arc<SeedService>,
    pub dispatcher: Arc<JobDispatcher>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, message_queue: Arc<dyn MessageQueue>, cfg: &AppConfig) -> Self {
        Self {
            reports: Arc::new(ReportService::new(db_pool.clone(), cfg.store_timeout())),
            seeder: Arc::new(SeedService::new(db_pool, cfg.seed_timeout())),
            dispatcher: Arc::new(JobDispatcher::new(message_queue, cfg.queue_name.clone())),
        }
    }
}
