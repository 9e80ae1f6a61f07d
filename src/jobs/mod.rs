//! Background seeding: the dispatcher enqueues [`SeedJob`]s and the worker
//! consumes them. The two sides share nothing but the message queue.

pub mod dispatcher;
pub mod worker;

use crate::services::seeding::SeedParams;
use serde::{Deserialize, Serialize};

pub use dispatcher::{JobDispatcher, JobReceipt};
pub use worker::SeedWorker;

/// Payload of a seeding message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedJob {
    pub num_products: u32,
    pub num_invoices: u32,
}

impl From<SeedParams> for SeedJob {
    fn from(params: SeedParams) -> Self {
        Self {
            num_products: params.num_products,
            num_invoices: params.num_invoices,
        }
    }
}

impl From<SeedJob> for SeedParams {
    fn from(job: SeedJob) -> Self {
        SeedParams::new(job.num_products, job.num_invoices)
    }
}
