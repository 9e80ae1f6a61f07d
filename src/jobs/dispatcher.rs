use super::SeedJob;
use crate::{
    errors::ServiceError,
    message_queue::{Message, MessageQueue},
    services::seeding::SeedParams,
};
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Handle for an accepted job. Execution happens later, elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReceipt {
    pub job_id: Uuid,
    pub queue: String,
}

/// Producer side of background seeding.
#[derive(Clone)]
pub struct JobDispatcher {
    queue: Arc<dyn MessageQueue>,
    queue_name: String,
}

impl JobDispatcher {
    pub fn new(queue: Arc<dyn MessageQueue>, queue_name: impl Into<String>) -> Self {
        Self {
            queue,
            queue_name: queue_name.into(),
        }
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Enqueues a seeding job and returns without waiting for it to run.
    pub async fn seed_async(&self, params: SeedParams) -> Result<JobReceipt, ServiceError> {
        let payload = serde_json::to_value(SeedJob::from(params))?;
        let message = Message::new(self.queue_name.clone(), payload);
        let job_id = message.id;

        self.queue.enqueue(message).await.map_err(|e| {
            error!(job_id = %job_id, queue = %self.queue_name, "Failed to enqueue seed job: {}", e);
            counter!("sales_report.jobs.enqueue_failed", 1);
            ServiceError::from(e)
        })?;

        counter!("sales_report.jobs.enqueued", 1, "queue" => self.queue_name.clone());
        info!(
            job_id = %job_id,
            queue = %self.queue_name,
            backend = self.queue.backend_name(),
            num_products = params.num_products,
            num_invoices = params.num_invoices,
            "seed job enqueued"
        );

        Ok(JobReceipt {
            job_id,
            queue: self.queue_name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_queue::InMemoryMessageQueue;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn enqueues_a_seed_job_envelope() {
        let queue = Arc::new(InMemoryMessageQueue::new());
        let dispatcher = JobDispatcher::new(queue.clone(), "seed_database");

        let receipt = dispatcher
            .seed_async(SeedParams::new(4, 20))
            .await
            .unwrap();
        assert_eq!(receipt.queue, "seed_database");

        let message = queue.dequeue("seed_database").await.unwrap().unwrap();
        assert_eq!(message.id, receipt.job_id);
        assert_eq!(message.queue, "seed_database");
        let job: SeedJob = serde_json::from_value(message.payload).unwrap();
        assert_eq!(
            job,
            SeedJob {
                num_products: 4,
                num_invoices: 20
            }
        );
    }

    #[tokio::test]
    async fn full_queue_surfaces_as_queue_error() {
        let queue = Arc::new(InMemoryMessageQueue::with_max_size(1));
        let dispatcher = JobDispatcher::new(queue, "seed_database");

        dispatcher.seed_async(SeedParams::new(1, 1)).await.unwrap();
        let err = dispatcher
            .seed_async(SeedParams::new(1, 1))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::QueueError(_));
    }
}
