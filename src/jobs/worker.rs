use super::SeedJob;
use crate::{
    message_queue::{Message, MessageQueue, MessageQueueError},
    services::seeding::SeedService,
};
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Consumer side of background seeding.
///
/// Failed jobs are logged and dropped; nothing is retried.
#[derive(Clone)]
pub struct SeedWorker {
    queue: Arc<dyn MessageQueue>,
    queue_name: String,
    seeder: SeedService,
    poll_interval: Duration,
}

impl SeedWorker {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        queue_name: impl Into<String>,
        seeder: SeedService,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            queue_name: queue_name.into(),
            seeder,
            poll_interval,
        }
    }

    /// Processes messages until `shutdown` flips to `true` or its sender is
    /// dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            queue = %self.queue_name,
            backend = self.queue.backend_name(),
            "seed worker started"
        );

        while !*shutdown.borrow() {
            let idle = match self.process_next().await {
                Ok(found) => !found,
                Err(e) => {
                    error!(queue = %self.queue_name, "seed worker could not read the queue: {}", e);
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }

        info!(queue = %self.queue_name, "seed worker stopped");
    }

    /// Handles at most one message. Returns whether one was found.
    pub async fn process_next(&self) -> Result<bool, MessageQueueError> {
        match self.queue.dequeue(&self.queue_name).await? {
            Some(message) => {
                self.handle(message).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Processes messages until the queue is empty. Returns how many were
    /// taken off the queue.
    pub async fn drain(&self) -> Result<usize, MessageQueueError> {
        let mut processed = 0;
        while self.process_next().await? {
            processed += 1;
        }
        Ok(processed)
    }

    async fn handle(&self, message: Message) {
        let job_id = message.id;
        let job: SeedJob = match serde_json::from_value(message.payload) {
            Ok(job) => job,
            Err(e) => {
                warn!(job_id = %job_id, "dropping undecodable seed job: {}", e);
                counter!("sales_report.jobs.failed", 1, "reason" => "decode");
                return;
            }
        };

        info!(
            job_id = %job_id,
            num_products = job.num_products,
            num_invoices = job.num_invoices,
            "running seed job"
        );

        match self.seeder.seed(job.into()).await {
            Ok(summary) => {
                counter!("sales_report.jobs.processed", 1);
                info!(
                    job_id = %job_id,
                    products = summary.products_inserted,
                    invoices = summary.invoices_inserted,
                    "seed job finished"
                );
            }
            Err(e) => {
                counter!("sales_report.jobs.failed", 1, "reason" => "execution");
                error!(job_id = %job_id, "seed job failed: {}", e);
            }
        }
    }
}
