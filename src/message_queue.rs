/*!
 * # Message Queue
 *
 * Transport for background jobs. Producers `enqueue` message envelopes on a
 * named queue and an independent consumer `dequeue`s them. The backend is
 * picked from configuration: an in-process queue for single-binary setups and
 * tests, or Redis lists when the worker runs as its own process.
 */

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AppConfig;

/// Message queue errors
#[derive(Error, Debug)]
pub enum MessageQueueError {
    #[error("Queue is full")]
    QueueFull,
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl From<serde_json::Error> for MessageQueueError {
    fn from(err: serde_json::Error) -> Self {
        MessageQueueError::SerializationError(err.to_string())
    }
}

impl From<redis::RedisError> for MessageQueueError {
    fn from(err: redis::RedisError) -> Self {
        MessageQueueError::ConnectionError(err.to_string())
    }
}

/// Message envelope for queue items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub queue: String,
    pub payload: serde_json::Value,
    pub enqueued_at: chrono::DateTime<chrono::Utc>,
}

impl Message {
    pub fn new(queue: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            queue: queue.into(),
            payload,
            enqueued_at: chrono::Utc::now(),
        }
    }
}

/// Queue backend contract shared by the dispatcher and the worker.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Appends a message to the tail of `message.queue`.
    async fn enqueue(&self, message: Message) -> Result<(), MessageQueueError>;

    /// Pops the oldest message of `queue`, or `None` when nothing arrived
    /// within the backend's blocking window.
    async fn dequeue(&self, queue: &str) -> Result<Option<Message>, MessageQueueError>;

    /// Round trip to the backend for `/health`.
    async fn health_check(&self) -> Result<(), MessageQueueError>;

    /// Backend identifier used in logs and the health endpoint.
    fn backend_name(&self) -> &'static str;

    /// Whether messages live inside this process. Consumers in other
    /// processes can never see them.
    fn is_in_process(&self) -> bool {
        false
    }
}

/// In-memory message queue implementation
#[derive(Debug)]
pub struct InMemoryMessageQueue {
    queues: Arc<Mutex<HashMap<String, VecDeque<Message>>>>,
    max_size: usize,
}

impl Default for InMemoryMessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMessageQueue {
    pub fn new() -> Self {
        Self::with_max_size(1000)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            max_size,
        }
    }

    /// Number of messages currently waiting on `queue`.
    pub async fn len(&self, queue: &str) -> usize {
        self.queues
            .lock()
            .await
            .get(queue)
            .map(VecDeque::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl MessageQueue for InMemoryMessageQueue {
    async fn enqueue(&self, message: Message) -> Result<(), MessageQueueError> {
        let mut queues = self.queues.lock().await;
        let queue = queues.entry(message.queue.clone()).or_default();

        if queue.len() >= self.max_size {
            return Err(MessageQueueError::QueueFull);
        }

        queue.push_back(message);
        Ok(())
    }

    async fn dequeue(&self, queue: &str) -> Result<Option<Message>, MessageQueueError> {
        let mut queues = self.queues.lock().await;
        Ok(queues.get_mut(queue).and_then(VecDeque::pop_front))
    }

    async fn health_check(&self) -> Result<(), MessageQueueError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }

    fn is_in_process(&self) -> bool {
        true
    }
}

/// Redis list backed queue: `LPUSH` on enqueue, `BRPOP` on dequeue.
///
/// Pushes and pings share one reconnecting `ConnectionManager`. `BRPOP`
/// holds its connection for the whole blocking window, so each pop gets a
/// connection of its own.
pub struct RedisMessageQueue {
    client: redis::Client,
    manager: ConnectionManager,
    namespace: String,
    block_timeout: Duration,
}

impl RedisMessageQueue {
    /// Builds the queue and checks the broker answers a `PING`.
    pub async fn new(
        client: redis::Client,
        namespace: impl Into<String>,
        block_timeout: Duration,
    ) -> Result<Self, MessageQueueError> {
        let manager = ConnectionManager::new(client.clone()).await?;
        let queue = Self {
            client,
            manager,
            namespace: namespace.into(),
            block_timeout,
        };
        queue.health_check().await?;
        Ok(queue)
    }

    fn key(&self, queue: &str) -> String {
        format!("{}:{}", self.namespace, queue)
    }
}

#[async_trait]
impl MessageQueue for RedisMessageQueue {
    async fn enqueue(&self, message: Message) -> Result<(), MessageQueueError> {
        let body = serde_json::to_string(&message)?;
        let mut conn = self.manager.clone();
        let _: i64 = conn.lpush(self.key(&message.queue), body).await?;
        debug!(message_id = %message.id, queue = %message.queue, "pushed message to redis");
        Ok(())
    }

    async fn dequeue(&self, queue: &str) -> Result<Option<Message>, MessageQueueError> {
        let mut conn = self.client.get_async_connection().await?;
        // BRPOP takes whole seconds; zero would block forever.
        let timeout = self.block_timeout.as_secs().max(1);
        let popped: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(self.key(queue))
            .arg(timeout)
            .query_async(&mut conn)
            .await?;

        match popped {
            Some((_, body)) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    async fn health_check(&self) -> Result<(), MessageQueueError> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

/// Builds the queue backend named by `queue_backend`.
///
/// A Redis broker that cannot be reached is an error: jobs must never land
/// in a process-local queue that a standalone worker cannot see.
pub async fn from_config(cfg: &AppConfig) -> Result<Arc<dyn MessageQueue>, MessageQueueError> {
    match cfg.queue_backend.to_ascii_lowercase().as_str() {
        "redis" => {
            let client = redis::Client::open(cfg.broker_url.as_str())?;
            let queue = RedisMessageQueue::new(
                client,
                cfg.queue_namespace.clone(),
                Duration::from_secs(cfg.queue_block_timeout_secs),
            )
            .await?;
            info!("Using redis message queue at {}", cfg.broker_url);
            Ok(Arc::new(queue))
        }
        _ => Ok(Arc::new(InMemoryMessageQueue::with_max_size(
            cfg.queue_max_size,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn in_memory_queue_is_fifo_per_queue() {
        let queue = InMemoryMessageQueue::new();
        let first = Message::new("seed_database", serde_json::json!({"n": 1}));
        let second = Message::new("seed_database", serde_json::json!({"n": 2}));
        let other = Message::new("other", serde_json::json!({"n": 3}));

        queue.enqueue(first.clone()).await.unwrap();
        queue.enqueue(other.clone()).await.unwrap();
        queue.enqueue(second.clone()).await.unwrap();
        assert_eq!(queue.len("seed_database").await, 2);

        assert_eq!(queue.dequeue("seed_database").await.unwrap(), Some(first));
        assert_eq!(queue.dequeue("seed_database").await.unwrap(), Some(second));
        assert_eq!(queue.dequeue("seed_database").await.unwrap(), None);
        assert_eq!(queue.dequeue("other").await.unwrap(), Some(other));
    }

    #[tokio::test]
    async fn in_memory_queue_rejects_when_full() {
        let queue = InMemoryMessageQueue::with_max_size(1);
        queue
            .enqueue(Message::new("q", serde_json::Value::Null))
            .await
            .unwrap();

        let err = queue
            .enqueue(Message::new("q", serde_json::Value::Null))
            .await
            .unwrap_err();
        assert!(matches!(err, MessageQueueError::QueueFull));
    }

    #[tokio::test]
    async fn dequeue_on_unknown_queue_is_empty() {
        let queue = InMemoryMessageQueue::new();
        assert!(queue.dequeue("missing").await.unwrap().is_none());
        assert!(queue.is_in_process());
        assert_eq!(queue.backend_name(), "in-memory");
        assert!(queue.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn in_memory_backend_is_the_default() {
        let queue = from_config(&AppConfig::default()).await.unwrap();
        assert!(queue.is_in_process());
    }

    #[tokio::test]
    async fn unreachable_broker_is_an_error() {
        let mut cfg = AppConfig::default();
        cfg.queue_backend = "redis".to_string();
        cfg.broker_url = "redis://127.0.0.1:1".to_string();

        assert_matches!(
            from_config(&cfg).await.err(),
            Some(MessageQueueError::ConnectionError(_))
        );
    }

    #[tokio::test]
    async fn malformed_broker_url_is_an_error() {
        let mut cfg = AppConfig::default();
        cfg.queue_backend = "redis".to_string();
        cfg.broker_url = "not a url".to_string();

        assert_matches!(
            from_config(&cfg).await.err(),
            Some(MessageQueueError::ConnectionError(_))
        );
    }
}
