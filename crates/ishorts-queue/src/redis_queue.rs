//! Queue backend on Redis lists and pub/sub.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, AsyncConnectionConfig};
use tracing::{debug, warn};

use crate::backend::{NotificationStream, PoppedTask, QueueBackend};
use crate::error::{QueueError, QueueResult};

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        }
    }
}

/// Redis-backed queue.
///
/// Tasks are pushed with `LPUSH` and popped with `BRPOP`, giving FIFO order
/// per queue and atomic delivery to a single popper across processes.
#[derive(Clone)]
pub struct RedisQueue {
    client: redis::Client,
}

impl RedisQueue {
    /// Create a new Redis queue client.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    /// Check connectivity with `PING`.
    pub async fn ping(&self) -> QueueResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }

    async fn connection(&self) -> QueueResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| QueueError::connection_failed(e.to_string()))
    }

    /// Connection dedicated to one blocking pop.
    ///
    /// A blocking command stalls every request pipelined behind it, so pops
    /// never share a connection, and the response timeout has to outlast the
    /// server-side block.
    async fn blocking_connection(&self, block: Duration) -> QueueResult<MultiplexedConnection> {
        let config = AsyncConnectionConfig::new()
            .set_response_timeout(response_timeout(block));
        self.client
            .get_multiplexed_async_connection_with_config(&config)
            .await
            .map_err(|e| QueueError::connection_failed(e.to_string()))
    }
}

/// Client-side deadline for a pop that blocks server-side for `block`.
fn response_timeout(block: Duration) -> Duration {
    block.saturating_add(Duration::from_secs(5))
}

#[async_trait]
impl QueueBackend for RedisQueue {
    async fn push(&self, queue: &str, payload: String) -> QueueResult<()> {
        let mut conn = self.connection().await?;
        conn.lpush::<_, _, ()>(queue, payload)
            .await
            .map_err(|e| QueueError::enqueue_failed(format!("LPUSH {}: {}", queue, e)))?;
        debug!(queue, "Pushed task");
        Ok(())
    }

    async fn pop(&self, queues: &[&str], timeout: Duration) -> QueueResult<Option<PoppedTask>> {
        let mut conn = self.blocking_connection(timeout).await?;

        // BRPOP treats 0 as "block forever"; keep a floor so callers always get control back.
        let block_secs = timeout.as_secs_f64().max(0.01);

        let popped: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(queues)
            .arg(block_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::dequeue_failed(e.to_string()))?;

        Ok(popped.map(|(queue, payload)| PoppedTask { queue, payload }))
    }

    async fn len(&self, queue: &str) -> QueueResult<u64> {
        let mut conn = self.connection().await?;
        let len: u64 = conn.llen(queue).await?;
        Ok(len)
    }

    async fn publish(&self, channel: &str, payload: String) -> QueueResult<()> {
        let mut conn = self.connection().await?;
        let receivers: u64 = conn.publish(channel, payload).await?;
        if receivers == 0 {
            warn!(channel, "Published notification with no subscribers");
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> QueueResult<NotificationStream> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(channel).await?;

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            match msg.get_payload::<String>() {
                Ok(payload) => Some(payload),
                Err(e) => {
                    warn!("Dropping non-text notification: {}", e);
                    None
                }
            }
        });

        Ok(Box::pin(stream))
    }
}
