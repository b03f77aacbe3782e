use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::redis::RedisHandle;

/// Best-effort fan-out of named events to a topic.
#[async_trait]
pub(crate) trait Broadcaster: Send + Sync {
    async fn publish(&self, topic: &str, event: &str, payload: &Value) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub(crate) struct RedisBroadcaster {
    redis: RedisHandle,
}

impl RedisBroadcaster {
    pub(crate) fn new(redis: RedisHandle) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl Broadcaster for RedisBroadcaster {
    async fn publish(&self, topic: &str, event: &str, payload: &Value) -> anyhow::Result<()> {
        let message = json!({ "event": event, "payload": payload }).to_string();
        match self.redis.publish(topic, &message).await? {
            Some(receivers) => {
                tracing::trace!(topic, event, receivers, "Published grading event");
            }
            None => {
                tracing::debug!(topic, event, "Redis not connected; grading event not published");
            }
        }
        Ok(())
    }
}
