use std::sync::Arc;

use serde_json::{json, Value};

use crate::db::types::GradingStatus;
use crate::services::broadcaster::Broadcaster;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GradingEventKind {
    Started,
    Completed,
    Failed,
    Cancelled,
}

impl GradingEventKind {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Started => "grading-started",
            Self::Completed => "grading-completed",
            Self::Failed => "grading-failed",
            Self::Cancelled => "grading-cancelled",
        }
    }

    /// Status the row holds when the event is emitted.
    pub(crate) fn status(self) -> GradingStatus {
        match self {
            Self::Started => GradingStatus::Pending,
            Self::Completed => GradingStatus::Completed,
            Self::Failed => GradingStatus::Failed,
            Self::Cancelled => GradingStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GradingEvent {
    pub(crate) kind: GradingEventKind,
    pub(crate) response_id: String,
    pub(crate) progress_id: String,
}

impl GradingEvent {
    pub(crate) fn new(kind: GradingEventKind, response_id: &str, progress_id: &str) -> Self {
        Self { kind, response_id: response_id.to_string(), progress_id: progress_id.to_string() }
    }

    pub(crate) fn payload(&self) -> Value {
        json!({
            "responseId": self.response_id,
            "progressId": self.progress_id,
            "status": self.kind.status(),
        })
    }
}

/// Publishes grading events to the response-scoped topic. Broadcaster
/// failures are logged and counted, never returned.
#[derive(Clone)]
pub(crate) struct EventPublisher {
    broadcaster: Arc<dyn Broadcaster>,
    topic_prefix: String,
}

impl EventPublisher {
    pub(crate) fn new(broadcaster: Arc<dyn Broadcaster>, topic_prefix: impl Into<String>) -> Self {
        Self { broadcaster, topic_prefix: topic_prefix.into() }
    }

    pub(crate) fn topic_for(&self, response_id: &str) -> String {
        format!("{}:{response_id}", self.topic_prefix)
    }

    pub(crate) async fn publish(&self, event: GradingEvent) {
        let topic = self.topic_for(&event.response_id);
        let name = event.kind.name();

        if let Err(err) = self.broadcaster.publish(&topic, name, &event.payload()).await {
            tracing::warn!(
                topic = %topic,
                event = name,
                progress_id = %event.progress_id,
                error = %err,
                "Failed to publish grading event"
            );
            metrics::counter!("grading_events_publish_failed_total", "event" => name).increment(1);
        }
    }
}
