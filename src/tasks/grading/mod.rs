//! Asynchronous grading of free-response worksheet answers.
//!
//! Each progress row's `status` column is the only lock: dispatch claims rows
//! with a conditional update, workers finish with an update guarded against
//! `Cancelled`, and cancel/regrade write unconditionally.

mod answers;
mod control;
mod dispatcher;
mod error;
mod events;
mod outcome;
mod prompt;
mod store;
mod supervisor;
mod worker;

use std::sync::Arc;

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::db::types::GradingStatus;
use crate::repositories::grading_store::PgGradingStore;
use crate::services::broadcaster::{Broadcaster, RedisBroadcaster};
use crate::services::inference::{InferenceClient, OpenAiInferenceClient};

pub(crate) use dispatcher::DispatchSummary;
pub(crate) use error::GradingError;
pub(crate) use events::{EventPublisher, GradingEvent, GradingEventKind};
pub(crate) use store::{
    EligibleProgress, GradingContext, GradingResult, GradingStore, OpenResponse, RecordAnswer,
};
pub(crate) use supervisor::WorkerSupervisor;

#[derive(Clone)]
pub(crate) struct GradingPipeline {
    store: Arc<dyn GradingStore>,
    inference: Arc<dyn InferenceClient>,
    events: EventPublisher,
    supervisor: WorkerSupervisor,
}

impl GradingPipeline {
    pub(crate) fn new(
        store: Arc<dyn GradingStore>,
        inference: Arc<dyn InferenceClient>,
        events: EventPublisher,
        supervisor: WorkerSupervisor,
    ) -> Self {
        Self { store, inference, events, supervisor }
    }

    pub(crate) fn from_settings(
        settings: &Settings,
        db: PgPool,
        redis: RedisHandle,
    ) -> anyhow::Result<Self> {
        let inference = OpenAiInferenceClient::from_settings(settings)?;
        let broadcaster: Arc<dyn Broadcaster> = Arc::new(RedisBroadcaster::new(redis));

        Ok(Self::new(
            Arc::new(PgGradingStore::new(db)),
            Arc::new(inference),
            EventPublisher::new(broadcaster, settings.grading().event_topic_prefix.clone()),
            WorkerSupervisor::new(settings.grading().max_concurrency),
        ))
    }

    pub(crate) fn supervisor(&self) -> &WorkerSupervisor {
        &self.supervisor
    }

    async fn load_context(
        &self,
        response_id: &str,
        progress_id: &str,
    ) -> Result<GradingContext, GradingError> {
        self.store
            .find_grading_context(response_id, progress_id)
            .await?
            .ok_or_else(|| GradingError::not_found("progress", progress_id))
    }

    fn spawn_worker(&self, response_id: &str, progress_id: &str) {
        let pipeline = self.clone();
        let response_id = response_id.to_string();
        let progress_id = progress_id.to_string();
        self.supervisor.spawn(async move {
            worker::run(pipeline, response_id, progress_id).await;
        });
        metrics::counter!("grading_dispatch_spawned_total").increment(1);
    }

    /// Terminal failure for one attempt: force `Failed`, tell observers.
    async fn mark_failed(&self, response_id: &str, progress_id: &str, err: &GradingError) {
        tracing::error!(response_id, progress_id, error = %err, "Grading attempt failed");
        metrics::counter!("grading_jobs_total", "status" => "failed", "reason" => err.kind())
            .increment(1);

        match self.store.set_status(progress_id, GradingStatus::Failed).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(response_id, progress_id, "Progress vanished before it could be marked failed");
            }
            Err(store_err) => {
                tracing::error!(
                    response_id,
                    progress_id,
                    error = %store_err,
                    "Failed to mark progress as failed"
                );
            }
        }

        self.events
            .publish(GradingEvent::new(GradingEventKind::Failed, response_id, progress_id))
            .await;
    }
}
