use crate::db::types::GradingStatus;

use super::{GradingError, GradingEvent, GradingEventKind, GradingPipeline};

impl GradingPipeline {
    /// Forces the row to `Cancelled` and removes its AI comments. An in-flight
    /// worker keeps running; its completion write is rejected by the guard.
    pub(crate) async fn cancel_grading(
        &self,
        response_id: &str,
        progress_id: &str,
    ) -> Result<(), GradingError> {
        self.load_context(response_id, progress_id).await?;

        if !self.store.set_status(progress_id, GradingStatus::Cancelled).await? {
            return Err(GradingError::not_found("progress", progress_id));
        }
        let removed = self.store.delete_ai_comments(progress_id).await?;

        tracing::info!(response_id, progress_id, removed_comments = removed, "Grading cancelled");
        metrics::counter!("grading_cancellations_total").increment(1);

        self.events
            .publish(GradingEvent::new(GradingEventKind::Cancelled, response_id, progress_id))
            .await;
        Ok(())
    }

    /// Clears AI comments, forces the row back to `Pending` from any state and
    /// spawns a fresh worker. If the reset fails the row is marked `Failed`
    /// and the error is returned.
    pub(crate) async fn regrade_grading(
        &self,
        response_id: &str,
        progress_id: &str,
    ) -> Result<(), GradingError> {
        let context = self.load_context(response_id, progress_id).await?;

        if context.question.question_type.is_auto_markable() {
            return Err(GradingError::Validation(
                "auto-markable questions are scored when the answer is recorded".to_string(),
            ));
        }

        if let Err(err) = self.reset_for_regrade(progress_id).await {
            self.mark_failed(response_id, progress_id, &err).await;
            return Err(err);
        }

        tracing::info!(
            response_id,
            progress_id,
            previous_status = context.progress.status.as_str(),
            "Regrade queued"
        );
        metrics::counter!("grading_regrades_total").increment(1);

        self.spawn_worker(response_id, progress_id);
        Ok(())
    }

    async fn reset_for_regrade(&self, progress_id: &str) -> Result<(), GradingError> {
        self.store.delete_ai_comments(progress_id).await?;

        if !self.store.set_status(progress_id, GradingStatus::Pending).await? {
            return Err(GradingError::not_found("progress", progress_id));
        }
        Ok(())
    }
}
