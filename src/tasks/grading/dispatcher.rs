use crate::db::types::GradingStatus;

use super::{GradingError, GradingPipeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DispatchSummary {
    /// Rows that looked eligible when the response was loaded.
    pub(crate) candidates: usize,
    /// Rows this call claimed and spawned a worker for.
    pub(crate) spawned: usize,
}

impl GradingPipeline {
    /// Claims every eligible free-response row of `response_id` and spawns a
    /// worker per claimed row. Returns without waiting for any worker.
    pub(crate) async fn dispatch_grading(
        &self,
        response_id: &str,
    ) -> Result<DispatchSummary, GradingError> {
        let eligible = self
            .store
            .find_response_with_eligible_progress(response_id)
            .await?
            .ok_or_else(|| GradingError::not_found("response", response_id))?;

        let mut summary = DispatchSummary { candidates: eligible.rows.len(), spawned: 0 };

        for row in &eligible.rows {
            let claimed = self
                .store
                .cas_update_status(&row.id, GradingStatus::Pending, &GradingStatus::DISPATCHABLE)
                .await?;

            if !claimed {
                // Another dispatch, a regrade or a cancel got there first.
                tracing::debug!(response_id, progress_id = %row.id, "Progress not claimable; skipping");
                metrics::counter!("grading_guard_miss_total", "stage" => "dispatch").increment(1);
                continue;
            }

            self.spawn_worker(response_id, &row.id);
            summary.spawned += 1;
        }

        tracing::info!(
            response_id,
            worksheet_id = %eligible.worksheet.id,
            student_id = %eligible.response.student_id,
            candidates = summary.candidates,
            spawned = summary.spawned,
            "Grading dispatched"
        );

        Ok(summary)
    }
}
