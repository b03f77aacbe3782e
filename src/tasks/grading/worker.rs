use std::time::Instant;

use crate::db::types::GradingStatus;

use super::outcome::GradingOutcome;
use super::{prompt, GradingError, GradingEvent, GradingEventKind, GradingPipeline};

enum Attempt {
    Completed,
    /// The row was cancelled while inference was outstanding.
    Superseded,
}

/// Grades one progress row that is already `Pending`. Never returns an error:
/// every failure ends in the `Failed` transition.
pub(super) async fn run(pipeline: GradingPipeline, response_id: String, progress_id: String) {
    let timer = Instant::now();

    pipeline
        .events
        .publish(GradingEvent::new(GradingEventKind::Started, &response_id, &progress_id))
        .await;

    match attempt(&pipeline, &response_id, &progress_id).await {
        Ok(Attempt::Completed) => {
            let elapsed = timer.elapsed().as_secs_f64();
            tracing::info!(
                response_id = %response_id,
                progress_id = %progress_id,
                duration_seconds = elapsed,
                "Grading completed"
            );
            metrics::counter!("grading_jobs_total", "status" => "completed").increment(1);
            metrics::histogram!("grading_duration_seconds").record(elapsed);

            pipeline
                .events
                .publish(GradingEvent::new(GradingEventKind::Completed, &response_id, &progress_id))
                .await;
        }
        Ok(Attempt::Superseded) => {
            tracing::debug!(
                response_id = %response_id,
                progress_id = %progress_id,
                "Progress cancelled during grading; result dropped"
            );
            metrics::counter!("grading_guard_miss_total", "stage" => "completion").increment(1);
            metrics::counter!("grading_jobs_total", "status" => "superseded").increment(1);
        }
        Err(err) => pipeline.mark_failed(&response_id, &progress_id, &err).await,
    }
}

async fn attempt(
    pipeline: &GradingPipeline,
    response_id: &str,
    progress_id: &str,
) -> Result<Attempt, GradingError> {
    let context = pipeline.load_context(response_id, progress_id).await?;

    if context.question.question_type.is_auto_markable() {
        return Err(GradingError::Validation(format!(
            "question {} is auto-markable",
            context.question.id
        )));
    }

    let request = prompt::build_request(&context);
    let value = pipeline.inference.complete(&request).await?;
    let result = GradingOutcome::from_value(value, context.question.points)?.into_result()?;

    let landed = pipeline
        .store
        .write_grading_result(progress_id, &result, &[GradingStatus::Cancelled])
        .await?;

    Ok(if landed { Attempt::Completed } else { Attempt::Superseded })
}
