use crate::core::time::primitive_now_utc;
use crate::db::models::{Comment, CommentAuthor, ProgressSnapshot, StudentWorksheetResponse};
use crate::services::objective_grading;

use super::{DispatchSummary, GradingError, GradingPipeline, OpenResponse, RecordAnswer};

impl GradingPipeline {
    /// Stores a student's answer, scoring closed-form questions inline.
    pub(crate) async fn record_answer(
        &self,
        response_id: &str,
        question_id: &str,
        raw_answer: &str,
    ) -> Result<ProgressSnapshot, GradingError> {
        let response = self
            .store
            .find_response(response_id)
            .await?
            .ok_or_else(|| GradingError::not_found("response", response_id))?;

        let question = self
            .store
            .find_question(&response.worksheet_id, question_id)
            .await?
            .ok_or_else(|| GradingError::not_found("question", question_id))?;

        let objective = objective_grading::grade(&question, raw_answer);

        let snapshot = self
            .store
            .record_answer(RecordAnswer {
                response_id: response.id.clone(),
                question_id: question.id.clone(),
                student_id: response.student_id.clone(),
                raw_answer: raw_answer.to_string(),
                objective,
                now: primitive_now_utc(),
            })
            .await?;

        tracing::debug!(
            response_id,
            question_id,
            progress_id = %snapshot.progress.id,
            auto_marked = objective.is_some(),
            "Answer recorded"
        );

        Ok(snapshot)
    }

    pub(crate) async fn open_response(
        &self,
        worksheet_id: &str,
        submission_id: &str,
        student_id: &str,
    ) -> Result<StudentWorksheetResponse, GradingError> {
        self.store
            .find_worksheet(worksheet_id)
            .await?
            .ok_or_else(|| GradingError::not_found("worksheet", worksheet_id))?;

        let response = self
            .store
            .open_response(OpenResponse {
                worksheet_id: worksheet_id.to_string(),
                submission_id: submission_id.to_string(),
                student_id: student_id.to_string(),
                now: primitive_now_utc(),
            })
            .await?;

        Ok(response)
    }

    /// Marks the response submitted and dispatches grading for it.
    pub(crate) async fn submit_response(
        &self,
        response_id: &str,
    ) -> Result<DispatchSummary, GradingError> {
        if !self.store.mark_submitted(response_id, primitive_now_utc()).await? {
            return Err(GradingError::not_found("response", response_id));
        }

        self.dispatch_grading(response_id).await
    }

    pub(crate) async fn response_progress(
        &self,
        response_id: &str,
    ) -> Result<Vec<ProgressSnapshot>, GradingError> {
        self.store
            .find_response(response_id)
            .await?
            .ok_or_else(|| GradingError::not_found("response", response_id))?;

        Ok(self.store.list_progress(response_id).await?)
    }

    pub(crate) async fn add_comment(
        &self,
        response_id: &str,
        progress_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<Comment, GradingError> {
        self.load_context(response_id, progress_id).await?;

        let mut created = self
            .store
            .append_comments(
                progress_id,
                &[content.to_string()],
                &CommentAuthor::User(author_id.to_string()),
            )
            .await?;

        created.pop().ok_or_else(|| {
            GradingError::Store(anyhow::anyhow!("comment insert returned no rows"))
        })
    }
}
