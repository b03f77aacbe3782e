use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::core::time::primitive_now_utc;
use crate::db::models::{
    Comment, CommentAuthor, ProgressSnapshot, StudentWorksheetResponse, Worksheet,
    WorksheetQuestion,
};
use crate::db::types::GradingStatus;
use crate::repositories::{comments, progress, questions, responses, worksheets};
use crate::tasks::grading::{
    EligibleProgress, GradingContext, GradingResult, GradingStore, OpenResponse, RecordAnswer,
};

/// Postgres-backed [`GradingStore`]. Status guards are single conditional
/// `UPDATE` statements so the check and the write cannot interleave.
#[derive(Clone)]
pub(crate) struct PgGradingStore {
    pool: PgPool,
}

impl PgGradingStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GradingStore for PgGradingStore {
    async fn find_worksheet(&self, worksheet_id: &str) -> Result<Option<Worksheet>> {
        worksheets::find_by_id(&self.pool, worksheet_id).await.context("Failed to fetch worksheet")
    }

    async fn find_response(&self, response_id: &str) -> Result<Option<StudentWorksheetResponse>> {
        responses::find_by_id(&self.pool, response_id).await.context("Failed to fetch response")
    }

    async fn open_response(&self, params: OpenResponse) -> Result<StudentWorksheetResponse> {
        responses::find_or_create(
            &self.pool,
            responses::CreateResponse {
                worksheet_id: &params.worksheet_id,
                submission_id: &params.submission_id,
                student_id: &params.student_id,
                now: params.now,
            },
        )
        .await
        .context("Failed to open response")
    }

    async fn mark_submitted(&self, response_id: &str, now: PrimitiveDateTime) -> Result<bool> {
        responses::mark_submitted(&self.pool, response_id, now)
            .await
            .context("Failed to mark response submitted")
    }

    async fn find_question(
        &self,
        worksheet_id: &str,
        question_id: &str,
    ) -> Result<Option<WorksheetQuestion>> {
        questions::find_in_worksheet(&self.pool, worksheet_id, question_id)
            .await
            .context("Failed to fetch question")
    }

    async fn find_response_with_eligible_progress(
        &self,
        response_id: &str,
    ) -> Result<Option<EligibleProgress>> {
        let Some(response) = self.find_response(response_id).await? else {
            return Ok(None);
        };

        let worksheet = worksheets::find_by_id(&self.pool, &response.worksheet_id)
            .await
            .context("Failed to fetch worksheet")?
            .with_context(|| format!("worksheet {} missing for response", response.worksheet_id))?;

        let rows = progress::list_dispatchable(&self.pool, response_id)
            .await
            .context("Failed to fetch dispatchable progress")?;

        Ok(Some(EligibleProgress { response, worksheet, rows }))
    }

    async fn find_grading_context(
        &self,
        response_id: &str,
        progress_id: &str,
    ) -> Result<Option<GradingContext>> {
        let Some(progress) = progress::find_in_response(&self.pool, response_id, progress_id)
            .await
            .context("Failed to fetch progress")?
        else {
            return Ok(None);
        };

        let question = questions::fetch_one_by_id(&self.pool, &progress.question_id)
            .await
            .context("Failed to fetch question for progress")?;

        let comments = comments::list_by_progress(&self.pool, progress_id)
            .await
            .context("Failed to fetch progress comments")?
            .into_iter()
            .map(Comment::from)
            .collect();

        Ok(Some(GradingContext { progress, question, comments }))
    }

    async fn record_answer(&self, params: RecordAnswer) -> Result<ProgressSnapshot> {
        let progress = progress::upsert_answer(
            &self.pool,
            progress::UpsertAnswer {
                response_id: &params.response_id,
                question_id: &params.question_id,
                student_id: &params.student_id,
                student_answer: &params.raw_answer,
                is_correct: params.objective.map(|grade| grade.is_correct),
                points: params.objective.map(|grade| grade.points),
                now: params.now,
            },
        )
        .await
        .context("Failed to record answer")?;

        let comments = comments::list_by_progress(&self.pool, &progress.id)
            .await
            .context("Failed to fetch progress comments")?
            .into_iter()
            .map(Comment::from)
            .collect();

        Ok(ProgressSnapshot { progress, comments })
    }

    async fn list_progress(&self, response_id: &str) -> Result<Vec<ProgressSnapshot>> {
        let rows = progress::list_by_response(&self.pool, response_id)
            .await
            .context("Failed to list progress")?;

        let ids = rows.iter().map(|row| row.id.clone()).collect::<Vec<_>>();
        let mut by_progress: HashMap<String, Vec<Comment>> = HashMap::new();
        for row in comments::list_by_progress_ids(&self.pool, &ids)
            .await
            .context("Failed to fetch progress comments")?
        {
            by_progress.entry(row.progress_id.clone()).or_default().push(Comment::from(row));
        }

        Ok(rows
            .into_iter()
            .map(|progress| {
                let comments = by_progress.remove(&progress.id).unwrap_or_default();
                ProgressSnapshot { progress, comments }
            })
            .collect())
    }

    async fn cas_update_status(
        &self,
        progress_id: &str,
        new_status: GradingStatus,
        allowed_from: &[GradingStatus],
    ) -> Result<bool> {
        progress::cas_update_status(
            &self.pool,
            progress_id,
            new_status,
            allowed_from,
            primitive_now_utc(),
        )
        .await
        .context("Failed to claim progress")
    }

    async fn set_status(&self, progress_id: &str, status: GradingStatus) -> Result<bool> {
        progress::set_status(&self.pool, progress_id, status, primitive_now_utc())
            .await
            .with_context(|| format!("Failed to set progress status to {}", status.as_str()))
    }

    async fn write_grading_result(
        &self,
        progress_id: &str,
        result: &GradingResult,
        guard_status_not_in: &[GradingStatus],
    ) -> Result<bool> {
        let now = primitive_now_utc();
        let mut tx = self.pool.begin().await.context("Failed to open transaction")?;

        let landed = progress::complete_unless(
            &mut tx,
            progress_id,
            progress::CompletedGrade {
                is_correct: result.is_correct,
                points: result.points,
                markscheme_state: &result.markscheme_state,
                now,
            },
            guard_status_not_in,
        )
        .await
        .context("Failed to write grading result")?;

        if !landed {
            tx.rollback().await.context("Failed to roll back grading result")?;
            return Ok(false);
        }

        // A regrade can leave an older attempt in flight; the last write owns the AI comments.
        comments::delete_ai(&mut tx, progress_id)
            .await
            .context("Failed to clear previous grader comments")?;
        comments::insert_many(&mut tx, progress_id, &result.comments, &CommentAuthor::Ai, now)
            .await
            .context("Failed to insert grader comments")?;

        tx.commit().await.context("Failed to commit grading result")?;
        Ok(true)
    }

    async fn delete_ai_comments(&self, progress_id: &str) -> Result<u64> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        comments::delete_ai(&mut conn, progress_id).await.context("Failed to delete AI comments")
    }

    async fn append_comments(
        &self,
        progress_id: &str,
        contents: &[String],
        author: &CommentAuthor,
    ) -> Result<Vec<Comment>> {
        let mut tx = self.pool.begin().await.context("Failed to open transaction")?;
        let rows = comments::insert_many(&mut tx, progress_id, contents, author, primitive_now_utc())
            .await
            .context("Failed to insert comments")?;
        tx.commit().await.context("Failed to commit comments")?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }
}
