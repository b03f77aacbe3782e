use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use time::PrimitiveDateTime;

use crate::db::models::{
    Comment, CommentAuthor, ProgressSnapshot, StudentQuestionProgress, StudentWorksheetResponse,
    Worksheet, WorksheetQuestion,
};
use crate::db::types::GradingStatus;
use crate::services::objective_grading::ObjectiveGrade;

/// A response, its worksheet, and the progress rows a bulk dispatch may claim.
#[derive(Debug, Clone)]
pub(crate) struct EligibleProgress {
    pub(crate) response: StudentWorksheetResponse,
    pub(crate) worksheet: Worksheet,
    pub(crate) rows: Vec<StudentQuestionProgress>,
}

/// Everything a worker needs to build its prompt.
#[derive(Debug, Clone)]
pub(crate) struct GradingContext {
    pub(crate) progress: StudentQuestionProgress,
    pub(crate) question: WorksheetQuestion,
    pub(crate) comments: Vec<Comment>,
}

/// A validated grading result, markscheme keys already namespaced.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradingResult {
    pub(crate) is_correct: bool,
    pub(crate) points: f64,
    pub(crate) markscheme_state: BTreeMap<String, bool>,
    pub(crate) comments: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct RecordAnswer {
    pub(crate) response_id: String,
    pub(crate) question_id: String,
    pub(crate) student_id: String,
    pub(crate) raw_answer: String,
    pub(crate) objective: Option<ObjectiveGrade>,
    pub(crate) now: PrimitiveDateTime,
}

#[derive(Debug, Clone)]
pub(crate) struct OpenResponse {
    pub(crate) worksheet_id: String,
    pub(crate) submission_id: String,
    pub(crate) student_id: String,
    pub(crate) now: PrimitiveDateTime,
}

/// Persistence seam for the grading pipeline.
///
/// `cas_update_status` and `write_grading_result` are the only mutual
/// exclusion in the system: each must apply its status check and its write
/// atomically and report whether a row was affected.
#[async_trait]
pub(crate) trait GradingStore: Send + Sync {
    async fn find_worksheet(&self, worksheet_id: &str) -> Result<Option<Worksheet>>;

    async fn find_response(&self, response_id: &str) -> Result<Option<StudentWorksheetResponse>>;

    /// Returns the existing response for (worksheet, submission) or creates it.
    async fn open_response(&self, params: OpenResponse) -> Result<StudentWorksheetResponse>;

    async fn mark_submitted(&self, response_id: &str, now: PrimitiveDateTime) -> Result<bool>;

    async fn find_question(
        &self,
        worksheet_id: &str,
        question_id: &str,
    ) -> Result<Option<WorksheetQuestion>>;

    /// Rows in a dispatchable status whose question is not auto-markable.
    async fn find_response_with_eligible_progress(
        &self,
        response_id: &str,
    ) -> Result<Option<EligibleProgress>>;

    async fn find_grading_context(
        &self,
        response_id: &str,
        progress_id: &str,
    ) -> Result<Option<GradingContext>>;

    /// Upserts the single row for (response, question). Never touches status.
    async fn record_answer(&self, params: RecordAnswer) -> Result<ProgressSnapshot>;

    async fn list_progress(&self, response_id: &str) -> Result<Vec<ProgressSnapshot>>;

    /// Sets `new_status` only if the current status is in `allowed_from`.
    async fn cas_update_status(
        &self,
        progress_id: &str,
        new_status: GradingStatus,
        allowed_from: &[GradingStatus],
    ) -> Result<bool>;

    /// Unconditional status write. `false` means the row does not exist.
    async fn set_status(&self, progress_id: &str, status: GradingStatus) -> Result<bool>;

    /// Marks the row completed with `result` and appends its comments as AI
    /// comments, unless the current status is in `guard_status_not_in`.
    async fn write_grading_result(
        &self,
        progress_id: &str,
        result: &GradingResult,
        guard_status_not_in: &[GradingStatus],
    ) -> Result<bool>;

    async fn delete_ai_comments(&self, progress_id: &str) -> Result<u64>;

    async fn append_comments(
        &self,
        progress_id: &str,
        contents: &[String],
        author: &CommentAuthor,
    ) -> Result<Vec<Comment>>;
}
