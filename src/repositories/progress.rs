use std::collections::BTreeMap;

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::StudentQuestionProgress;
use crate::db::types::{GradingStatus, QuestionType};

pub(crate) const COLUMNS: &str = "\
    id, response_id, question_id, student_id, student_answer, status, is_correct, points, \
    markscheme_state, created_at, updated_at";

pub(crate) struct UpsertAnswer<'a> {
    pub(crate) response_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) student_answer: &'a str,
    pub(crate) is_correct: Option<bool>,
    pub(crate) points: Option<f64>,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) struct CompletedGrade<'a> {
    pub(crate) is_correct: bool,
    pub(crate) points: f64,
    pub(crate) markscheme_state: &'a BTreeMap<String, bool>,
    pub(crate) now: PrimitiveDateTime,
}

fn status_labels(statuses: &[GradingStatus]) -> Vec<&'static str> {
    statuses.iter().map(|status| status.as_str()).collect()
}

pub(crate) async fn find_in_response(
    pool: &PgPool,
    response_id: &str,
    progress_id: &str,
) -> Result<Option<StudentQuestionProgress>, sqlx::Error> {
    sqlx::query_as::<_, StudentQuestionProgress>(&format!(
        "SELECT {COLUMNS} FROM student_question_progress WHERE response_id = $1 AND id = $2"
    ))
    .bind(response_id)
    .bind(progress_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_response(
    pool: &PgPool,
    response_id: &str,
) -> Result<Vec<StudentQuestionProgress>, sqlx::Error> {
    sqlx::query_as::<_, StudentQuestionProgress>(
        "SELECT p.id, p.response_id, p.question_id, p.student_id, p.student_answer, p.status,
                p.is_correct, p.points, p.markscheme_state, p.created_at, p.updated_at
         FROM student_question_progress p
         JOIN worksheet_questions q ON q.id = p.question_id
         WHERE p.response_id = $1
         ORDER BY q.order_index, p.created_at",
    )
    .bind(response_id)
    .fetch_all(pool)
    .await
}

/// Rows a bulk dispatch may claim: dispatchable status and a question type
/// that needs the grader.
pub(crate) async fn list_dispatchable(
    pool: &PgPool,
    response_id: &str,
) -> Result<Vec<StudentQuestionProgress>, sqlx::Error> {
    sqlx::query_as::<_, StudentQuestionProgress>(
        "SELECT p.id, p.response_id, p.question_id, p.student_id, p.student_answer, p.status,
                p.is_correct, p.points, p.markscheme_state, p.created_at, p.updated_at
         FROM student_question_progress p
         JOIN worksheet_questions q ON q.id = p.question_id
         WHERE p.response_id = $1
           AND p.status::text = ANY($2)
           AND q.question_type NOT IN ($3, $4)
         ORDER BY q.order_index, p.created_at",
    )
    .bind(response_id)
    .bind(status_labels(&GradingStatus::DISPATCHABLE))
    .bind(QuestionType::MultipleChoice)
    .bind(QuestionType::TrueFalse)
    .fetch_all(pool)
    .await
}

/// Inserts or updates the single row for (response, question). Status is
/// left alone; objective fields only move when a new value is supplied.
pub(crate) async fn upsert_answer(
    pool: &PgPool,
    params: UpsertAnswer<'_>,
) -> Result<StudentQuestionProgress, sqlx::Error> {
    sqlx::query_as::<_, StudentQuestionProgress>(&format!(
        "INSERT INTO student_question_progress (
            id, response_id, question_id, student_id, student_answer, status,
            is_correct, points, markscheme_state, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,'{{}}'::jsonb,$9,$9)
         ON CONFLICT (response_id, question_id) DO UPDATE
             SET student_answer = EXCLUDED.student_answer,
                 is_correct = COALESCE(EXCLUDED.is_correct, student_question_progress.is_correct),
                 points = COALESCE(EXCLUDED.points, student_question_progress.points),
                 updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(params.response_id)
    .bind(params.question_id)
    .bind(params.student_id)
    .bind(params.student_answer)
    .bind(GradingStatus::Unset)
    .bind(params.is_correct)
    .bind(params.points)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn cas_update_status(
    pool: &PgPool,
    id: &str,
    new_status: GradingStatus,
    allowed_from: &[GradingStatus],
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE student_question_progress
         SET status = $1, updated_at = $2
         WHERE id = $3 AND status::text = ANY($4)",
    )
    .bind(new_status)
    .bind(now)
    .bind(id)
    .bind(status_labels(allowed_from))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn set_status(
    pool: &PgPool,
    id: &str,
    status: GradingStatus,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE student_question_progress SET status = $1, updated_at = $2 WHERE id = $3",
    )
    .bind(status)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Writes a completed grade unless the row is currently in one of
/// `guard_status_not_in`.
pub(crate) async fn complete_unless(
    conn: &mut PgConnection,
    id: &str,
    grade: CompletedGrade<'_>,
    guard_status_not_in: &[GradingStatus],
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE student_question_progress
         SET status = $1,
             is_correct = $2,
             points = $3,
             markscheme_state = $4,
             updated_at = $5
         WHERE id = $6 AND NOT (status::text = ANY($7))",
    )
    .bind(GradingStatus::Completed)
    .bind(grade.is_correct)
    .bind(grade.points)
    .bind(Json(grade.markscheme_state))
    .bind(grade.now)
    .bind(id)
    .bind(status_labels(guard_status_not_in))
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}
