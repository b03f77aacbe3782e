use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::StudentWorksheetResponse;

pub(crate) const COLUMNS: &str = "\
    id, worksheet_id, submission_id, student_id, is_submitted, submitted_at, created_at, updated_at";

pub(crate) struct CreateResponse<'a> {
    pub(crate) worksheet_id: &'a str,
    pub(crate) submission_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<StudentWorksheetResponse>, sqlx::Error> {
    sqlx::query_as::<_, StudentWorksheetResponse>(&format!(
        "SELECT {COLUMNS} FROM student_worksheet_responses WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// One response per (worksheet, submission); a repeat call returns the
/// existing row untouched.
pub(crate) async fn find_or_create(
    pool: &PgPool,
    params: CreateResponse<'_>,
) -> Result<StudentWorksheetResponse, sqlx::Error> {
    sqlx::query_as::<_, StudentWorksheetResponse>(&format!(
        "INSERT INTO student_worksheet_responses (
            id, worksheet_id, submission_id, student_id, is_submitted, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,FALSE,$5,$5)
         ON CONFLICT (worksheet_id, submission_id) DO UPDATE
             SET updated_at = student_worksheet_responses.updated_at
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(params.worksheet_id)
    .bind(params.submission_id)
    .bind(params.student_id)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn mark_submitted(
    pool: &PgPool,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE student_worksheet_responses
         SET is_submitted = TRUE,
             submitted_at = COALESCE(submitted_at, $1),
             updated_at = $1
         WHERE id = $2",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
