use sqlx::PgPool;

use crate::db::models::WorksheetQuestion;

pub(crate) const COLUMNS: &str = "\
    id, worksheet_id, question_type, question, answer, points, options, mark_scheme, order_index";

pub(crate) async fn find_in_worksheet(
    pool: &PgPool,
    worksheet_id: &str,
    question_id: &str,
) -> Result<Option<WorksheetQuestion>, sqlx::Error> {
    sqlx::query_as::<_, WorksheetQuestion>(&format!(
        "SELECT {COLUMNS} FROM worksheet_questions WHERE worksheet_id = $1 AND id = $2"
    ))
    .bind(worksheet_id)
    .bind(question_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn fetch_one_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<WorksheetQuestion, sqlx::Error> {
    sqlx::query_as::<_, WorksheetQuestion>(&format!(
        "SELECT {COLUMNS} FROM worksheet_questions WHERE id = $1"
    ))
    .bind(id)
    .fetch_one(pool)
    .await
}
