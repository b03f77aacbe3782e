use sqlx::{PgConnection, PgPool};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::{CommentAuthor, CommentRow};
use crate::db::types::CommentAuthorKind;

const COLUMNS: &str = "id, progress_id, content, author_kind, author_id, created_at";

pub(crate) async fn list_by_progress(
    pool: &PgPool,
    progress_id: &str,
) -> Result<Vec<CommentRow>, sqlx::Error> {
    sqlx::query_as::<_, CommentRow>(&format!(
        "SELECT {COLUMNS} FROM progress_comments WHERE progress_id = $1 ORDER BY seq"
    ))
    .bind(progress_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_progress_ids(
    pool: &PgPool,
    progress_ids: &[String],
) -> Result<Vec<CommentRow>, sqlx::Error> {
    if progress_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, CommentRow>(&format!(
        "SELECT {COLUMNS} FROM progress_comments WHERE progress_id = ANY($1) ORDER BY seq"
    ))
    .bind(progress_ids)
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete_ai(
    conn: &mut PgConnection,
    progress_id: &str,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM progress_comments WHERE progress_id = $1 AND author_kind = $2")
            .bind(progress_id)
            .bind(CommentAuthorKind::Ai)
            .execute(conn)
            .await?;

    Ok(result.rows_affected())
}

pub(crate) async fn insert_many(
    conn: &mut PgConnection,
    progress_id: &str,
    contents: &[String],
    author: &CommentAuthor,
    now: PrimitiveDateTime,
) -> Result<Vec<CommentRow>, sqlx::Error> {
    let mut rows = Vec::with_capacity(contents.len());

    for content in contents {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "INSERT INTO progress_comments (id, progress_id, content, author_kind, author_id, created_at)
             VALUES ($1,$2,$3,$4,$5,$6)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(progress_id)
        .bind(content)
        .bind(author.kind())
        .bind(author.user_id())
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
        rows.push(row);
    }

    Ok(rows)
}
