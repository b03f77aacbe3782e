use sqlx::PgPool;

use crate::db::models::Worksheet;

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Worksheet>, sqlx::Error> {
    sqlx::query_as::<_, Worksheet>("SELECT id, title, created_at FROM worksheets WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}
