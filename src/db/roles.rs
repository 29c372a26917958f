use sqlx::SqlitePool;

use crate::models::Role;

pub async fn find_by_id<'e, E: sqlx::SqliteExecutor<'e>>(
    executor: E,
    id: i64,
) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn list_active(pool: &SqlitePool) -> Result<Vec<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE inactive_flag = 0 ORDER BY id")
        .fetch_all(pool)
        .await
}
