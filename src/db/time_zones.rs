use sqlx::SqlitePool;

use crate::models::TimeZone;

pub async fn list_active(pool: &SqlitePool) -> Result<Vec<TimeZone>, sqlx::Error> {
    sqlx::query_as::<_, TimeZone>("SELECT * FROM time_zones WHERE inactive_flag = 0 ORDER BY id")
        .fetch_all(pool)
        .await
}
