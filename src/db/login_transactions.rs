use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::LoginTransaction;

/// Append one login event in its own transaction and return its id.
///
/// The transaction is rolled back when dropped, so any failure before the
/// commit leaves nothing behind.
pub async fn record_login(
    pool: &SqlitePool,
    user_id: i64,
    login_ip: &str,
    at: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row: (i64,) = sqlx::query_as(
        "INSERT INTO login_transactions (user_id, login_ip, login_time, logout_time)
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(user_id)
    .bind(login_ip)
    .bind(at)
    .bind(at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row.0)
}

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<LoginTransaction>, sqlx::Error> {
    sqlx::query_as::<_, LoginTransaction>(
        "SELECT * FROM login_transactions WHERE user_id = $1 ORDER BY login_time DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn count_all(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM login_transactions")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}
