use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Record a login transaction. Failures are logged and swallowed: a login
/// must not be refused because its audit row could not be written.
pub async fn record_login(
    pool: &SqlitePool,
    user_id: i64,
    login_ip: &str,
    at: DateTime<Utc>,
) -> Option<i64> {
    match crate::db::login_transactions::record_login(pool, user_id, login_ip, at).await {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::error!("Failed to record login transaction for user {user_id}: {e}");
            None
        }
    }
}
