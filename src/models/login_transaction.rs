use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct LoginTransaction {
    pub id: i64,
    pub user_id: i64,
    pub login_ip: String,
    pub login_time: DateTime<Utc>,
    /// Written once with the login time; nothing updates it on logout.
    pub logout_time: DateTime<Utc>,
}
