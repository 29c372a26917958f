use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub entered_by: Option<i64>,
    pub date_entered_utc: DateTime<Utc>,
    pub last_updated_by: Option<i64>,
    pub last_updated_utc: DateTime<Utc>,
    pub inactive_flag: bool,
}
