use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub role_id: i64,
    pub time_zone_id: i64,
    pub entered_by: Option<i64>,
    pub date_entered_utc: DateTime<Utc>,
    pub last_updated_by: Option<i64>,
    pub last_updated_utc: DateTime<Utc>,
    pub inactive_flag: bool,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields for inserting a user; audit columns are filled by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: Option<String>,
    pub role_id: i64,
    pub time_zone_id: i64,
}
