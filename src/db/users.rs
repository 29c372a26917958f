use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::{NewUser, User};

/// Insert a user. `actor` is the authenticated user performing the insert;
/// only the bootstrap registration passes `None`.
pub async fn create<'e, E: sqlx::SqliteExecutor<'e>>(
    executor: E,
    new: &NewUser,
    actor: Option<i64>,
    now: DateTime<Utc>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (email, first_name, last_name, password_hash, role_id, time_zone_id,
                            entered_by, date_entered_utc, last_updated_by, last_updated_utc)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
    )
    .bind(&new.email)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.password_hash)
    .bind(new.role_id)
    .bind(new.time_zone_id)
    .bind(actor)
    .bind(now)
    .bind(actor)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub async fn find_by_email<'e, E: sqlx::SqliteExecutor<'e>>(
    executor: E,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_id<'e, E: sqlx::SqliteExecutor<'e>>(
    executor: E,
    id: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn count_all<'e, E: sqlx::SqliteExecutor<'e>>(executor: E) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(executor)
        .await?;
    Ok(row.0)
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY date_entered_utc DESC, id DESC")
        .fetch_all(pool)
        .await
}

pub async fn update_password<'e, E: sqlx::SqliteExecutor<'e>>(
    executor: E,
    id: i64,
    password_hash: &str,
    actor: i64,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET password_hash = $2, last_updated_by = $3, last_updated_utc = $4
         WHERE id = $1",
    )
    .bind(id)
    .bind(password_hash)
    .bind(actor)
    .bind(now)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}
