use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::db;
use crate::error::AppError;
use crate::routes::JsonBody;
use crate::models::{NewUser, User};
use crate::state::SharedState;
use crate::validation::{self, FormFields};

const DEFAULT_ROLE_ID: i64 = 1;
const DEFAULT_TIME_ZONE_ID: i64 = 1;

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct AddUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Left out to create an account whose owner sets a password via reset.
    pub password: Option<String>,
    pub role_id: Option<i64>,
    pub time_zone_id: Option<i64>,
}

impl FormFields for AddUserRequest {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "first_name" => Some(&self.first_name),
            "last_name" => Some(&self.last_name),
            "email" => Some(&self.email),
            "password" => self.password.as_deref(),
            _ => None,
        }
    }
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = db::users::list_all(&state.pool).await?;
    Ok(Json(users))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    JsonBody(req): JsonBody<AddUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    validation::validate(&req, validation::ADD_USER)?;

    let password_hash = match req.password.as_deref().filter(|p| !p.is_empty()) {
        Some(p) => Some(password::hash(p).map_err(AppError::Internal)?),
        None => None,
    };

    let new = NewUser {
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        password_hash,
        role_id: req.role_id.unwrap_or(DEFAULT_ROLE_ID),
        time_zone_id: req.time_zone_id.unwrap_or(DEFAULT_TIME_ZONE_ID),
    };

    let user = add_user(&state.pool, auth.user_id, &new, state.clock.now()).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Insert a user on behalf of `actor_user_id`, who is stamped as both
/// creator and last updater.
pub async fn add_user(
    pool: &SqlitePool,
    actor_user_id: i64,
    new: &NewUser,
    now: DateTime<Utc>,
) -> Result<User, AppError> {
    let mut tx = pool.begin().await?;

    let user = db::users::create(&mut *tx, new, Some(actor_user_id), now)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Email already exists. Please try another.".to_string())
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::BadRequest("Unknown role or time zone".to_string())
            }
            _ => AppError::Database(e),
        })?;

    tx.commit().await?;

    tracing::info!(user_id = user.id, actor = actor_user_id, "User added");
    Ok(user)
}
