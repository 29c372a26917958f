use axum::extract::State;
use axum::Json;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::{Role, TimeZone};
use crate::state::SharedState;

pub async fn roles(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Role>>, AppError> {
    Ok(Json(db::roles::list_active(&state.pool).await?))
}

pub async fn time_zones(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<TimeZone>>, AppError> {
    Ok(Json(db::time_zones::list_active(&state.pool).await?))
}
