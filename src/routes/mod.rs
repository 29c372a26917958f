pub mod auth;
pub mod lookups;
pub mod users;

use axum::extract::FromRequest;
use axum::routing::{get, post};
use axum::Router;

use crate::error::AppError;
use crate::state::SharedState;

/// `Json` whose rejections are reported as field validation failures.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route(
            "/api/v1/auth/reset-password/{token}",
            get(auth::check_reset_token).post(auth::reset_password),
        )
        // Users
        .route("/api/v1/users", get(users::list).post(users::create))
        // Lookups
        .route("/api/v1/roles", get(lookups::roles))
        .route("/api/v1/time-zones", get(lookups::time_zones))
}
