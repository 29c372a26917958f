use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::authenticator;
use crate::auth::context::RequestContext;
use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::auth::reset::{self, ResetError, RESET_TOKEN_MAX_AGE_SECS};
use crate::auth::session;
use crate::db;
use crate::error::AppError;
use crate::routes::JsonBody;
use crate::models::{NewUser, User};
use crate::state::SharedState;
use crate::validation::{self, FormFields, ValidationErrors};

/// Role and time zone given to the bootstrap administrator.
const ADMIN_ROLE_ID: i64 = 1;
const DEFAULT_TIME_ZONE_ID: i64 = 1;

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl FormFields for RegisterRequest {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "email" => Some(&self.email),
            "password" => Some(&self.password),
            "first_name" => Some(&self.first_name),
            "last_name" => Some(&self.last_name),
            _ => None,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl FormFields for LoginRequest {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "email" => Some(&self.email),
            "password" => Some(&self.password),
            _ => None,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

impl FormFields for ForgotPasswordRequest {
    fn field(&self, name: &str) -> Option<&str> {
        (name == "email").then_some(self.email.as_str())
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub confirm_password: String,
}

impl FormFields for ResetPasswordRequest {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "password" => Some(&self.password),
            "confirm_password" => Some(&self.confirm_password),
            _ => None,
        }
    }
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub user_id: i64,
    pub name: String,
    pub role: String,
    pub transaction_id: Option<i64>,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: i64,
    pub name: String,
    pub role: String,
    pub transaction_id: Option<i64>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Create the first administrator. Closed as soon as any user exists.
pub async fn register(
    State(state): State<SharedState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    validation::validate(&req, validation::REGISTER)?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;
    let now = state.clock.now();

    let mut tx = state.pool.begin().await?;

    let count = db::users::count_all(&mut *tx).await?;
    if count > 0 {
        return Err(AppError::Forbidden(
            "Registration is closed. Ask an administrator to add your account.".to_string(),
        ));
    }

    let new = NewUser {
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        password_hash: Some(pw_hash),
        role_id: ADMIN_ROLE_ID,
        time_zone_id: DEFAULT_TIME_ZONE_ID,
    };
    let user = db::users::create(&mut *tx, &new, None, now).await?;

    tx.commit().await?;

    tracing::info!(user_id = user.id, "Bootstrap administrator registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<SharedState>,
    ctx: RequestContext,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    validation::validate(&req, validation::LOGIN)?;

    let session = authenticator::authenticate(&state.pool, &state.keys, &ctx, &req.email, &req.password)
        .await
        .inspect_err(|e| tracing::debug!(ip = %ctx.source_ip, "Login refused: {e}"))?;

    let cookie = session::session_cookie(session.token.clone(), state.config.secure_cookies());
    let jar = CookieJar::new().add(cookie);

    Ok((jar, Json(SessionResponse {
        user_id: session.user_id,
        name: session.display_name,
        role: session.role,
        transaction_id: session.transaction_id,
        token: session.token,
        expires_at: session.expires_at,
    })))
}

pub async fn logout() -> (CookieJar, Json<MessageResponse>) {
    (
        CookieJar::new().add(session::removal_cookie()),
        MessageResponse::new("Logged out successfully"),
    )
}

pub async fn me(auth: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: auth.user_id,
        name: auth.name,
        role: auth.role,
        transaction_id: auth.transaction_id,
    })
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    JsonBody(req): JsonBody<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validation::validate(&req, validation::REQUEST_RESET)?;

    let user = db::users::find_by_email(&state.pool, &req.email)
        .await?
        .ok_or_else(|| {
            AppError::Validation(ValidationErrors::single(
                "email",
                "Email account does not exist, please contact your administrator",
            ))
        })?;

    let token = reset::issue_token(
        user.id,
        user.password_hash.as_deref(),
        &state.keys.reset,
        state.clock.now(),
    )
    .map_err(AppError::Internal)?;
    let reset_url = format!(
        "{}/reset-password/{token}",
        state.config.base_url.trim_end_matches('/')
    );

    match state.system_mailer.clone() {
        Some(mailer) => {
            tokio::spawn(async move {
                if let Err(e) = mailer.send_password_reset(&user, &reset_url).await {
                    tracing::error!("Failed to send password reset email: {e}");
                }
            });
            Ok(MessageResponse::new("A password reset link has been sent to your email."))
        }
        None => {
            tracing::warn!(
                "System SMTP not configured. Password reset link for user {}: {reset_url}",
                user.id
            );
            Ok(MessageResponse::new(
                "Email functionality is not set up. No email has been sent.",
            ))
        }
    }
}

pub async fn check_reset_token(
    State(state): State<SharedState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    reset::verify_token(
        &state.pool,
        &state.keys.reset,
        &token,
        RESET_TOKEN_MAX_AGE_SECS,
        state.clock.now(),
    )
    .await?
    .ok_or(ResetError::InvalidOrExpiredToken)?;

    Ok(MessageResponse::new("Token is valid"))
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Path(token): Path<String>,
    body: Result<JsonBody<ResetPasswordRequest>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    let now = state.clock.now();

    // A dead token is reported before any complaint about the form.
    reset::verify_token(&state.pool, &state.keys.reset, &token, RESET_TOKEN_MAX_AGE_SECS, now)
        .await?
        .ok_or(ResetError::InvalidOrExpiredToken)?;

    let JsonBody(req) = body?;
    validation::validate(&req, validation::RESET_PASSWORD)?;

    reset::reset_password(&state.pool, &state.keys, &token, &req.password, now).await?;

    Ok(MessageResponse::new(
        "Your password has been updated! You are now able to log in",
    ))
}
