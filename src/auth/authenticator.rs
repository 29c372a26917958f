use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::auth::context::RequestContext;
use crate::auth::password::{self, Verification};
use crate::auth::session::{self, SessionClaims};
use crate::crypto::SigningKeys;
use crate::db;
use crate::middleware::audit;

#[derive(Debug)]
pub enum AuthError {
    /// Unknown email or wrong password; callers must not say which.
    InvalidCredentials,
    /// The account exists but has no usable password hash.
    PasswordNotSet,
    Storage(sqlx::Error),
    Internal(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::PasswordNotSet => write!(f, "Password not set"),
            AuthError::Storage(err) => write!(f, "Storage error: {err}"),
            AuthError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Storage(err)
    }
}

/// A freshly established session and the token that carries it.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub user_id: i64,
    pub display_name: String,
    pub role: String,
    pub transaction_id: Option<i64>,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Check an email/password pair and open a session for it.
///
/// A successful login always appends a login transaction, but failing to
/// record one never fails the login.
pub async fn authenticate(
    pool: &SqlitePool,
    keys: &SigningKeys,
    ctx: &RequestContext,
    email: &str,
    password: &str,
) -> Result<AuthenticatedSession, AuthError> {
    let Some(user) = db::users::find_by_email(pool, email).await? else {
        password::verify_dummy(password);
        return Err(AuthError::InvalidCredentials);
    };

    match password::verify(password, user.password_hash.as_deref()) {
        Verification::Match => {}
        Verification::Mismatch => return Err(AuthError::InvalidCredentials),
        Verification::NotSet => return Err(AuthError::PasswordNotSet),
    }

    let role = db::roles::find_by_id(pool, user.role_id)
        .await?
        .ok_or_else(|| {
            AuthError::Internal(format!("User {} references missing role {}", user.id, user.role_id))
        })?;

    let transaction_id = audit::record_login(pool, user.id, &ctx.source_ip, ctx.now).await;

    let claims = SessionClaims::new(user.id, user.display_name(), role.name, transaction_id, ctx.now);
    let token = session::encode_token(&claims, &keys.session).map_err(AuthError::Internal)?;
    let expires_at = claims
        .expires_at()
        .ok_or_else(|| AuthError::Internal("Session expiry out of range".to_string()))?;

    tracing::info!(user_id = user.id, ip = %ctx.source_ip, "User logged in");

    Ok(AuthenticatedSession {
        user_id: user.id,
        display_name: claims.name,
        role: claims.role,
        transaction_id,
        token,
        expires_at,
    })
}
