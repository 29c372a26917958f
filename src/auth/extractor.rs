use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use crate::auth::session::{self, SessionClaims, SESSION_COOKIE};
use crate::error::AppError;
use crate::state::SharedState;

/// The user behind a valid session, taken from the session cookie or a
/// `Bearer` token carrying the same signed session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub name: String,
    pub role: String,
    pub transaction_id: Option<i64>,
}

impl From<SessionClaims> for AuthUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            role: claims.role,
            transaction_id: claims.tid,
        }
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let now = state.clock.now();

        // Try Bearer token from Authorization header first
        if let Some(auth_header) = parts.headers.get("authorization") {
            let auth_str = auth_header
                .to_str()
                .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                let claims = session::decode_token(token, &state.keys.session, now)
                    .map_err(|_| AppError::Unauthorized("Invalid or expired session".to_string()))?;
                return Ok(claims.into());
            }
        }

        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            let claims = session::decode_token(cookie.value(), &state.keys.session, now)
                .map_err(|_| AppError::Unauthorized("Session timed out, please log in again".to_string()))?;
            return Ok(claims.into());
        }

        Err(AppError::Unauthorized("Please log in to access this page".to_string()))
    }
}
