use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "portal_session";

/// Sessions slide: every request carrying a valid one pushes expiry out by this much.
pub fn session_ttl() -> Duration {
    Duration::hours(24)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionClaims {
    pub sub: i64,
    pub name: String,
    pub role: String,
    /// Login transaction recorded when the session was created, if recording succeeded.
    pub tid: Option<i64>,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(
        user_id: i64,
        name: String,
        role: String,
        transaction_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: user_id,
            name,
            role,
            tid: transaction_id,
            iat: now.timestamp(),
            exp: (now + session_ttl()).timestamp(),
        }
    }

    /// Same identity, fresh expiry.
    pub fn renewed(&self, now: DateTime<Utc>) -> Self {
        Self {
            iat: now.timestamp(),
            exp: (now + session_ttl()).timestamp(),
            ..self.clone()
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

pub fn encode_token(claims: &SessionClaims, key: &[u8]) -> Result<String, String> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(key),
    )
    .map_err(|e| format!("Session encode failed: {e}"))
}

/// Decode and check a session token against `now` rather than the system clock.
pub fn decode_token(token: &str, key: &[u8], now: DateTime<Utc>) -> Result<SessionClaims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let claims = decode::<SessionClaims>(token, &DecodingKey::from_secret(key), &validation)
        .map(|data| data.claims)
        .map_err(|e| format!("Session decode failed: {e}"))?;

    if claims.exp <= now.timestamp() {
        return Err("Session expired".to_string());
    }
    Ok(claims)
}

/// The session cookie. `secure` should be set whenever the portal is served over HTTPS.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(session_ttl().num_seconds()))
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}
