//! Password reset tokens.
//!
//! A token is an HS256-signed payload of `{user_id, iat, pwd}`, where `pwd`
//! fingerprints the password hash stored when the token was issued. Nothing
//! is stored server-side: the maximum age is applied when the token comes
//! back, and a token stops working once the password it was issued against
//! has changed, so each token completes at most one reset.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::auth::password;
use crate::crypto::SigningKeys;
use crate::db;
use crate::models::User;

/// Reset links stop working 30 minutes after they are issued.
pub const RESET_TOKEN_MAX_AGE_SECS: i64 = 1800;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResetClaims {
    user_id: i64,
    iat: i64,
    pwd: String,
}

#[derive(Debug)]
pub enum ResetError {
    InvalidOrExpiredToken,
    Storage(sqlx::Error),
    Internal(String),
}

impl std::fmt::Display for ResetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResetError::InvalidOrExpiredToken => write!(f, "Invalid or expired reset token"),
            ResetError::Storage(err) => write!(f, "Storage error: {err}"),
            ResetError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl From<sqlx::Error> for ResetError {
    fn from(err: sqlx::Error) -> Self {
        ResetError::Storage(err)
    }
}

/// Short digest of a stored password hash. Users without a password share
/// the empty fingerprint.
fn fingerprint(password_hash: Option<&str>) -> String {
    match password_hash.filter(|h| !h.is_empty()) {
        Some(hash) => Sha256::digest(hash.as_bytes())
            .iter()
            .take(12)
            .map(|b| format!("{b:02x}"))
            .collect(),
        None => String::new(),
    }
}

/// Issue a reset token for a user whose stored hash is currently `password_hash`.
pub fn issue_token(
    user_id: i64,
    password_hash: Option<&str>,
    key: &[u8],
    now: DateTime<Utc>,
) -> Result<String, String> {
    let claims = ResetClaims {
        user_id,
        iat: now.timestamp(),
        pwd: fingerprint(password_hash),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(key))
        .map_err(|e| format!("Reset token encode failed: {e}"))
}

fn decode_claims(
    token: &str,
    key: &[u8],
    max_age_secs: i64,
    now: DateTime<Utc>,
) -> Option<ResetClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let claims = decode::<ResetClaims>(token, &DecodingKey::from_secret(key), &validation)
        .ok()?
        .claims;

    let age = now.timestamp() - claims.iat;
    if age < 0 || age > max_age_secs {
        return None;
    }
    Some(claims)
}

/// The user id a token was issued for, if it is authentic and no older than
/// `max_age_secs`. Every kind of failure is `None`.
pub fn decode_token(token: &str, key: &[u8], max_age_secs: i64, now: DateTime<Utc>) -> Option<i64> {
    decode_claims(token, key, max_age_secs, now).map(|claims| claims.user_id)
}

/// Resolve a token to its user. A bad token, a vanished user or a password
/// changed since issue is `Ok(None)`; only a failing store is an error.
pub async fn verify_token(
    pool: &SqlitePool,
    key: &[u8],
    token: &str,
    max_age_secs: i64,
    now: DateTime<Utc>,
) -> Result<Option<User>, sqlx::Error> {
    let Some(claims) = decode_claims(token, key, max_age_secs, now) else {
        return Ok(None);
    };
    let user = db::users::find_by_id(pool, claims.user_id).await?;
    Ok(user.filter(|u| fingerprint(u.password_hash.as_deref()) == claims.pwd))
}

/// Complete a reset: verify the token and store a hash of `new_password` on
/// its user. The check and the update commit as a unit or not at all.
pub async fn reset_password(
    pool: &SqlitePool,
    keys: &SigningKeys,
    token: &str,
    new_password: &str,
    now: DateTime<Utc>,
) -> Result<User, ResetError> {
    let claims = decode_claims(token, &keys.reset, RESET_TOKEN_MAX_AGE_SECS, now)
        .ok_or(ResetError::InvalidOrExpiredToken)?;

    let pw_hash = password::hash(new_password).map_err(ResetError::Internal)?;

    let mut tx = pool.begin().await?;
    let user = db::users::find_by_id(&mut *tx, claims.user_id)
        .await?
        .filter(|u| fingerprint(u.password_hash.as_deref()) == claims.pwd)
        .ok_or(ResetError::InvalidOrExpiredToken)?;
    db::users::update_password(&mut *tx, user.id, &pw_hash, user.id, now).await?;
    tx.commit().await?;

    tracing::info!(user_id = user.id, "Password reset completed");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::auth::password::Verification;
    use crate::db::test_support;

    const KEY: &[u8] = b"reset-test-key";

    fn tamper(token: &str) -> String {
        // Flip a character inside the payload segment.
        let idx = token.find('.').unwrap() + 3;
        let mut chars: Vec<char> = token.chars().collect();
        chars[idx] = if chars[idx] == 'A' { 'B' } else { 'A' };
        chars.into_iter().collect()
    }

    #[test]
    fn round_trip_immediately() {
        let now = Utc::now();
        let token = issue_token(42, None, KEY, now).unwrap();
        assert_eq!(decode_token(&token, KEY, RESET_TOKEN_MAX_AGE_SECS, now), Some(42));
    }

    #[test]
    fn token_is_url_safe() {
        let token = issue_token(42, None, KEY, Utc::now()).unwrap();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'));
    }

    #[test]
    fn valid_up_to_max_age_and_not_after() {
        let now = Utc::now();
        let token = issue_token(42, None, KEY, now).unwrap();
        let at_limit = now + Duration::seconds(RESET_TOKEN_MAX_AGE_SECS);
        assert_eq!(decode_token(&token, KEY, RESET_TOKEN_MAX_AGE_SECS, at_limit), Some(42));

        let past = now + Duration::seconds(RESET_TOKEN_MAX_AGE_SECS + 1);
        assert_eq!(decode_token(&token, KEY, RESET_TOKEN_MAX_AGE_SECS, past), None);
    }

    #[test]
    fn future_issue_time_is_rejected() {
        let now = Utc::now();
        let token = issue_token(42, None, KEY, now + Duration::minutes(5)).unwrap();
        assert_eq!(decode_token(&token, KEY, RESET_TOKEN_MAX_AGE_SECS, now), None);
    }

    #[test]
    fn tampered_or_foreign_tokens_are_rejected() {
        let now = Utc::now();
        let token = issue_token(42, None, KEY, now).unwrap();
        assert_eq!(decode_token(&tamper(&token), KEY, RESET_TOKEN_MAX_AGE_SECS, now), None);
        assert_eq!(decode_token(&token, b"other-key", RESET_TOKEN_MAX_AGE_SECS, now), None);
        assert_eq!(decode_token("not-a-token", KEY, RESET_TOKEN_MAX_AGE_SECS, now), None);
    }

    #[test]
    fn session_tokens_do_not_verify_as_reset_tokens() {
        let keys = SigningKeys::derive("shared-secret");
        let now = Utc::now();
        let claims = crate::auth::session::SessionClaims::new(
            1,
            "A B".to_string(),
            "Admin".to_string(),
            None,
            now,
        );
        let session_token = crate::auth::session::encode_token(&claims, &keys.session).unwrap();
        assert_eq!(
            decode_token(&session_token, &keys.reset, RESET_TOKEN_MAX_AGE_SECS, now),
            None
        );
    }

    #[tokio::test]
    async fn verify_resolves_existing_user_only() {
        let pool = test_support::pool().await;
        let now = Utc::now();
        let user = test_support::user(&pool, "a@x.com", None, now).await;

        let token = issue_token(user.id, None, KEY, now).unwrap();
        let found = verify_token(&pool, KEY, &token, RESET_TOKEN_MAX_AGE_SECS, now)
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        let ghost = issue_token(user.id + 100, None, KEY, now).unwrap();
        let missing = verify_token(&pool, KEY, &ghost, RESET_TOKEN_MAX_AGE_SECS, now)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn reset_updates_hash_and_audit_fields() {
        let pool = test_support::pool().await;
        let keys = SigningKeys::derive("test-secret");
        let created = Utc::now() - Duration::days(3);
        let user = test_support::user(&pool, "a@x.com", Some("old-password"), created).await;

        let now = Utc::now();
        let token = issue_token(user.id, user.password_hash.as_deref(), &keys.reset, now).unwrap();
        reset_password(&pool, &keys, &token, "new-password", now)
            .await
            .unwrap();

        let stored = db::users::find_by_id(&pool, user.id).await.unwrap().unwrap();
        let hash = stored.password_hash.as_deref();
        assert_eq!(password::verify("new-password", hash), Verification::Match);
        assert_eq!(password::verify("old-password", hash), Verification::Mismatch);
        assert_eq!(stored.last_updated_by, Some(user.id));
        assert_eq!(stored.last_updated_utc.timestamp(), now.timestamp());
    }

    #[tokio::test]
    async fn expired_token_leaves_hash_unchanged() {
        let pool = test_support::pool().await;
        let keys = SigningKeys::derive("test-secret");
        let issued = Utc::now();
        let user = test_support::user(&pool, "a@x.com", Some("old-password"), issued).await;
        let before = user.password_hash.clone();

        let token = issue_token(user.id, user.password_hash.as_deref(), &keys.reset, issued).unwrap();
        let err = reset_password(&pool, &keys, &token, "new-password", issued + Duration::minutes(31))
            .await
            .unwrap_err();
        assert!(matches!(err, ResetError::InvalidOrExpiredToken));

        let stored = db::users::find_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, before);
    }

    #[tokio::test]
    async fn token_completes_only_one_reset() {
        let pool = test_support::pool().await;
        let keys = SigningKeys::derive("test-secret");
        let now = Utc::now();
        let user = test_support::user(&pool, "a@x.com", Some("old-password"), now).await;

        let token = issue_token(user.id, user.password_hash.as_deref(), &keys.reset, now).unwrap();
        reset_password(&pool, &keys, &token, "first-new", now)
            .await
            .unwrap();

        let later = now + Duration::minutes(5);
        let err = reset_password(&pool, &keys, &token, "second-new", later)
            .await
            .unwrap_err();
        assert!(matches!(err, ResetError::InvalidOrExpiredToken));
        assert!(verify_token(&pool, &keys.reset, &token, RESET_TOKEN_MAX_AGE_SECS, later)
            .await
            .unwrap()
            .is_none());

        let stored = db::users::find_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(
            password::verify("first-new", stored.password_hash.as_deref()),
            Verification::Match
        );
    }

    #[tokio::test]
    async fn token_for_user_without_password_is_spent_by_first_reset() {
        let pool = test_support::pool().await;
        let keys = SigningKeys::derive("test-secret");
        let now = Utc::now();
        let user = test_support::user(&pool, "new@x.com", None, now).await;

        let token = issue_token(user.id, None, &keys.reset, now).unwrap();
        reset_password(&pool, &keys, &token, "first-new", now)
            .await
            .unwrap();
        assert!(reset_password(&pool, &keys, &token, "second-new", now)
            .await
            .is_err());
    }
}
