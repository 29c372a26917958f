use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Outcome of checking a password against whatever is stored for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Match,
    Mismatch,
    /// No usable hash is stored: the user never set a password.
    NotSet,
}

/// A well-formed Argon2id hash with the same parameters as `hash`, matching no
/// password anyone knows. Checked against when there is no stored hash so the
/// work done does not depend on whether the account exists.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash a password using Argon2id (19MB memory, 2 iterations, parallelism 1).
pub fn hash(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let params = Params::new(19 * 1024, 2, 1, None).map_err(|e| format!("Invalid params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| format!("Hashing failed: {e}"))
}

/// Verify a password against a stored hash. The comparison is constant-time;
/// an absent or unparseable hash yields `NotSet` instead of an error.
pub fn verify(password: &str, stored: Option<&str>) -> Verification {
    let Some(stored) = stored.filter(|s| !s.is_empty()) else {
        return Verification::NotSet;
    };
    let Ok(parsed) = PasswordHash::new(stored) else {
        return Verification::NotSet;
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Verification::Match,
        Err(_) => Verification::Mismatch,
    }
}

/// Spend one verification's worth of work without any stored hash.
pub fn verify_dummy(password: &str) {
    let _ = verify(password, Some(DUMMY_HASH));
}
