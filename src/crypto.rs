use hkdf::Hkdf;
use sha2::Sha256;

const HKDF_SALT: &[u8] = b"staff-portal-v1";
const SESSION_INFO: &[u8] = b"session-hs256";
const RESET_INFO: &[u8] = b"password-reset-hs256";

/// HMAC keys derived from the server secret, one per token purpose, so a
/// session token never verifies as a reset token and vice versa.
#[derive(Clone)]
pub struct SigningKeys {
    pub session: [u8; 32],
    pub reset: [u8; 32],
}

impl SigningKeys {
    pub fn derive(secret: &str) -> Self {
        Self {
            session: derive_key(secret, SESSION_INFO),
            reset: derive_key(secret, RESET_INFO),
        }
    }
}

impl std::fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKeys(..)")
    }
}

fn derive_key(secret: &str, info: &[u8]) -> [u8; 32] {
    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), secret.as_bytes());
    let mut okm = [0u8; 32];
    hk.expand(info, &mut okm)
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    okm
}
