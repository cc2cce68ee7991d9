//! Password hashing.
//!
//! Hashes are PBKDF2-HMAC-SHA256 with a random per-password salt, stored as
//! `pbkdf2_sha256$<iterations>$<salt>$<hash>` with base64 salt and hash. The iteration count is
//! part of the stored string, so raising the configured cost leaves older hashes verifiable.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SCHEME: &str = "pbkdf2_sha256";
const SALT_LENGTH: usize = 16;
const HASH_LENGTH: usize = 32;

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);

    let hash = derive(password, &salt, iterations);
    format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD.encode(salt),
        STANDARD.encode(hash)
    )
}

/// Check `password` against a stored hash.
///
/// A malformed stored value never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    if scheme != SCHEME {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 {
        return false;
    }
    let (Ok(salt), Ok(expected)) = (STANDARD.decode(salt), STANDARD.decode(expected)) else {
        return false;
    };
    if expected.len() != HASH_LENGTH {
        return false;
    }

    let actual = derive(password, &salt, iterations);
    actual.ct_eq(expected.as_slice()).into()
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_ITERATIONS: u32 = 1_000;

    #[test]
    fn hash_then_verify() {
        let stored = hash_password("s3cret!", TEST_ITERATIONS);
        assert!(stored.starts_with("pbkdf2_sha256$1000$"));
        assert!(verify_password("s3cret!", &stored));
        assert!(!verify_password("s3cret", &stored));
    }

    #[test]
    fn same_password_gets_different_salts() {
        let a = hash_password("pw", TEST_ITERATIONS);
        let b = hash_password("pw", TEST_ITERATIONS);
        assert_ne!(a, b);
        assert!(verify_password("pw", &a));
        assert!(verify_password("pw", &b));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        for stored in [
            "",
            "plain-text",
            "pbkdf2_sha256$abc$AAAA$AAAA",
            "pbkdf2_sha256$0$AAAA$AAAA",
            "md5$1000$AAAA$AAAA",
            "pbkdf2_sha256$1000$not base64$AAAA",
            "pbkdf2_sha256$1000$AAAA$AAAA$extra",
        ] {
            assert!(!verify_password("pw", stored), "{stored} should not verify");
        }
    }
}
