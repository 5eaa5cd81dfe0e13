//! Credential hashing and verification
//!
//! Stored credentials are `hex(salt):hex(derived)` where the derived key is
//! PBKDF2-HMAC-SHA256 over the password with a random 16-byte salt. The
//! format is stable: existing rows must keep verifying across releases.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

/// PBKDF2 iteration count
const PBKDF2_ROUNDS: u32 = 100_000;

/// Salt length in bytes
const SALT_LEN: usize = 16;

/// Derived key length in bytes (SHA-256 output)
const KEY_LEN: usize = 32;

/// Minimum password length, enforced by callers (not by this module)
pub const MIN_PASSWORD_LEN: usize = 6;

/// Days until a regular account's password expires after creation or reset
pub const PASSWORD_EXPIRY_DAYS: i64 = 90;

/// Days a subuser account stays valid after creation
pub const SUBUSER_VALIDITY_DAYS: i64 = 7;

/// Hash a password into the stored credential format
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut derived = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ROUNDS, &mut derived);

    format!("{}:{}", hex::encode(salt), hex::encode(derived))
}

/// Verify a password against a stored credential
///
/// Fails closed: any malformed stored string returns false, never an error.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, derived_hex)) = stored.split_once(':') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(derived_hex) else {
        return false;
    };
    if salt.is_empty() || expected.len() != KEY_LEN {
        return false;
    }

    let mut derived = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ROUNDS, &mut derived);
    derived[..] == expected[..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let stored = hash_password("secret123");
        assert!(verify_password("secret123", &stored));
        assert!(!verify_password("secret124", &stored));
        assert!(!verify_password("", &stored));
    }

    #[test]
    fn test_salts_are_unique_per_hash() {
        let a = hash_password("secret123");
        let b = hash_password("secret123");
        assert_ne!(a, b);
        // Both still verify
        assert!(verify_password("secret123", &a));
        assert!(verify_password("secret123", &b));
    }

    #[test]
    fn test_malformed_credentials_fail_closed() {
        for stored in [
            "",
            "no-separator",
            "nothex:deadbeef",
            "deadbeef:nothex",
            ":",
            "deadbeef:",       // empty derived part
            "deadbeef:ff",     // derived too short
        ] {
            assert!(
                !verify_password("secret123", stored),
                "expected fail-closed for {:?}",
                stored
            );
        }
    }

    #[test]
    fn test_stored_format() {
        let stored = hash_password("secret123");
        let (salt_hex, derived_hex) = stored.split_once(':').unwrap();
        assert_eq!(salt_hex.len(), SALT_LEN * 2);
        assert_eq!(derived_hex.len(), KEY_LEN * 2);
    }
}
