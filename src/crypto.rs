//! Password hashing for the admin credential store.
//!
//! Passwords are hashed with PBKDF2-HMAC-SHA512 over a random per-password
//! salt and stored as `hex(salt):hex(hash)`. Verification recomputes the
//! derivation and compares in constant time.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use subtle::ConstantTimeEq;

/// PBKDF2 iteration count. The original deployment used 1000; this keeps
/// the same format while raising the work factor.
const PBKDF2_ROUNDS: u32 = 10_000;

/// Salt length in bytes (hex-encoded to 32 chars in storage).
const SALT_LEN: usize = 16;

/// Derived hash length in bytes (SHA-512 output size).
const HASH_LEN: usize = 64;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    use rand::rngs::OsRng;
    use rand::RngCore;

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), &salt, PBKDF2_ROUNDS, &mut hash);

    format!("{}:{}", hex::encode(salt), hex::encode(hash))
}

/// Verify a password against a stored `salt:hash` string.
///
/// Returns false for malformed stored values rather than erroring; a
/// corrupted credential record should fail closed.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, hash_hex)) = stored.split_once(':') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(hash_hex) else {
        return false;
    };
    if expected.len() != HASH_LEN {
        return false;
    }

    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), &salt, PBKDF2_ROUNDS, &mut hash);

    hash.ct_eq(&expected).into()
}
