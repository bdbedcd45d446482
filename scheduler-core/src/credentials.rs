//! Password policy and salted hashing
//!
//! Passwords are checked against a fixed-order strength policy before
//! any hashing happens, then stored as (salt, PBKDF2-HMAC-SHA256
//! hash). The iteration count comes from [`crate::config::HashingConfig`]
//! and must stay deliberately slow to resist brute force.

use crate::{
    error::{Error, Result},
    types::{HASH_LEN, SALT_LEN},
};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

/// Special characters accepted by the strength policy
const SPECIAL_CHARS: [char; 4] = ['!', '@', '#', '?'];

/// Validate password strength
///
/// Rules are checked in a fixed order and the first failure wins:
/// length, lowercase, uppercase, digit, special character.
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < 8 {
        return Err(Error::WeakPassword(
            "Password needs at least 8 characters".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(Error::WeakPassword(
            "Password needs to contain at least one lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(Error::WeakPassword(
            "Password needs to contain at least one uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(Error::WeakPassword(
            "Password needs to contain at least one number".to_string(),
        ));
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(&c)) {
        return Err(Error::WeakPassword(
            "Password needs to contain at least special character, from '!', '@', '#', '?'"
                .to_string(),
        ));
    }
    Ok(())
}

/// Generate a fresh random salt from the OS CSPRNG
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive the password hash with PBKDF2-HMAC-SHA256
pub fn derive_hash(password: &str, salt: &[u8], rounds: u32) -> [u8; HASH_LEN] {
    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut hash);
    hash
}

/// Re-derive and compare against a stored hash (full-length equality)
pub fn verify(password: &str, salt: &[u8], rounds: u32, stored: &[u8; HASH_LEN]) -> bool {
    derive_hash(password, salt, rounds) == *stored
}
