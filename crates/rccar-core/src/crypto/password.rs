//! SHA-1 based password hashing and salt generation.
//!
//! The Host never sends its password. It sends a fresh random salt in the
//! greeting and the Client answers with `hex(SHA-1(password || salt))`.

use rand_core::{OsRng, RngCore};
use sha1::{Digest, Sha1};

/// Length of every hash and salt produced by this module, in hex chars.
pub const HASH_HEX_LEN: usize = 40;

/// Number of random bytes behind a salt.
const SALT_BYTES: usize = 20;

/// Length of the password generated for a Host that has none configured.
const DEFAULT_PASSWORD_LEN: usize = 6;

/// Hashes `password` with `salt`.
///
/// Returns SHA-1 over the UTF-8 bytes of `password` followed by `salt`,
/// rendered as 40 lowercase hex characters. Deterministic.
///
/// # Examples
///
/// ```rust
/// use rccar_core::crypto::hash_password;
///
/// let hash = hash_password("FooBar", "36b0ba052efeb5c91581e785fc41f4ee61193924");
/// assert_eq!(hash, "4ddd521ed26364db37e280c91f0aa02e7876fcc7");
/// ```
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a new salt: 20 bytes from the OS CSPRNG as 40 lowercase hex chars.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generates a short password for a Host that was started without one.
pub fn generate_default_password() -> String {
    let mut salt = generate_salt();
    salt.truncate(DEFAULT_PASSWORD_LEN);
    salt
}
