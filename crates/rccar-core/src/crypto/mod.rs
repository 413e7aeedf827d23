//! Salted password hashing used by the greeting/authentication handshake.

pub mod password;

pub use password::{generate_default_password, generate_salt, hash_password, HASH_HEX_LEN};
