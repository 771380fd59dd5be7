//! Credential handling.
//!
//! Only password hashing lives here; who may do what is decided by
//! [`crate::authz`].

pub mod password;

pub use password::{MIN_PASSWORD_LEN, hash_password, is_strong_enough, verify_password};
