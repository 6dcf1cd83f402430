use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::constants::{KDF_CONTEXT_PASSWORD, SALT_SIZE};

/// Salted credential as persisted on a user record. Both halves are hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordEntry {
    pub salt: String,
    pub hash: String,
}

pub fn generate_salt() -> String {
    let mut salt = [0u8; SALT_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    hex::encode(salt)
}

/// Derive a fresh salted entry from a cleartext password.
pub fn make_password_entry(clear_text: &str) -> PasswordEntry {
    let salt = generate_salt();
    let hash = digest(&salt, clear_text);
    PasswordEntry { salt, hash }
}

/// Constant-time check of `clear_text` against a stored entry.
pub fn does_password_match(hash: &str, salt: &str, clear_text: &str) -> bool {
    let candidate = digest(salt, clear_text);
    candidate.as_bytes().ct_eq(hash.as_bytes()).into()
}

// BLAKE3 KDF with domain separation over salt || password
fn digest(salt: &str, clear_text: &str) -> String {
    let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT_PASSWORD);
    hasher.update(salt.as_bytes());
    hasher.update(clear_text.as_bytes());
    hasher.finalize().to_hex().to_string()
}
