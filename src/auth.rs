//! Registration checks and password hashing.
//!
//! Hashes are `pbkdf2-sha256$<rounds>$<salt hex>$<key hex>`: PBKDF2-HMAC-SHA256
//! over a random 16 byte salt.

use once_cell::sync::Lazy;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use regex::Regex;
use sha2::Sha256;
use std::collections::BTreeMap;
use tokio::task::{spawn_blocking, JoinError};

const SCHEME: &str = "pbkdf2-sha256";
const ROUNDS: u32 = 100_000;
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 50;

static USERNAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid regex"));

/// Field name to messages, in field order
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Check a registration form; `Err` carries every problem found
pub fn validate_registration(username: &str, password: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    let name_len = username.chars().count();
    let mut name_errors = Vec::new();
    if name_len < USERNAME_MIN {
        name_errors.push(format!(
            "Username must be at least {USERNAME_MIN} characters"
        ));
    }
    if name_len > USERNAME_MAX {
        name_errors.push(format!("Username must be at most {USERNAME_MAX} characters"));
    }
    if name_len > 0 && !USERNAME_CHARS.is_match(username) {
        name_errors.push("Username may only contain letters, numbers and underscores".to_string());
    }
    if !name_errors.is_empty() {
        errors.insert("username".to_string(), name_errors);
    }

    let pass_len = password.chars().count();
    if pass_len < PASSWORD_MIN {
        errors.insert(
            "password".to_string(),
            vec![format!("Password must be at least {PASSWORD_MIN} characters")],
        );
    } else if pass_len > PASSWORD_MAX {
        errors.insert(
            "password".to_string(),
            vec![format!("Password must be at most {PASSWORD_MAX} characters")],
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn derive_key(salt: &[u8], password: &str, rounds: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut key);
    key
}

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let key = derive_key(&salt, password, ROUNDS);
    format!("{SCHEME}${ROUNDS}${}${}", hex::encode(salt), hex::encode(key))
}

/// False for a wrong password and for any stored value not in our format
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(rounds), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    let (Ok(rounds), Ok(salt), Ok(expected)) =
        (rounds.parse::<u32>(), hex::decode(salt), hex::decode(expected))
    else {
        return false;
    };
    if rounds == 0 {
        return false;
    }
    constant_time_eq(&derive_key(&salt, password, rounds), &expected)
}

/// [`hash_password`] on the blocking pool; key derivation is CPU bound
pub async fn spawn_hash(password: String) -> Result<String, JoinError> {
    spawn_blocking(move || hash_password(&password)).await
}

/// [`verify_password`] on the blocking pool
pub async fn spawn_verify(password: String, stored: String) -> Result<bool, JoinError> {
    spawn_blocking(move || verify_password(&password, &stored)).await
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
