//! Password utilities

use argon2::Algorithm;
use argon2::Argon2;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use rand_core::OsRng;

pub use argon2::password_hash::Error;

/// Generate a new random password
pub fn generate() -> String {
    SaltString::generate(&mut OsRng).to_string()
}

/// Hash a given password with a fresh salt
///
/// # Errors
///
/// Will return `Err` when argon2 refuses the input
pub fn hash(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);

    let hashed_password = Argon2::default().hash_password(password.as_bytes(), &salt)?;

    Ok(hashed_password.to_string())
}

/// Is the stored value an argon2 PHC hash string?
pub fn is_hash(stored: &str) -> bool {
    parse_hash(stored).is_some()
}

/// Verify a given password against a stored value
///
/// Stored values that are not argon2 hashes are legacy plaintext and must match exactly
pub fn verify(stored: &str, password: &str) -> bool {
    match parse_hash(stored) {
        Some(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        None => stored == password,
    }
}

/// Only PHC strings of an argon2 variant that carry a hash output count as hashes
fn parse_hash(stored: &str) -> Option<PasswordHash<'_>> {
    let parsed_hash = PasswordHash::new(stored).ok()?;

    if Algorithm::try_from(parsed_hash.algorithm).is_err() || parsed_hash.hash.is_none() {
        return None;
    }

    Some(parsed_hash)
}
