//! Salted, iterated password hashing with Argon2id.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

/// Failure to hash or parse a stored password hash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("password hashing failed: {message}")]
pub struct PasswordHashError {
    message: String,
}

/// Hash `password` into an Argon2id PHC string with a random salt.
///
/// # Errors
/// Returns [`PasswordHashError`] when the hasher rejects its inputs.
///
/// # Examples
/// ```
/// use storefront::domain::password::{hash_password, verify_password};
///
/// let phc = hash_password("admin").unwrap();
/// assert!(phc.starts_with("$argon2id$"));
/// assert!(verify_password("admin", &phc).unwrap());
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| PasswordHashError {
            message: err.to_string(),
        })
}

/// Check `password` against a stored PHC string.
///
/// # Errors
/// Returns [`PasswordHashError`] when the stored hash cannot be parsed.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordHashError> {
    let parsed = PasswordHash::new(stored).map_err(|err| PasswordHashError {
        message: err.to_string(),
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn hashes_are_salted() {
        let a = hash_password("admin").expect("hash");
        let b = hash_password("admin").expect("hash");
        assert_ne!(a, b);
        assert!(verify_password("admin", &a).expect("verify"));
        assert!(verify_password("admin", &b).expect("verify"));
    }

    #[rstest]
    fn wrong_password_does_not_verify() {
        let phc = hash_password("admin").expect("hash");
        assert!(!verify_password("Admin", &phc).expect("verify"));
    }

    #[rstest]
    fn unsalted_legacy_digests_are_rejected() {
        let legacy = "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918";
        assert!(verify_password("admin", legacy).is_err());
    }
}
