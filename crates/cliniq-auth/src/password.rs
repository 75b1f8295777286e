//! Password hashing, verification, and the server-side password policy.
//!
//! Hashing uses Argon2id with a per-password random salt; cost
//! parameters come from [`AuthConfig`] so they can be retuned at deploy
//! time. Verification reads the parameters back out of the PHC string,
//! so old hashes keep verifying after a retune.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Special characters accepted by the password policy.
pub const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

fn argon2_instance(config: &AuthConfig) -> Result<Argon2<'static>, AuthError> {
    let params = argon2::Params::new(
        config.argon2_memory_kib,
        config.argon2_iterations,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| AuthError::Crypto(format!("argon2 params: {e}")))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hash a password with Argon2id. The salt is randomly generated for
/// each call.
pub fn hash_password(password: &str, config: &AuthConfig) -> Result<String, AuthError> {
    let argon2 = argon2_instance(config)?;
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Crypto(format!("password hash: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(AuthError::CorruptHash)` if the stored hash is unparseable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = argon2::PasswordHash::new(hash).map_err(|_| AuthError::CorruptHash)?;

    let argon2 = Argon2::default();
    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

/// A hash of a random throwaway secret, computed once at gateway
/// construction. Login paths verify against it when the email resolves
/// to no principal, so "unknown email" and "wrong password" spend the
/// same time in the verifier.
pub fn dummy_hash(config: &AuthConfig) -> Result<String, AuthError> {
    let throwaway = uuid_like_secret();
    hash_password(&throwaway, config)
}

fn uuid_like_secret() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rand::Rng::random(&mut rng);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Server-side password policy, applied at principal creation and on
/// reset: at least 8 characters with upper, lower, digit, and one
/// special character.
pub fn validate_password_policy(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < 8 {
        return Err(AuthError::WeakPassword(
            "password must be at least 8 characters".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AuthError::WeakPassword(
            "password must contain an uppercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AuthError::WeakPassword(
            "password must contain a lowercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword(
            "password must contain a digit".into(),
        ));
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        return Err(AuthError::WeakPassword(
            "password must contain a special character".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> AuthConfig {
        // Cheap parameters so the hashing tests stay fast.
        AuthConfig {
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            argon2_parallelism: 1,
            ..Default::default()
        }
    }

    #[test]
    fn correct_password_matches() {
        let hash = hash_password("Str0ng!Pass1", &quick_config()).unwrap();
        assert!(verify_password("Str0ng!Pass1", &hash).unwrap());
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = hash_password("Str0ng!Pass1", &quick_config()).unwrap();
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_corrupt_not_false() {
        let result = verify_password("pw", "not-a-hash");
        assert!(matches!(result, Err(AuthError::CorruptHash)));
    }

    #[test]
    fn dummy_hash_never_verifies_real_input() {
        let hash = dummy_hash(&quick_config()).unwrap();
        assert!(!verify_password("anything", &hash).unwrap());
    }

    #[test]
    fn policy_accepts_a_conforming_password() {
        assert!(validate_password_policy("Str0ng!Pass1").is_ok());
        assert!(validate_password_policy("N3w!Password").is_ok());
    }

    #[test]
    fn policy_rejects_missing_classes() {
        assert!(validate_password_policy("short1!").is_err()); // too short
        assert!(validate_password_policy("alllower1!").is_err()); // no upper
        assert!(validate_password_policy("ALLUPPER1!").is_err()); // no lower
        assert!(validate_password_policy("NoDigits!!").is_err()); // no digit
        assert!(validate_password_policy("NoSpecial1").is_err()); // no special
    }

    /// A password accepted at creation passes the same validator again
    /// on reset — one validator, one behavior.
    #[test]
    fn policy_is_stable_across_calls() {
        let pw = "R3set!Able";
        assert!(validate_password_policy(pw).is_ok());
        assert!(validate_password_policy(pw).is_ok());
    }
}
