/// Password hashing and verification using Argon2id
///
/// Hashes are stored as PHC strings, which embed the algorithm, parameters
/// and salt, so verification needs nothing but the stored string.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Argon2id cost parameters
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KB (default: 19456 = 19 MB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 2)
    pub time_cost: u32,
    /// Parallelism (lanes, default: 1)
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 19456,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl PasswordConfig {
    fn to_params(&self) -> Result<Params, PasswordError> {
        Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }
}

/// Hash a plaintext password with the default parameters
///
/// # Example
///
/// ```no_run
/// use shop_api::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("123456").unwrap();
/// assert!(verify_password("123456", &hash).unwrap());
/// assert!(!verify_password("654321", &hash).unwrap());
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with_config(password, &PasswordConfig::default())
}

/// Hash a password with custom parameters
pub fn hash_password_with_config(
    password: &str,
    config: &PasswordConfig,
) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        config.to_params()?,
    );

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext password against a stored PHC hash
///
/// Returns `Ok(false)` on mismatch; `Err` only when the stored hash itself is
/// unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    // Parameters come from the PHC string, not from Argon2::default()
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> PasswordConfig {
        PasswordConfig {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("123456").expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("123456", &hash).unwrap());
        assert!(!verify_password("1234567", &hash).unwrap());
    }

    #[test]
    fn test_same_password_produces_different_hashes() {
        let hash1 = hash_password_with_config("abcdef", &fast()).unwrap();
        let hash2 = hash_password_with_config("abcdef", &fast()).unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("abcdef", &hash1).unwrap());
        assert!(verify_password("abcdef", &hash2).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        // Plaintext left over from an unhashed seed is not a valid hash
        let result = verify_password("123456", "123456");
        assert!(matches!(result, Err(PasswordError::InvalidHashFormat)));
    }

    #[test]
    fn test_custom_config_recorded_in_hash() {
        let hash = hash_password_with_config("pw", &fast()).unwrap();

        assert!(hash.contains("m=1024"));
        assert!(hash.contains("t=1"));
        assert!(verify_password("pw", &hash).unwrap());
    }
}
