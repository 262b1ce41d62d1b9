//! Password hashing and refresh-token secrets.
//!
//! Argon2 is deliberately slow, so the async wrappers [`hash_password`] and
//! [`verify_password`] move the work onto the blocking thread pool.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine as _, engine::general_purpose};
use rand::prelude::RngExt;
use rand::rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::PasswordConfig;
use crate::errors::Error;

/// Argon2 hashing parameters.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    fn to_argon2(self) -> Result<Argon2<'static>, Error> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None).map_err(|e| Error::Internal {
            operation: format!("create argon2 params: {e}"),
        })?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    /// Argon2id RFC recommendations
    fn default() -> Self {
        Self {
            memory_kib: 19456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl From<&PasswordConfig> for Argon2Params {
    fn from(config: &PasswordConfig) -> Self {
        Self {
            memory_kib: config.argon2_memory_kib,
            iterations: config.argon2_iterations,
            parallelism: config.argon2_parallelism,
        }
    }
}

/// Hash a string using Argon2 with the given parameters.
pub fn hash_string_with_params(input: &str, params: Argon2Params) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = params
        .to_argon2()?
        .hash_password(input.as_bytes(), &salt)
        .map_err(|e| Error::Internal {
            operation: format!("hash string: {e}"),
        })?;

    Ok(hash.to_string())
}

/// Verify a string against a hash.
///
/// Verification uses the parameters embedded in the hash itself.
pub fn verify_string(input: &str, hash: &str) -> Result<bool, Error> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| Error::Internal {
        operation: format!("parse hash: {e}"),
    })?;

    Ok(Argon2::default().verify_password(input.as_bytes(), &parsed_hash).is_ok())
}

/// Check a password against the configured length rules.
pub fn validate_length(password: &str, config: &PasswordConfig) -> Result<(), Error> {
    let length = password.chars().count();
    if length < config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", config.min_length),
        });
    }
    if length > config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", config.max_length),
        });
    }
    Ok(())
}

/// Hash a password on a blocking thread.
pub async fn hash_password(password: String, params: Argon2Params) -> Result<String, Error> {
    tokio::task::spawn_blocking(move || hash_string_with_params(&password, params))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })?
}

/// Verify a password on a blocking thread.
pub async fn verify_password(password: String, hash: String) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })?
}

/// Generate the secret half of a refresh token: 32 random bytes, base64url without padding.
pub fn generate_refresh_secret() -> String {
    let mut bytes = [0u8; 32];
    rng().fill(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest stored in place of a refresh secret.
pub fn hash_refresh_secret(secret: &str) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(Sha256::digest(secret.as_bytes()))
}

/// Check a presented refresh secret against its stored digest in constant time.
pub fn verify_refresh_secret(secret: &str, stored_hash: &str) -> bool {
    hash_refresh_secret(secret).as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cheap parameters keep the tests fast; verification reads them back from the hash.
    fn test_params() -> Argon2Params {
        Argon2Params {
            memory_kib: 128,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_string_hashing() {
        let hash = hash_string_with_params("test_password_123", test_params()).unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(verify_string("test_password_123", &hash).unwrap());
        assert!(!verify_string("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_same_input_different_hashes() {
        let hash1 = hash_string_with_params("same_password", test_params()).unwrap();
        let hash2 = hash_string_with_params("same_password", test_params()).unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_string("same_password", &hash1).unwrap());
        assert!(verify_string("same_password", &hash2).unwrap());
    }

    #[test]
    fn test_garbage_hash_is_internal_error() {
        assert!(matches!(verify_string("x", "not-a-hash"), Err(Error::Internal { .. })));
    }

    #[test]
    fn test_validate_length() {
        let config = PasswordConfig {
            min_length: 4,
            max_length: 8,
            ..Default::default()
        };
        assert!(validate_length("abcd", &config).is_ok());
        assert!(matches!(validate_length("abc", &config), Err(Error::BadRequest { .. })));
        assert!(matches!(validate_length("abcdefghi", &config), Err(Error::BadRequest { .. })));
    }

    #[tokio::test]
    async fn test_async_wrappers() {
        let hash = hash_password("pantry-pass".to_string(), test_params()).await.unwrap();
        assert!(verify_password("pantry-pass".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("other".to_string(), hash).await.unwrap());
    }

    #[test]
    fn test_refresh_secret() {
        let secret1 = generate_refresh_secret();
        let secret2 = generate_refresh_secret();

        assert_ne!(secret1, secret2);
        // 32 bytes in base64url without padding
        assert_eq!(secret1.len(), 43);
        assert!(secret1.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        assert_eq!(hash_refresh_secret(&secret1), hash_refresh_secret(&secret1));
        assert_ne!(hash_refresh_secret(&secret1), hash_refresh_secret(&secret2));
        assert_ne!(hash_refresh_secret(&secret1), secret1);

        let stored = hash_refresh_secret(&secret1);
        assert!(verify_refresh_secret(&secret1, &stored));
        assert!(!verify_refresh_secret(&secret2, &stored));
        assert!(!verify_refresh_secret(&secret1, &stored[..stored.len() - 1]));
    }
}
