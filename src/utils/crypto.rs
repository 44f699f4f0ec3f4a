use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use sha2::Sha256;

use crate::errors::{AppError, Result};

pub struct PasswordManager;

impl PasswordManager {
    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::InternalError(format!("Invalid password hash: {}", e)))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(_) => Ok(false),
        }
    }
}

/// Keyed hash for session tokens. Storage only ever sees the HMAC, so a
/// leaked database cannot be replayed as cookies without `SESSION_SECRET`.
#[derive(Clone)]
pub struct SessionTokenHasher {
    secret: String,
}

impl SessionTokenHasher {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn hash(&self, token: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(token.as_bytes());
        let digest = mac.finalize().into_bytes();
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip() {
        let hash = PasswordManager::hash_password("Correct.Horse1").unwrap();
        assert!(PasswordManager::verify_password("Correct.Horse1", &hash).unwrap());
        assert!(!PasswordManager::verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn token_hash_depends_on_secret() {
        let a = SessionTokenHasher::new("secret-a".to_string());
        let b = SessionTokenHasher::new("secret-b".to_string());
        assert_eq!(a.hash("tok"), a.hash("tok"));
        assert_ne!(a.hash("tok"), b.hash("tok"));
    }
}
