use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::session::Session;
use crate::models::user::{NewUser, User};
use crate::storage::Storage;
use crate::utils::crypto::{PasswordManager, SessionTokenHasher};

const SESSION_TTL_HOURS: i64 = 24;

/// Identity resolved from a session cookie.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
    pub role: String,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Session-based authentication: opaque tokens handed out on
/// register/login, stored HMAC-hashed with a 24h expiry, revoked on logout.
#[derive(Clone)]
pub struct AuthService {
    storage: Arc<dyn Storage>,
    hasher: SessionTokenHasher,
}

pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub is_professional: bool,
}

impl AuthService {
    pub fn new(storage: Arc<dyn Storage>, session_secret: String) -> Self {
        Self {
            storage,
            hasher: SessionTokenHasher::new(session_secret),
        }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<(User, String)> {
        let password_hash = PasswordManager::hash_password(&input.password)?;
        let user = self
            .storage
            .create_user(NewUser {
                username: input.username,
                email: input.email,
                password_hash,
                full_name: input.full_name,
                role: "user".to_string(),
                is_professional: input.is_professional,
            })
            .await?;
        let token = self.open_session(user.id).await?;
        info!(action = "register_success", user = %user.username);
        Ok((user, token))
    }

    pub async fn login(&self, username_or_email: &str, password: &str) -> Result<(User, String)> {
        let user = self.authenticate_user(username_or_email, password).await?;
        let token = self.open_session(user.id).await?;
        info!(action = "login_success", user = %user.username);
        Ok((user, token))
    }

    async fn authenticate_user(&self, username_or_email: &str, password: &str) -> Result<User> {
        let user = if username_or_email.contains('@') {
            self.storage.get_user_by_email(username_or_email).await?
        } else {
            self.storage.get_user_by_username(username_or_email).await?
        };

        let user =
            user.ok_or_else(|| AppError::AuthenticationError("User not found".to_string()))?;

        if !PasswordManager::verify_password(password, &user.password_hash)? {
            return Err(AppError::AuthenticationError("Invalid password".to_string()));
        }

        Ok(user)
    }

    async fn open_session(&self, user_id: i64) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let now = Utc::now();
        self.storage
            .create_session(Session {
                token_hash: self.hasher.hash(&token),
                user_id,
                created_at: now,
                expires_at: now + Duration::hours(SESSION_TTL_HOURS),
                is_active: true,
            })
            .await?;
        // Opportunistic cleanup; failures here must not block login.
        let _ = self.storage.purge_expired_sessions().await;
        Ok(token)
    }

    pub async fn validate_session(&self, token: &str) -> Result<AuthenticatedUser> {
        let session = self
            .storage
            .get_session(&self.hasher.hash(token))
            .await?
            .ok_or_else(|| AppError::AuthenticationError("Session not found".to_string()))?;
        if !session.is_valid_at(Utc::now()) {
            return Err(AppError::AuthenticationError(
                "Session expired or revoked".to_string(),
            ));
        }
        let user = self
            .storage
            .get_user(session.user_id)
            .await?
            .ok_or_else(|| AppError::AuthenticationError("Session user no longer exists".to_string()))?;
        Ok(AuthenticatedUser {
            user_id: user.id,
            username: user.username,
            role: user.role,
        })
    }

    /// Full user record for the current session (`GET /api/user`).
    pub async fn current_user(&self, token: &str) -> Result<User> {
        let auth = self.validate_session(token).await?;
        self.storage
            .get_user(auth.user_id)
            .await?
            .ok_or_else(|| AppError::AuthenticationError("Session user no longer exists".to_string()))
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        let revoked = self.storage.revoke_session(&self.hasher.hash(token)).await?;
        if !revoked {
            return Err(AppError::AuthenticationError("Session not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemStorage;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemStorage::new()), "test-secret".to_string())
    }

    fn input(name: &str) -> RegisterInput {
        RegisterInput {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password: "Str0ng.Pass".to_string(),
            full_name: None,
            is_professional: false,
        }
    }

    #[tokio::test]
    async fn register_opens_a_valid_session() {
        let auth = service();
        let (user, token) = auth.register(input("ana")).await.unwrap();
        let resolved = auth.validate_session(&token).await.unwrap();
        assert_eq!(resolved.user_id, user.id);
        assert_eq!(resolved.role, "user");
    }

    #[tokio::test]
    async fn logout_revokes_the_session() {
        let auth = service();
        let (_, token) = auth.register(input("leo")).await.unwrap();
        auth.logout(&token).await.unwrap();
        assert!(auth.validate_session(&token).await.is_err());
    }

    #[tokio::test]
    async fn login_rejects_bad_password() {
        let auth = service();
        auth.register(input("sofia")).await.unwrap();
        let err = auth.login("sofia", "not-it").await.unwrap_err();
        assert!(matches!(err, AppError::AuthenticationError(_)));
        // by email works too
        auth.login("sofia@example.com", "Str0ng.Pass").await.unwrap();
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let auth = service();
        let (_, token) = auth.register(input("tam")).await.unwrap();
        let mut forged = token.clone();
        forged.pop();
        forged.push('0');
        assert!(auth.validate_session(&forged).await.is_err() || forged == token);
    }
}
