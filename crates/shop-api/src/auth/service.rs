//! Authentication service layer
//!
//! Registration and credential verification over a [`UserRepository`].
//! Argon2 work runs on the blocking pool so it never stalls the runtime.

use super::password::{hash_password_with_config, verify_password, PasswordConfig, PasswordError};
use super::token::{issue_token, TokenConfig};
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use shop_core::{NewUser, ShopError, User, UserPublic, UserRepository};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

/// User registration request
///
/// Fields are optional at the wire level so absence maps to `MissingFields`
/// rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(max = 254, message = "Email is too long"))]
    pub email: Option<String>,
    #[validate(length(max = 1024, message = "Password is too long"))]
    pub password: Option<String>,
    #[validate(length(max = 100, message = "Name is too long"))]
    pub name: Option<String>,
}

/// User login request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A successful login: the user and their freshly issued session token
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
}

/// Authentication service
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenConfig,
    passwords: PasswordConfig,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenConfig, passwords: PasswordConfig) -> Self {
        Self {
            users,
            tokens,
            passwords,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.users.clone(),
            state.tokens.clone(),
            state.passwords.clone(),
        )
    }

    /// Register a new user
    ///
    /// # Returns
    ///
    /// * `Ok(UserPublic)` - Newly created user, without the hash
    /// * `Err(MissingFields)` - Email or password absent or blank
    /// * `Err(DuplicateUser)` - Email already registered
    pub async fn register(&self, request: RegisterRequest) -> Result<UserPublic, ShopError> {
        request
            .validate()
            .map_err(|e| ShopError::ValidationError(first_message(&e)))?;

        let email = required("email", request.email.as_deref())?;
        let password = present("password", request.password)?;
        let name = request
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        // Cheap early exit; the store's unique constraint is what actually decides
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ShopError::DuplicateUser);
        }

        let password_hash = self.hash(password).await?;

        let user = self
            .users
            .create_user(NewUser {
                email,
                password_hash,
                name,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.to_public())
    }

    /// Verify credentials and issue a session token
    ///
    /// # Returns
    ///
    /// * `Err(UserNotFound)` - No user with that email
    /// * `Err(InvalidCredentials)` - Password does not verify
    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, ShopError> {
        let email = required("email", request.email.as_deref())?;
        let password = present("password", request.password)?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(ShopError::UserNotFound)?;

        let stored_hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|e| ShopError::Other(anyhow::anyhow!("Password verification task failed: {e}")))?;

        match verified {
            Ok(true) => {}
            Ok(false) => return Err(ShopError::InvalidCredentials),
            Err(PasswordError::InvalidHashFormat) => {
                tracing::warn!(user_id = %user.id, "Stored password hash is not a valid PHC string");
                return Err(ShopError::InvalidCredentials);
            }
            Err(e) => return Err(ShopError::Other(e.into())),
        }

        let token = issue_token(&self.tokens, user.id, &user.email)
            .map_err(|e| ShopError::Other(e.into()))?;

        Ok(LoginOutcome { user, token })
    }

    async fn hash(&self, password: String) -> Result<String, ShopError> {
        let config = self.passwords.clone();
        tokio::task::spawn_blocking(move || hash_password_with_config(&password, &config))
            .await
            .map_err(|e| ShopError::Other(anyhow::anyhow!("Password hashing task failed: {e}")))?
            .map_err(|e| ShopError::Other(e.into()))
    }
}

/// Trimmed, non-empty value of a required field
fn required(field: &str, value: Option<&str>) -> Result<String, ShopError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ShopError::MissingFields(field.to_string()))
}

/// A required field passed through untouched; blank still counts as missing
fn present(field: &str, value: Option<String>) -> Result<String, ShopError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ShopError::MissingFields(field.to_string()))
}

/// First human-readable message out of a validator error set
pub(crate) fn first_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid input".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::verify_token;
    use shop_core::MemoryStore;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryStore::new()),
            TokenConfig::new("service-test-secret-service-test-secret", 3600),
            PasswordConfig {
                memory_cost: 1024,
                time_cost: 1,
                parallelism: 1,
            },
        )
    }

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            name: None,
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service();

        let user = service
            .register(register_request("alice@example.com", "123456"))
            .await
            .unwrap();
        assert_eq!(user.email, "alice@example.com");

        let outcome = service
            .login(login_request("alice@example.com", "123456"))
            .await
            .unwrap();
        assert_eq!(outcome.user.id, user.id);

        let claims = verify_token(&service.tokens, &outcome.token).unwrap();
        assert_eq!(claims.user_id(), Some(user.id));
        assert_eq!(claims.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_password_is_hashed() {
        let users = Arc::new(MemoryStore::new());
        let service = AuthService::new(
            users.clone(),
            TokenConfig::new("service-test-secret-service-test-secret", 3600),
            service().passwords,
        );

        service
            .register(register_request("bob@example.com", "654321"))
            .await
            .unwrap();

        let stored = users.find_by_email("bob@example.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "654321");
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_missing_fields() {
        let service = service();

        let err = service
            .register(RegisterRequest {
                email: Some("a@example.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::MissingFields(_)));

        let err = service
            .register(register_request("   ", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::MissingFields(_)));
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let service = service();
        service
            .register(register_request("carol@example.com", "abcdef"))
            .await
            .unwrap();

        let err = service
            .register(register_request("carol@example.com", "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::DuplicateUser));
    }

    #[tokio::test]
    async fn test_login_failures() {
        let service = service();
        service
            .register(register_request("dave@example.com", "right"))
            .await
            .unwrap();

        assert!(matches!(
            service.login(login_request("nobody@example.com", "x")).await,
            Err(ShopError::UserNotFound)
        ));
        assert!(matches!(
            service.login(login_request("dave@example.com", "wrong")).await,
            Err(ShopError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login(LoginRequest::default()).await,
            Err(ShopError::MissingFields(_))
        ));
    }

    #[tokio::test]
    async fn test_password_whitespace_is_kept() {
        let service = service();
        service
            .register(register_request("erin@example.com", " pw "))
            .await
            .unwrap();

        assert!(matches!(
            service.login(login_request("erin@example.com", "pw")).await,
            Err(ShopError::InvalidCredentials)
        ));
        assert!(service
            .login(login_request("erin@example.com", " pw "))
            .await
            .is_ok());

        let err = service
            .register(register_request("frank@example.com", "   "))
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::MissingFields(_)));
    }

    #[tokio::test]
    async fn test_plaintext_hash_cannot_log_in() {
        let users = Arc::new(MemoryStore::new());
        users
            .create_user(NewUser {
                email: "legacy@example.com".to_string(),
                password_hash: "123456".to_string(),
                name: None,
            })
            .await
            .unwrap();
        let service = AuthService::new(
            users,
            TokenConfig::new("service-test-secret-service-test-secret", 3600),
            PasswordConfig::default(),
        );

        assert!(matches!(
            service.login(login_request("legacy@example.com", "123456")).await,
            Err(ShopError::InvalidCredentials)
        ));
    }
}
