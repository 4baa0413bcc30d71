// ============================================================================
// LocalHub Core - Authentication Service
// File: crates/localhub-core/src/services/auth_service.rs
// ============================================================================
//! Registration, login and token refresh

use std::sync::Arc;

use localhub_security::{JwtService, PasswordPolicy, PasswordService, TokenPair};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{LoginUser, RegisterUser, User};
use crate::error::DomainError;
use crate::repositories::UserRepository;
use crate::validation::Validated;

/// Successful login: the user plus a fresh token pair.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt: Arc<JwtService>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt: Arc<JwtService>) -> Self {
        Self { users, jwt }
    }

    pub async fn register(&self, input: RegisterUser) -> Result<User, DomainError> {
        info!("Registration attempt for email: {}", localhub_shared::utils::mask_email(&input.email));

        // 1. Field rules, then password strength against the user's own details
        let mut errors = input.field_errors();
        if !errors.contains("password") {
            if let Err(e) = PasswordPolicy::check(&input.password, &[&input.name, &input.email]) {
                errors.add("password", e.to_string());
            }
        }
        errors.into_result()?;

        // 2. Email must be unused
        if self.users.find_by_email(&input.email).await?.is_some() {
            warn!("Registration failed: email already registered");
            return Err(DomainError::Conflict("Email is already registered".into()));
        }

        // 3. Hash and store
        let hash = PasswordService::hash(&input.password)
            .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;
        let user = self.users.create(&User::new(&input.name, &input.email, hash)).await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, input: LoginUser) -> Result<AuthSession, DomainError> {
        input.check()?;

        let user = self.users.find_by_email(&input.email).await?.ok_or_else(|| {
            warn!("Login failed: unknown email");
            DomainError::InvalidCredentials
        })?;

        let valid = PasswordService::verify(&input.password, &user.password_hash)
            .map_err(|_| DomainError::InvalidCredentials)?;
        if !valid {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(DomainError::InvalidCredentials);
        }

        if !user.can_login() {
            warn!(user_id = %user.id, "Login failed: user inactive");
            return Err(DomainError::UserNotActive);
        }

        let tokens = self.issue(&user.id)?;

        let mut user = user;
        user.record_login();
        if let Err(e) = self.users.update(&user).await {
            // Login still succeeds; only the timestamp is lost.
            error!(user_id = %user.id, "Failed to record last login: {}", e);
        }

        info!(user_id = %user.id, "Login successful");
        Ok(AuthSession { user, tokens })
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, DomainError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|e| DomainError::TokenError(e.to_string()))?;
        let user_id = claims.user_id().map_err(|e| DomainError::TokenError(e.to_string()))?;

        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| DomainError::TokenError("user no longer exists".into()))?;
        if !user.can_login() {
            return Err(DomainError::UserNotActive);
        }
        self.issue(&user.id)
    }

    pub async fn me(&self, user_id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", user_id))
    }

    fn issue(&self, user_id: &Uuid) -> Result<TokenPair, DomainError> {
        self.jwt
            .generate_pair(user_id)
            .map_err(|e| DomainError::TokenError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MockUserRepository;

    const PASSWORD: &str = "correct-horse-battery-staple";

    fn jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new("test-secret-with-enough-length", 900, 3600))
    }

    fn stored_user() -> User {
        let hash = PasswordService::hash(PASSWORD).unwrap();
        User::new("Jane Doe", "jane@example.com", hash)
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(Some(stored_user())));
        users.expect_create().never();

        let service = AuthService::new(Arc::new(users), jwt());
        let result = service
            .register(RegisterUser {
                name: "Jane Doe".into(),
                email: "jane@example.com".into(),
                password: PASSWORD.into(),
            })
            .await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_reports_weak_password() {
        let users = MockUserRepository::new();
        let service = AuthService::new(Arc::new(users), jwt());
        let result = service
            .register(RegisterUser {
                name: "J".into(),
                email: "not-an-email".into(),
                password: "password".into(),
            })
            .await;
        match result {
            Err(DomainError::Validation(errors)) => {
                assert!(errors.contains("name"));
                assert!(errors.contains("email"));
                assert!(errors.contains("password"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_issues_tokens() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(Some(stored_user())));
        users.expect_update().returning(|u| Ok(u.clone()));

        let jwt = jwt();
        let service = AuthService::new(Arc::new(users), jwt.clone());
        let session = service
            .login(LoginUser { email: "jane@example.com".into(), password: PASSWORD.into() })
            .await
            .unwrap();

        assert!(session.user.last_login_at.is_some());
        assert!(jwt.validate_access_token(&session.tokens.access_token).is_ok());
        assert!(jwt.validate_access_token(&session.tokens.refresh_token).is_err());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|email| Ok((email == "jane@example.com").then(stored_user)));
        let service = AuthService::new(Arc::new(users), jwt());

        let wrong_password = service
            .login(LoginUser { email: "jane@example.com".into(), password: "nope-nope".into() })
            .await;
        let unknown = service
            .login(LoginUser { email: "who@example.com".into(), password: PASSWORD.into() })
            .await;
        assert!(matches!(wrong_password, Err(DomainError::InvalidCredentials)));
        assert!(matches!(unknown, Err(DomainError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let user = stored_user();
        let id = user.id;
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));

        let jwt = jwt();
        let service = AuthService::new(Arc::new(users), jwt.clone());
        let access = jwt.generate_access_token(&id).unwrap();
        let refresh = jwt.generate_refresh_token(&id).unwrap();

        assert!(matches!(service.refresh(&access).await, Err(DomainError::TokenError(_))));
        assert!(service.refresh(&refresh).await.is_ok());
    }
}
