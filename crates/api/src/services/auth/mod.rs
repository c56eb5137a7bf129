//! Authentication service.
//!
//! Password registration and login. A successful login yields a signed
//! bearer token (see [`token`]).

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenError, TokenSigner};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;

use executive_core::UserId;

use crate::db::{RepositoryError, UserStore};
use crate::models::{LoginPayload, RegisterPayload, User};

/// Authentication service.
///
/// Borrowing the store keeps it usable with both `PgStore` and the
/// in-memory store behind `dyn Store`.
pub struct AuthService<'a, S: UserStore + ?Sized> {
    users: &'a S,
    tokens: &'a TokenSigner,
}

impl<'a, S: UserStore + ?Sized> AuthService<'a, S> {
    #[must_use]
    pub const fn new(users: &'a S, tokens: &'a TokenSigner) -> Self {
        Self { users, tokens }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Invalid` if the payload fails validation.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, payload: RegisterPayload) -> Result<User, AuthError> {
        let input = payload.validate()?;
        let password_hash = hash_password(&input.password)?;
        let now = Utc::now();

        let user = User {
            id: UserId::generate(),
            name: input.name,
            email: input.email,
            password_hash,
            created_at: now,
            updated_at: now,
        };

        self.users.create_user(&user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Check credentials and issue an access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, payload: &LoginPayload) -> Result<String, AuthError> {
        let email = payload.validate()?;

        let user = self
            .users
            .user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&payload.password, &user.password_hash)?;

        Ok(self.tokens.issue(user.id)?)
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::db::MemoryStore;

    fn signer() -> TokenSigner {
        TokenSigner::new(
            SecretString::from("k3y-mat3rial-for-unit-tests-0123456789"),
            Duration::from_secs(60),
        )
    }

    fn register_payload(email: &str, password: &str) -> RegisterPayload {
        RegisterPayload {
            name: "Wanjiru".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &hash).is_ok());
        assert!(matches!(
            verify_password("hunter3", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let tokens = signer();
        let auth = AuthService::new(&store, &tokens);

        let user = auth
            .register(register_payload("W@Example.com", "pass123"))
            .await
            .unwrap();
        assert_eq!(user.email.as_str(), "w@example.com");

        let token = auth
            .login(&LoginPayload {
                email: "w@example.com".into(),
                password: "pass123".into(),
            })
            .await
            .unwrap();
        assert_eq!(tokens.verify(&token).unwrap().user_id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let store = MemoryStore::new();
        let tokens = signer();
        let auth = AuthService::new(&store, &tokens);

        auth.register(register_payload("dup@example.com", "abc"))
            .await
            .unwrap();
        assert!(matches!(
            auth.register(register_payload("DUP@example.com", "abcd")).await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_login_unknown_user_and_wrong_password() {
        let store = MemoryStore::new();
        let tokens = signer();
        let auth = AuthService::new(&store, &tokens);
        auth.register(register_payload("a@example.com", "right"))
            .await
            .unwrap();

        for (email, password) in [("b@example.com", "right"), ("a@example.com", "wrong")] {
            let result = auth
                .login(&LoginPayload {
                    email: email.into(),
                    password: password.into(),
                })
                .await;
            assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        }
    }
}
