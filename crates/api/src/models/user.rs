//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use executive_core::{Email, UserId};

use super::{ValidationError, require_text};

/// Password length bounds, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 3;
pub const MAX_PASSWORD_LENGTH: usize = 130;

/// A registered user.
///
/// The password hash is loaded with the row but never serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A registration that passed validation. The password is still plaintext.
#[derive(Debug)]
pub struct ValidRegistration {
    pub name: String,
    pub email: Email,
    pub password: String,
}

impl RegisterPayload {
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank name, a malformed email, or a
    /// password outside 3..=130 characters.
    pub fn validate(self) -> Result<ValidRegistration, ValidationError> {
        let name = require_text("name", &self.name)?;
        let email = Email::parse(&self.email)?;
        let len = self.password.chars().count();
        if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&len) {
            return Err(ValidationError(format!(
                "password must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH} characters"
            )));
        }
        Ok(ValidRegistration {
            name,
            email,
            password: self.password,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginPayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginPayload {
    /// # Errors
    ///
    /// Returns `ValidationError` for a malformed email or an empty password.
    pub fn validate(&self) -> Result<Email, ValidationError> {
        let email = Email::parse(&self.email)?;
        if self.password.is_empty() {
            return Err(ValidationError::new("password is required"));
        }
        Ok(email)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn payload(name: &str, email: &str, password: &str) -> RegisterPayload {
        RegisterPayload {
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
        }
    }

    #[test]
    fn test_register_validation() {
        let ok = payload(" Ada ", "Ada@Example.com", "abc").validate().unwrap();
        assert_eq!(ok.name, "Ada");
        assert_eq!(ok.email.as_str(), "ada@example.com");

        assert!(payload("", "a@example.com", "abcdef").validate().is_err());
        assert!(payload("Ada", "nope", "abcdef").validate().is_err());
        assert!(payload("Ada", "a@example.com", "ab").validate().is_err());
        assert!(
            payload("Ada", "a@example.com", &"x".repeat(131))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: UserId::generate(),
            name: "Ada".into(),
            email: Email::parse("ada@example.com").unwrap(),
            password_hash: "$argon2id$secret".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_login_requires_password() {
        let login = LoginPayload {
            email: "a@example.com".into(),
            password: String::new(),
        };
        assert!(login.validate().is_err());
    }
}
