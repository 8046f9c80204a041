//! Account registration and credential checks.
//!
//! Passwords are stored as `salt$hexdigest` with a per-user UUID salt and
//! a SHA-256 digest. Credential failures are indistinguishable to the
//! caller (no user-enumeration via error messages).

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::database::Database;
use crate::error::{AntiphishError, Result};
use crate::models::{Role, User};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Maximum accepted display-name length.
pub const MAX_NAME_LEN: usize = 255;

/// Account service backed by the database.
pub struct AccountService {
    db: Arc<Database>,
}

impl AccountService {
    /// Create a new account service.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Register a new account. The username is derived from the email
    /// local part. Fails on invalid input or a duplicate email.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<User> {
        let email = email.trim().to_lowercase();
        validate_email(&email)?;
        validate_password(password)?;
        if let Some(name) = name {
            if name.is_empty() || name.len() > MAX_NAME_LEN {
                return Err(AntiphishError::Validation(format!(
                    "Name must be between 1 and {} characters",
                    MAX_NAME_LEN
                )));
            }
        }

        if self.db.get_user_by_email(&email).await?.is_some() {
            return Err(AntiphishError::Validation(
                "Email already registered".to_string(),
            ));
        }

        let username = email.split('@').next().unwrap_or(&email).to_string();
        let password_hash = hash_password(password);

        let user = self
            .db
            .create_user(&username, &email, &password_hash, name, Role::User)
            .await?;

        tracing::info!(user_id = user.id, "Account registered");
        Ok(user)
    }

    /// Check credentials. Returns the user on success, None for any
    /// unknown-email / wrong-password / disabled-account case.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.db.get_user_by_email(&email).await? else {
            return Ok(None);
        };

        if user.disabled || !verify_password(password, &user.password_hash) {
            return Ok(None);
        }

        Ok(Some(user))
    }
}

/// Hash a password with a fresh UUID salt: `salt$hex(sha256(salt || password))`.
pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!("{}${}", salt, digest(&salt, password))
}

/// Verify a password against a stored `salt$hexdigest` value.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    digest(salt, password) == expected
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash message content for storage alongside the message.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

fn validate_email(email: &str) -> Result<()> {
    let valid = email.len() >= 3
        && email.len() <= 255
        && email.contains('@')
        && !email.starts_with('@')
        && !email.ends_with('@')
        && !email.chars().any(char::is_whitespace);
    if valid {
        Ok(())
    } else {
        Err(AntiphishError::Validation(
            "Valid email is required".to_string(),
        ))
    }
}

fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AntiphishError::Validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
