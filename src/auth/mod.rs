pub mod extractors;
pub mod middleware;
pub mod password;
pub mod session;
pub mod token;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::models::user::normalize_email;
use crate::models::User;
use crate::store::StoreError;

// Re-export necessary items
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password, PasswordHasher};
pub use session::{bearer_token, AuthenticatedPrincipal, Authenticator};
pub use token::{Claims, TokenKeys};

/// Failure modes of the session layer.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The presented credential does not resolve to a live session. The cause
    /// is deliberately not carried.
    #[error("unauthenticated")]
    Unauthenticated,
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The token could not be signed.
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Must be a valid email format. Stored lower-cased.
    #[validate(email)]
    pub email: String,
    /// At least 7 characters; bcrypt ignores anything past 72 bytes.
    #[validate(length(min = 7, max = 72))]
    pub password: String,
    #[validate(range(min = 0, max = 150))]
    pub age: Option<i32>,
}

impl RegisterRequest {
    /// Trims the name and normalizes the email before validation.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            ..self
        }
    }
}

/// Fields a user may change on their own profile. Every field is optional;
/// unknown fields are rejected before this type is built.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 7, max = 72))]
    pub password: Option<String>,
    #[validate(range(min = 0, max = 150))]
    pub age: Option<i32>,
}

impl UpdateProfileRequest {
    pub const FIELDS: &'static [&'static str] = &["name", "email", "password", "age"];

    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|name| name.trim().to_string()),
            email: self.email.as_deref().map(normalize_email),
            ..self
        }
    }
}

/// Response structure after successful authentication (login or registration).
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    /// The bearer token for the new session.
    pub token: String,
}
