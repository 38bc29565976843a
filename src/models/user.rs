use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One entry of a user's issued-token list.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct IssuedToken {
    pub token: String,
}

/// A registered account.
///
/// The password hash and the issued-token list are skipped by serde, so any
/// response built from a `User` only exposes the profile fields. The avatar
/// lives next to the user in the store but is never loaded into this struct.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub age: i32,
    /// Currently valid session tokens, oldest first.
    #[serde(skip)]
    #[sqlx(skip)]
    pub tokens: Vec<IssuedToken>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Builds a fresh record. `email` is expected to be normalized already and
    /// `password_hash` to be a bcrypt hash, never plaintext.
    pub fn new(name: String, email: String, password_hash: String, age: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            age,
            tokens: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_token(&self, token: &str) -> bool {
        self.tokens.iter().any(|issued| issued.token == token)
    }
}

/// Field-level profile changes. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub age: Option<i32>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.age.is_none()
    }
}

/// Lower-cases and trims an email so uniqueness is case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
