//!
//! # Persistence
//!
//! The [`Store`] trait is the only way the rest of the crate touches shared
//! state. Token-list mutations are expressed as single-element operations
//! (`add_token`, `remove_token`, `clear_tokens`) so that two requests working
//! on the same user never overwrite each other's sessions.
//!
//! Two implementations ship: [`postgres::PgStore`] for the server and
//! [`memory::MemoryStore`] for tests and local experiments.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Avatar, Task, TaskFilter, TaskPatch, User, UserChanges};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated (e.g. duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),
    /// The record the operation targets does not exist.
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> StoreError {
        match error {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Persists a new user. Fails with `Conflict` if the email is taken.
    async fn insert_user(&self, user: &User) -> StoreResult<User>;

    /// Loads a user together with its issued-token list.
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Loads the user only if `token` is currently in its issued-token list.
    async fn find_user_with_token(&self, id: Uuid, token: &str) -> StoreResult<Option<User>>;

    /// Applies profile changes without touching the token list.
    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> StoreResult<User>;

    /// Removes the user, its tokens and its avatar. Tasks are not touched.
    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;

    /// Appends one token to the user's list. `NotFound` if the user is gone.
    async fn add_token(&self, user_id: Uuid, token: &str) -> StoreResult<()>;

    /// Removes one token. Returns whether it was present.
    async fn remove_token(&self, user_id: Uuid, token: &str) -> StoreResult<bool>;

    /// Removes every token of the user. Returns how many were removed.
    async fn clear_tokens(&self, user_id: Uuid) -> StoreResult<u64>;

    /// Sets or clears the avatar. `NotFound` if the user is gone.
    async fn set_avatar(&self, user_id: Uuid, avatar: Option<&Avatar>) -> StoreResult<()>;

    async fn find_avatar(&self, user_id: Uuid) -> StoreResult<Option<Avatar>>;

    async fn insert_task(&self, task: &Task) -> StoreResult<Task>;

    async fn list_tasks(&self, owner: Uuid, filter: &TaskFilter) -> StoreResult<Vec<Task>>;

    async fn find_task(&self, id: Uuid, owner: Uuid) -> StoreResult<Option<Task>>;

    async fn update_task(&self, id: Uuid, owner: Uuid, patch: &TaskPatch)
        -> StoreResult<Option<Task>>;

    async fn delete_task(&self, id: Uuid, owner: Uuid) -> StoreResult<Option<Task>>;

    /// Deletes every task owned by `owner`, returning the count.
    async fn delete_tasks_by_owner(&self, owner: Uuid) -> StoreResult<u64>;
}
