//!
//! # Account flows
//!
//! Registration, login, profile updates and self-deletion. Everything here
//! works on the [`Store`] trait and the session [`Authenticator`], so the HTTP
//! handlers stay thin.

use std::sync::Arc;

use log::{info, warn};
use validator::Validate;

use crate::auth::{
    AuthResponse, Authenticator, LoginRequest, PasswordHasher, RegisterRequest,
    UpdateProfileRequest,
};
use crate::email::{Mailer, Notifier};
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{User, UserChanges};
use crate::store::{Store, StoreError};

/// Answer for both an unknown email and a wrong password.
pub const LOGIN_FAILED_MESSAGE: &str = "Unable to login";
pub const EMAIL_TAKEN_MESSAGE: &str = "Email already registered";

#[derive(Clone)]
pub struct Accounts {
    store: Arc<dyn Store>,
    authenticator: Authenticator,
    hasher: PasswordHasher,
    notifier: Notifier,
    /// Checked against when no account matches a login, so an unknown email
    /// costs the same bcrypt work as a wrong password.
    dummy_hash: String,
}

impl Accounts {
    pub fn new(
        store: Arc<dyn Store>,
        authenticator: Authenticator,
        hasher: PasswordHasher,
        mailer: Arc<dyn Mailer>,
        mail_from: impl Into<String>,
    ) -> Self {
        let dummy_hash = hasher.hash("not-a-real-password").unwrap_or_else(|e| {
            warn!("could not prepare login dummy hash: {}", e);
            String::new()
        });
        Self {
            store,
            authenticator,
            hasher,
            notifier: Notifier::new(mailer, mail_from),
            dummy_hash,
        }
    }

    /// Creates the account, opens its first session and sends the welcome
    /// email.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        let request = request.normalized();
        request.validate()?;

        if self.store.find_user_by_email(&request.email).await?.is_some() {
            return Err(AppError::ValidationError(EMAIL_TAKEN_MESSAGE.into()));
        }

        let password_hash = self.hasher.hash(&request.password)?;
        let user = User::new(
            request.name,
            request.email,
            password_hash,
            request.age.unwrap_or(0),
        );
        let user = self.store.insert_user(&user).await.map_err(email_conflict)?;

        let token = match self.authenticator.issue(user.id).await {
            Ok(token) => token,
            Err(e) => {
                // Don't leave an account behind that nobody received a token for.
                if let Err(cleanup) = self.store.delete_user(user.id).await {
                    warn!("could not roll back user {}: {}", user.id, cleanup);
                }
                return Err(e.into());
            }
        };

        info!("registered user {}", user.id);
        self.notifier.welcome(&user.email, &user.name).await;

        Ok(AuthResponse { user, token })
    }

    /// Checks the credentials and opens a new session. Existing sessions stay
    /// valid.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        request
            .validate()
            .map_err(|_| AppError::BadRequest(LOGIN_FAILED_MESSAGE.into()))?;

        let email = normalize_email(&request.email);
        let user = match self.store.find_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                let _ = self.hasher.verify(&request.password, &self.dummy_hash);
                return Err(AppError::BadRequest(LOGIN_FAILED_MESSAGE.into()));
            }
        };

        if !self.hasher.verify(&request.password, &user.password_hash)? {
            return Err(AppError::BadRequest(LOGIN_FAILED_MESSAGE.into()));
        }

        let token = self.authenticator.issue(user.id).await?;
        info!("user {} logged in", user.id);
        Ok(AuthResponse { user, token })
    }

    /// Applies a field-level profile update. The password is re-hashed only
    /// when a new one is supplied; the session list is never touched.
    pub async fn update_profile(
        &self,
        user: &User,
        request: UpdateProfileRequest,
    ) -> Result<User, AppError> {
        let request = request.normalized();
        request.validate()?;

        if let Some(email) = &request.email {
            if let Some(owner) = self.store.find_user_by_email(email).await? {
                if owner.id != user.id {
                    return Err(AppError::ValidationError(EMAIL_TAKEN_MESSAGE.into()));
                }
            }
        }

        let password_hash = match &request.password {
            Some(password) => Some(self.hasher.hash(password)?),
            None => None,
        };

        let changes = UserChanges {
            name: request.name,
            email: request.email,
            password_hash,
            age: request.age,
        };
        if changes.is_empty() {
            return Ok(user.clone());
        }

        let updated = self
            .store
            .update_user(user.id, &changes)
            .await
            .map_err(email_conflict)?;
        info!("user {} updated their profile", user.id);
        Ok(updated)
    }

    /// Deletes every task the user owns, then the user itself (its sessions
    /// and avatar go with it), then sends the cancellation email.
    ///
    /// If deleting the user fails after the tasks are gone, the error is
    /// returned and the account is left without tasks; repeating the call
    /// finishes the job.
    pub async fn delete_account(&self, user: &User) -> Result<User, AppError> {
        let removed = self.store.delete_tasks_by_owner(user.id).await?;
        self.store.delete_user(user.id).await?;
        info!("deleted user {} and {} task(s)", user.id, removed);

        self.notifier.cancellation(&user.email, &user.name).await;
        Ok(user.clone())
    }
}

fn email_conflict(error: StoreError) -> AppError {
    match error {
        StoreError::Conflict(_) => AppError::ValidationError(EMAIL_TAKEN_MESSAGE.into()),
        other => other.into(),
    }
}
