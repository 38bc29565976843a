use std::sync::Arc;

use log::{debug, info};
use uuid::Uuid;

use super::token::TokenKeys;
use super::AuthError;
use crate::config::Config;
use crate::models::User;
use crate::store::Store;

/// The identity resolved from a valid bearer token, together with the exact
/// token string that was presented (logout needs it to know which session to
/// end).
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal {
    pub user: User,
    pub token: String,
}

impl AuthenticatedPrincipal {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}

/// Issues, validates and revokes session tokens.
///
/// A token is accepted only when its signature verifies **and** it is still
/// present in the owning user's issued-token list.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn Store>,
    keys: TokenKeys,
}

impl Authenticator {
    pub fn new(store: Arc<dyn Store>, keys: TokenKeys) -> Self {
        Self { store, keys }
    }

    pub fn from_config(store: Arc<dyn Store>, config: &Config) -> Self {
        Self::new(store, TokenKeys::from_config(config))
    }

    /// Resolves an `Authorization` header value to a principal.
    ///
    /// Accepts `"Bearer <token>"` or a bare token. Every rejection, whatever
    /// its cause, is `AuthError::Unauthenticated`. Never mutates the user.
    pub async fn authenticate(
        &self,
        header_value: Option<&str>,
    ) -> Result<AuthenticatedPrincipal, AuthError> {
        let token = bearer_token(header_value.unwrap_or_default());
        if token.is_empty() {
            return Err(AuthError::Unauthenticated);
        }

        let claims = self.keys.verify(token).map_err(|e| {
            debug!("rejected token: {}", e);
            AuthError::Unauthenticated
        })?;

        let user = self
            .store
            .find_user_with_token(claims.sub, token)
            .await?
            .ok_or_else(|| {
                debug!("token for user {} is not in its issued list", claims.sub);
                AuthError::Unauthenticated
            })?;

        Ok(AuthenticatedPrincipal {
            user,
            token: token.to_string(),
        })
    }

    /// Signs a new token for `user_id` and records it in the user's list.
    ///
    /// The token is only returned once it has been stored; if storing fails
    /// the error is returned instead and nothing was recorded.
    pub async fn issue(&self, user_id: Uuid) -> Result<String, AuthError> {
        let token = self
            .keys
            .sign(user_id)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        self.store.add_token(user_id, &token).await?;
        debug!("issued session token for user {}", user_id);
        Ok(token)
    }

    /// Ends the session the principal authenticated with. Removing a token
    /// that is already gone is a no-op.
    pub async fn revoke_one(&self, principal: &AuthenticatedPrincipal) -> Result<(), AuthError> {
        let removed = self
            .store
            .remove_token(principal.user.id, &principal.token)
            .await?;
        if removed {
            info!("user {} logged out one session", principal.user.id);
        }
        Ok(())
    }

    /// Ends every session of `user`.
    pub async fn revoke_all(&self, user: &User) -> Result<(), AuthError> {
        let removed = self.store.clear_tokens(user.id).await?;
        info!("user {} logged out of {} session(s)", user.id, removed);
        Ok(())
    }
}

/// Strips a leading `"Bearer "`; anything else is taken as the raw token.
pub fn bearer_token(header_value: &str) -> &str {
    header_value
        .strip_prefix("Bearer ")
        .unwrap_or(header_value)
}
