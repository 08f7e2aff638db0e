//! Session lifecycle: login, refresh-token rotation, logout.

use std::sync::Arc;

use validator::{ValidationError, ValidationErrors};

use crate::error::{Result, ServerError};
use crate::token::{TokenManager, TokenPair};
use crate::user::{CredentialStore, User};

/// Why a refresh attempt was rejected.
///
/// Every kind collapses to 401 at the HTTP boundary; the distinction only
/// exists for callers of [`SessionManager::refresh`] itself.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no refresh token presented")]
    MissingToken,
    #[error("refresh token signature or expiry is invalid")]
    InvalidToken,
    #[error("refresh token subject no longer exists")]
    UnknownSubject,
    #[error("refresh token does not equal the stored value")]
    TokenMismatch,
}

fn password_confirmation_mismatch() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "confirmPassword",
        ValidationError::new("confirm_password")
            .with_message("New password and confirmation do not match.".into()),
    );
    errors
}

/// Orchestrates the account session state machine.
///
/// The only component that reads or writes the stored refresh token. An
/// account is either logged out (no stored token) or active (exactly one
/// stored token); each successful login or refresh stores a new token,
/// invalidating the previous one.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    token: TokenManager,
}

impl SessionManager {
    /// Create a new [`SessionManager`].
    pub fn new(store: Arc<dyn CredentialStore>, token: TokenManager) -> Self {
        Self { store, token }
    }

    /// Verify credentials and open a session.
    ///
    /// Returns the sanitized account plus the freshly issued pair; the
    /// refresh token is already persisted when this returns.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<(User, TokenPair)> {
        let Some(user) =
            self.store.find_by_email_or_username(identifier).await?
        else {
            return Err(ServerError::NotFound);
        };

        if !self.store.verify_password(&user, password) {
            return Err(ServerError::InvalidCredentials);
        }

        let pair = self.token.issue_pair(&user)?;
        // Persisting the refresh token is the single commit point.
        self.store
            .set_refresh_token(&user.id, Some(&pair.refresh_token))
            .await?;

        Ok((user, pair))
    }

    /// Exchange a refresh token for a new pair, rotating the stored value.
    pub async fn refresh(
        &self,
        presented: Option<&str>,
    ) -> Result<(User, TokenPair)> {
        let presented = presented
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::MissingToken)?;

        let claims = self
            .token
            .decode_refresh(presented)
            .map_err(|_| SessionError::InvalidToken)?;

        let user = self
            .store
            .find_by_id(&claims.sub)
            .await?
            .ok_or(SessionError::UnknownSubject)?;

        // Signature validity is necessary but not sufficient: the presented
        // token must equal the stored value byte for byte, so a rotated-out
        // token is dead even before it expires.
        if user.refresh_token.as_deref() != Some(presented) {
            return Err(SessionError::TokenMismatch.into());
        }

        let pair = self.token.issue_pair(&user)?;
        self.store
            .set_refresh_token(&user.id, Some(&pair.refresh_token))
            .await?;

        Ok((user, pair))
    }

    /// Close the session by clearing the stored refresh token.
    ///
    /// Idempotent: logging out an already logged-out account is not an
    /// error.
    pub async fn logout(&self, user: &User) -> Result<()> {
        self.store.set_refresh_token(&user.id, None).await
    }

    /// Replace the account password after re-verifying the current one.
    ///
    /// The stored refresh token is left untouched; nothing is written when
    /// the confirmation does not match.
    pub async fn change_password(
        &self,
        user: &User,
        old: &str,
        new: &str,
        confirm: &str,
    ) -> Result<()> {
        if new != confirm {
            return Err(password_confirmation_mismatch().into());
        }

        if !self.store.verify_password(user, old) {
            return Err(ServerError::InvalidCredentials);
        }

        self.store.update_password(&user.id, new).await
    }
}
