//! Shared auth state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! One [`AuthStore`] is built in `main` and shared as `Arc<AuthStore>` by the
//! API client and any long-lived task. Tokens live in a [`Storage`] backend so
//! they outlive the process; the current user and loading flag are published on
//! a `watch` channel so subscribers observe login and logout.
//!
//! ERROR HANDLING
//! ==============
//! Storage failures propagate to the caller. `logout` clears the in-memory user
//! before touching storage, so a failed write never leaves a stale user
//! published.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use crate::storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, Storage, StorageError};

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

/// The authenticated user as returned by `/api/auth/profile` and `/api/auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_verified: bool,
}

/// Token pair issued by login and refresh. Refresh may omit a new refresh token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
}

pub struct AuthStore {
    storage: Arc<dyn Storage>,
    state: watch::Sender<AuthState>,
}

impl AuthStore {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self { storage, state }
    }

    /// Receiver that observes every state change from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn set_loading(&self, loading: bool) {
        self.state.send_if_modified(|state| {
            let changed = state.loading != loading;
            state.loading = loading;
            changed
        });
    }

    pub fn set_user(&self, user: Option<User>) {
        self.state.send_modify(|state| state.user = user);
    }

    /// # Errors
    ///
    /// Returns an error if the token store cannot be read.
    pub fn access_token(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(ACCESS_TOKEN_KEY)
    }

    /// # Errors
    ///
    /// Returns an error if the token store cannot be read.
    pub fn refresh_token(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(REFRESH_TOKEN_KEY)
    }

    /// Whether an access token is stored. Unreadable storage counts as signed out.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.access_token().is_ok_and(|token| token.is_some())
    }

    /// Persist a token pair. A missing refresh token keeps the stored one.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be written.
    pub fn store_tokens(&self, tokens: &Tokens) -> Result<(), StorageError> {
        self.storage.set(ACCESS_TOKEN_KEY, &tokens.access_token)?;
        if let Some(refresh) = &tokens.refresh_token {
            self.storage.set(REFRESH_TOKEN_KEY, refresh)?;
        }
        Ok(())
    }

    /// Persist tokens and publish the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be written; the published
    /// state is left unchanged in that case.
    pub fn login(&self, tokens: &Tokens, user: User) -> Result<(), StorageError> {
        self.store_tokens(tokens)?;
        info!(user_id = %user.id, "signed in");
        self.state.send_replace(AuthState { user: Some(user), loading: false });
        Ok(())
    }

    /// Clear tokens and the current user.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be written.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.state.send_replace(AuthState::default());
        self.storage.remove(ACCESS_TOKEN_KEY)?;
        self.storage.remove(REFRESH_TOKEN_KEY)?;
        info!("signed out");
        Ok(())
    }
}
