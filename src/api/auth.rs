//! Account endpoints under `/api/auth`.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{ApiClient, ApiError};
use crate::auth::{Tokens, User};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(flatten)]
    tokens: Tokens,
    user: User,
}

/// Server acknowledgement carrying a human-readable message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "github" => Ok(Self::Github),
            other => Err(format!("unknown OAuth provider {other:?}; expected google or github")),
        }
    }
}

impl ApiClient {
    /// Sign in with email and password, persisting the issued tokens.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for bad credentials, or any transport
    /// or storage failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        self.auth().set_loading(true);
        let result = self
            .post::<LoginResponse>("/api/auth/login", json!({ "email": email, "password": password }))
            .await;
        self.auth().set_loading(false);

        let response = result?;
        self.auth().login(&response.tokens, response.user.clone())?;
        Ok(response.user)
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Ack, ApiError> {
        self.post("/api/auth/register", json!({ "name": name, "email": email, "password": password }))
            .await
    }

    /// # Errors
    ///
    /// Returns an error for an invalid or expired verification token.
    pub async fn verify_email(&self, token: &str) -> Result<Ack, ApiError> {
        self.post("/api/auth/verify-email", json!({ "token": token })).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the request.
    pub async fn forgot_password(&self, email: &str) -> Result<Ack, ApiError> {
        self.post("/api/auth/forgot-password", json!({ "email": email })).await
    }

    /// # Errors
    ///
    /// Returns an error for an invalid or expired reset token.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<Ack, ApiError> {
        self.post("/api/auth/reset-password", json!({ "token": token, "password": password }))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the session is invalid or the current password is wrong.
    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<Ack, ApiError> {
        self.put(
            "/api/auth/password",
            json!({ "currentPassword": current_password, "newPassword": new_password }),
        )
        .await
    }

    /// Fetch the signed-in user and publish it on the auth store.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the session cannot be refreshed.
    pub async fn profile(&self) -> Result<User, ApiError> {
        let user: User = self.get("/api/auth/profile").await?;
        self.auth().set_user(Some(user.clone()));
        Ok(user)
    }

    /// Clear the local session. Tokens are not revoked server-side.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be written.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.auth().logout()?;
        info!("local session cleared");
        Ok(())
    }

    /// Browser URL that starts the OAuth flow for `provider`.
    #[must_use]
    pub fn oauth_url(&self, provider: OAuthProvider) -> String {
        self.url(&format!("/api/auth/{provider}"))
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;
