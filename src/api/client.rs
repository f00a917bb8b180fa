//! Bearer-token HTTP client for the survey backend.
//!
//! DESIGN
//! ======
//! Every request reads the current access token from the shared
//! [`AuthStore`] and sends it as `Authorization: Bearer <token>`. When the
//! backend answers 401, the client posts the stored refresh token to
//! `/api/auth/refresh-token` once and replays the original request once. A
//! rejected refresh signs the user out.
//!
//! ERROR HANDLING
//! ==============
//! Non-success responses become [`ApiError`] via
//! [`ApiError::from_response`] and are logged at `warn` with the path and
//! status before returning.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::error::ApiError;
use crate::auth::{AuthStore, Tokens};
use crate::config::Config;

pub(crate) const REFRESH_PATH: &str = "/api/auth/refresh-token";

/// Paths where a 401 means bad credentials rather than an expired session.
const NO_REFRESH_PATHS: &[&str] = &[REFRESH_PATH, "/api/auth/login", "/api/auth/register"];

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<AuthStore>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config, auth: Arc<AuthStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()?;
        Ok(Self { http, base_url: config.base_url.clone(), auth })
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<AuthStore> {
        &self.auth
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, ApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub(crate) async fn put<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, ApiError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let mut response = self.send(method.clone(), path, body.as_ref()).await?;
        if response.status() == StatusCode::UNAUTHORIZED && !NO_REFRESH_PATHS.contains(&path) {
            debug!(path, "access token rejected; refreshing");
            if self.refresh_session().await? {
                response = self.send(method, path, body.as_ref()).await?;
            }
        }
        decode(path, response).await
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<reqwest::Response, ApiError> {
        let mut request = self.http.request(method, self.url(path));
        if let Some(token) = self.auth.access_token()? {
            request = request.bearer_auth(token);
        }
        if let Some(json) = body {
            request = request.json(json);
        }
        Ok(request.send().await?)
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Returns `Ok(false)` when there is no refresh token or the backend
    /// rejects it; the session is cleared in both cases.
    ///
    /// # Errors
    ///
    /// Returns an error on transport, decode or storage failure.
    pub async fn refresh_session(&self) -> Result<bool, ApiError> {
        let Some(refresh_token) = self.auth.refresh_token()? else {
            warn!("no refresh token stored; signing out");
            self.auth.logout()?;
            return Ok(false);
        };

        let response = self
            .http
            .post(self.url(REFRESH_PATH))
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await?;
        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "token refresh rejected; signing out");
            self.auth.logout()?;
            return Ok(false);
        }

        let tokens: Tokens = decode(REFRESH_PATH, response).await?;
        self.auth.store_tokens(&tokens)?;
        info!("access token refreshed");
        Ok(true)
    }
}

/// Absolute path built from `segments`, each percent-encoded so an id
/// containing `/`, `?` or `#` stays a single segment.
///
/// # Errors
///
/// Returns [`ApiError::InvalidPathSegment`] for an empty, `.` or `..`
/// segment, which would address a different endpoint.
pub(crate) fn endpoint(segments: &[&str]) -> Result<String, ApiError> {
    if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
        return Err(ApiError::InvalidPathSegment((*bad).to_owned()));
    }
    let invalid = || ApiError::InvalidPathSegment(segments.join("/"));
    let mut url = Url::parse("http://localhost/").map_err(|_| invalid())?;
    url.path_segments_mut().map_err(|()| invalid())?.clear().extend(segments);
    Ok(url.path().to_owned())
}

async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        let error = ApiError::from_response(status.as_u16(), &text);
        warn!(path, status = status.as_u16(), error = %error, "api request failed");
        return Err(error);
    }
    let text = if text.trim().is_empty() { "null" } else { text.as_str() };
    serde_json::from_str(text).map_err(|source| ApiError::Decode { path: path.to_owned(), source })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;
