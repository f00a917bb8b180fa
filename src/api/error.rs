//! API error taxonomy.
//!
//! Non-success responses are classified by status code, and for 400 responses
//! by the server's message text. Every variant reduces to a user-facing string
//! via [`ApiError::user_message`].

use std::fmt;

use survey::ModelError;

use crate::storage::StorageError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShareConflict {
    AlreadyPending,
    AlreadyAccepted,
    AlreadyOwner,
}

impl ShareConflict {
    /// Classify a 400 message. Matching is case-insensitive on substrings.
    #[must_use]
    pub fn from_message(message: &str) -> Option<Self> {
        let lower = message.to_lowercase();
        if lower.contains("already pending") {
            Some(Self::AlreadyPending)
        } else if lower.contains("already accepted") {
            Some(Self::AlreadyAccepted)
        } else if lower.contains("owner") {
            Some(Self::AlreadyOwner)
        } else {
            None
        }
    }
}

impl fmt::Display for ShareConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AlreadyPending => "share already pending",
            Self::AlreadyAccepted => "share already accepted",
            Self::AlreadyOwner => "user is the survey owner",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("share conflict: {0}")]
    ShareConflict(ShareConflict),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("no pending share with id {0}")]
    UnknownShare(String),
    #[error("no user with email {0}")]
    UnknownInvitee(String),
    #[error("invalid path segment {0:?}")]
    InvalidPathSegment(String),
}

impl ApiError {
    /// Classify a non-success response from its status and raw body.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = server_message(body);
        match status {
            404 => Self::NotFound(message),
            401 => Self::Unauthorized(message),
            400 => match ShareConflict::from_message(&message) {
                Some(conflict) => Self::ShareConflict(conflict),
                None => Self::Status { status, message },
            },
            _ => Self::Status { status, message },
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// One-line message suitable for an alert banner.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(message) if !message.is_empty() => message.clone(),
            Self::NotFound(_) => "The requested item was not found.".to_owned(),
            Self::UnknownInvitee(_) => "User not found. Check the email address and try again.".to_owned(),
            Self::ShareConflict(ShareConflict::AlreadyPending) => {
                "This survey has already been shared with that user and is awaiting a response.".to_owned()
            }
            Self::ShareConflict(ShareConflict::AlreadyAccepted) => {
                "That user already has access to this survey.".to_owned()
            }
            Self::ShareConflict(ShareConflict::AlreadyOwner) => {
                "You cannot share a survey with its owner.".to_owned()
            }
            Self::Unauthorized(_) => "Your session has expired. Please log in again.".to_owned(),
            Self::Status { message, .. } if !message.is_empty() => message.clone(),
            Self::Status { status, .. } => format!("Request failed with status {status}. Please try again."),
            Self::Transport(_) => "Could not reach the server. Please try again.".to_owned(),
            Self::Decode { .. } => "The server sent an unexpected response.".to_owned(),
            Self::Storage(_) => "Could not access saved credentials.".to_owned(),
            Self::Model(ModelError::ShareAlreadyResolved(status)) => {
                format!("This share has already been {status}.")
            }
            Self::Model(e) => e.to_string(),
            Self::UnknownShare(_) => "That share is no longer pending.".to_owned(),
            Self::InvalidPathSegment(segment) => format!("\"{segment}\" is not a valid identifier."),
        }
    }
}

/// Pull `message` (or `error`) out of a JSON error body, else the trimmed text.
pub(crate) fn server_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(text) = value.get(key).and_then(serde_json::Value::as_str) {
                return text.trim().to_owned();
            }
        }
    }
    body.trim().to_owned()
}

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;
