//! HTTP API client and typed endpoint wrappers.

mod auth;
mod client;
mod error;
mod shares;
mod surveys;

#[cfg(test)]
pub(crate) mod fake_backend;

pub use auth::{Ack, OAuthProvider};
pub use client::ApiClient;
pub use error::{ApiError, ShareConflict};
