//! Pending-share inbox.
//!
//! DESIGN
//! ======
//! The inbox holds the last fetched list of pending shares. Accept and reject
//! send the decision to the backend first and only then drop the share
//! locally, so a failed call leaves the list exactly as it was. Accepting
//! also hands the unlocked survey id to the accept hook and returns it.

use async_trait::async_trait;
use survey::{ShareDecision, SurveyShare};
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};

#[cfg(test)]
#[path = "shares_test.rs"]
mod shares_test;

/// Backend operations the inbox depends on.
#[async_trait]
pub trait ShareRemote: Send + Sync {
    async fn pending(&self) -> Result<Vec<SurveyShare>, ApiError>;
    async fn respond(&self, share_id: &str, decision: ShareDecision) -> Result<(), ApiError>;
}

#[async_trait]
impl ShareRemote for ApiClient {
    async fn pending(&self) -> Result<Vec<SurveyShare>, ApiError> {
        self.pending_shares().await
    }

    async fn respond(&self, share_id: &str, decision: ShareDecision) -> Result<(), ApiError> {
        self.respond_to_share(share_id, decision).await.map(|_| ())
    }
}

type AcceptHook = Box<dyn Fn(&str) + Send + Sync>;

pub struct ShareInbox<R> {
    remote: R,
    pending: Vec<SurveyShare>,
    on_accept: Option<AcceptHook>,
}

impl<R: ShareRemote> ShareInbox<R> {
    #[must_use]
    pub fn new(remote: R) -> Self {
        Self { remote, pending: Vec::new(), on_accept: None }
    }

    /// Called with the survey id of every accepted share.
    #[must_use]
    pub fn with_on_accept(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_accept = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn pending(&self) -> &[SurveyShare] {
        &self.pending
    }

    /// Replace the local list with the backend's. On failure the previous list
    /// is kept.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged.
    pub async fn refresh(&mut self) -> Result<&[SurveyShare], ApiError> {
        match self.remote.pending().await {
            Ok(shares) => {
                self.pending = shares;
                Ok(&self.pending)
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch pending shares");
                Err(e)
            }
        }
    }

    /// Accept `share_id`, returning the unlocked survey id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnknownShare`] if the share is not in the list,
    /// [`ApiError::Model`] if it is no longer pending, or the backend error.
    pub async fn accept(&mut self, share_id: &str) -> Result<String, ApiError> {
        let share = self.resolve(share_id, ShareDecision::Accept).await?;
        if let Some(hook) = &self.on_accept {
            hook(&share.survey_id);
        }
        Ok(share.survey_id)
    }

    /// Reject `share_id`.
    ///
    /// # Errors
    ///
    /// Same as [`ShareInbox::accept`].
    pub async fn reject(&mut self, share_id: &str) -> Result<(), ApiError> {
        self.resolve(share_id, ShareDecision::Reject).await.map(|_| ())
    }

    async fn resolve(&mut self, share_id: &str, decision: ShareDecision) -> Result<SurveyShare, ApiError> {
        let index = self
            .pending
            .iter()
            .position(|s| s.id == share_id)
            .ok_or_else(|| ApiError::UnknownShare(share_id.to_owned()))?;
        // Check the transition before calling out; the list is untouched on error.
        let status = self.pending[index].status.respond(decision)?;

        if let Err(e) = self.remote.respond(share_id, decision).await {
            warn!(share_id, error = %e, "share response failed");
            return Err(e);
        }

        let mut share = self.pending.remove(index);
        share.status = status;
        info!(share_id, %status, remaining = self.pending.len(), "share resolved");
        Ok(share)
    }
}
