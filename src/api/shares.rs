//! Survey share endpoints under `/api/survey-shares`.

use serde_json::json;
use survey::{ShareDecision, SurveyShare};
use tracing::info;

use super::auth::Ack;
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Shares awaiting the current user's decision.
    ///
    /// # Errors
    ///
    /// Returns an error on any failed or undecodable request.
    pub async fn pending_shares(&self) -> Result<Vec<SurveyShare>, ApiError> {
        self.get("/api/survey-shares/pending").await
    }

    /// Accept or reject a share.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the decision.
    pub async fn respond_to_share(&self, share_id: &str, decision: ShareDecision) -> Result<Ack, ApiError> {
        let status = decision.target_status();
        let ack: Ack = self
            .post("/api/survey-shares/respond", json!({ "shareId": share_id, "status": status }))
            .await?;
        info!(share_id, %status, "share response recorded");
        Ok(ack)
    }

    /// Invite the user with `email` to `survey_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnknownInvitee`] for an unknown user and
    /// [`ApiError::ShareConflict`] when the share already exists or the user
    /// owns the survey.
    pub async fn share_survey(&self, survey_id: &str, email: &str) -> Result<Ack, ApiError> {
        let ack: Ack = self
            .post("/api/survey-shares/share", json!({ "surveyId": survey_id, "email": email }))
            .await
            .map_err(|e| match e {
                ApiError::NotFound(_) => ApiError::UnknownInvitee(email.to_owned()),
                other => other,
            })?;
        info!(survey_id, "survey shared");
        Ok(ack)
    }
}

#[cfg(test)]
#[path = "shares_test.rs"]
mod shares_test;
