//! Survey, response and lookup endpoints.

use survey::{Survey, SurveyResponse};
use tracing::debug;

use super::client::endpoint;
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Surveys owned by or shared with the current user.
    ///
    /// # Errors
    ///
    /// Returns an error on any failed or undecodable request.
    pub async fn list_surveys(&self) -> Result<Vec<Survey>, ApiError> {
        let surveys: Vec<Survey> = self.get("/api/surveys").await?;
        debug!(count = surveys.len(), "fetched surveys");
        Ok(surveys)
    }

    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown survey and
    /// [`ApiError::InvalidPathSegment`] for an id that cannot name one.
    pub async fn get_survey(&self, survey_id: &str) -> Result<Survey, ApiError> {
        self.get(&endpoint(&["api", "surveys", survey_id])?).await
    }

    /// # Errors
    ///
    /// Returns an error on any failed or undecodable request.
    pub async fn survey_responses(&self, survey_id: &str) -> Result<Vec<SurveyResponse>, ApiError> {
        let path = endpoint(&["api", "surveys", survey_id, "responses"])?;
        let responses: Vec<SurveyResponse> = self.get(&path).await?;
        debug!(survey_id, count = responses.len(), "fetched responses");
        Ok(responses)
    }

    /// Known respondent cities, for the city filter.
    ///
    /// # Errors
    ///
    /// Returns an error on any failed or undecodable request.
    pub async fn cities(&self) -> Result<Vec<String>, ApiError> {
        self.get("/api/surveys/cities").await
    }
}

#[cfg(test)]
#[path = "surveys_test.rs"]
mod surveys_test;
