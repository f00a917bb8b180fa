//! Survey, response and share wire types.
//!
//! DESIGN
//! ======
//! Field names follow the backend's camelCase JSON. Entities are owned and
//! persisted by the backend; the client holds request-scoped copies, so the
//! only invariants enforced here are the ones a client can check locally:
//! answers must reference questions of their own survey, and a share leaves
//! `pending` exactly once.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("response {response_id} belongs to survey {actual}, expected {expected}")]
    SurveyMismatch { response_id: String, expected: String, actual: String },
    #[error("response {response_id} answers unknown question {question_id}")]
    UnknownQuestion { response_id: String, question_id: String },
    #[error("share already {0}")]
    ShareAlreadyResolved(ShareStatus),
    #[error("unknown age group: {0}")]
    UnknownAgeGroup(String),
}

// =============================================================================
// SURVEY
// =============================================================================

/// Kind of input a question collects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    Text,
    Dropdown,
    YesNo,
    Rating,
    Date,
    Slider,
    FileUpload,
    ColorPicker,
}

impl QuestionType {
    /// Question types whose answers come from a fixed option list.
    #[must_use]
    pub fn is_choice(self) -> bool {
        matches!(self, Self::MultipleChoice | Self::Dropdown | Self::YesNo)
    }

    /// Question types whose answers are summarized numerically.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Rating | Self::Slider)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple-choice",
            Self::Text => "text",
            Self::Dropdown => "dropdown",
            Self::YesNo => "yes-no",
            Self::Rating => "rating",
            Self::Date => "date",
            Self::Slider => "slider",
            Self::FileUpload => "file-upload",
            Self::ColorPicker => "color-picker",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Answer value -> ids of the questions that follow when it is chosen.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub conditional_branching: BTreeMap<String, Vec<String>>,
}

impl Question {
    /// Selectable answers in display order. Yes/no questions without explicit
    /// options get `Yes` and `No`.
    #[must_use]
    pub fn choices(&self) -> Vec<String> {
        if self.options.is_empty() && self.question_type == QuestionType::YesNo {
            return vec!["Yes".to_owned(), "No".to_owned()];
        }
        self.options.clone()
    }

    /// Whether any answer of this question redirects the survey flow.
    #[must_use]
    pub fn is_branch_point(&self) -> bool {
        self.conditional_branching.values().any(|next| !next.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Survey {
    #[must_use]
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    #[must_use]
    pub fn question_index(&self, question_id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == question_id)
    }
}

// =============================================================================
// RESPONSES
// =============================================================================

/// A submitted answer. The backend stores whatever the input widget produced,
/// so several JSON shapes are accepted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl AnswerValue {
    /// Canonical text used for comparison and counting.
    #[must_use]
    pub fn canonical(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Bool(true) => "Yes".to_owned(),
            Self::Bool(false) => "No".to_owned(),
            Self::Number(n) => format_number(*n),
            Self::Text(s) => s.trim().to_owned(),
            Self::List(items) => items.iter().map(|s| s.trim()).collect::<Vec<_>>().join(", "),
        }
    }

    /// Individual answer values; multi-select answers yield one entry per
    /// selected item. Blank values yield nothing.
    #[must_use]
    pub fn items(&self) -> Vec<String> {
        match self {
            Self::List(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
            other => {
                let text = other.canonical();
                if text.is_empty() { Vec::new() } else { vec![text] }
            }
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    format!("{n}")
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    #[serde(default, alias = "answer")]
    pub value: AnswerValue,
}

/// Five-to-ten-year age buckets used by the demographic breakdowns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "Under 18")]
    Under18,
    #[serde(rename = "18-24")]
    From18To24,
    #[serde(rename = "25-34")]
    From25To34,
    #[serde(rename = "35-44")]
    From35To44,
    #[serde(rename = "45-54")]
    From45To54,
    #[serde(rename = "55-64")]
    From55To64,
    #[serde(rename = "65+")]
    Over65,
}

impl AgeGroup {
    pub const ALL: [Self; 7] = [
        Self::Under18,
        Self::From18To24,
        Self::From25To34,
        Self::From35To44,
        Self::From45To54,
        Self::From55To64,
        Self::Over65,
    ];

    #[must_use]
    pub fn from_age(age: u32) -> Self {
        match age {
            0..=17 => Self::Under18,
            18..=24 => Self::From18To24,
            25..=34 => Self::From25To34,
            35..=44 => Self::From35To44,
            45..=54 => Self::From45To54,
            55..=64 => Self::From55To64,
            _ => Self::Over65,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Under18 => "Under 18",
            Self::From18To24 => "18-24",
            Self::From25To34 => "25-34",
            Self::From35To44 => "35-44",
            Self::From45To54 => "45-54",
            Self::From55To64 => "55-64",
            Self::Over65 => "65+",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeGroup {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "under-18" | "<18" => Ok(Self::Under18),
            "18-24" => Ok(Self::From18To24),
            "25-34" => Ok(Self::From25To34),
            "35-44" => Ok(Self::From35To44),
            "45-54" => Ok(Self::From45To54),
            "55-64" => Ok(Self::From55To64),
            "65+" | "65-plus" => Ok(Self::Over65),
            _ => Err(ModelError::UnknownAgeGroup(s.to_owned())),
        }
    }
}

/// Respondent profile data captured alongside a response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographic {
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub education_level: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// `YYYY-MM-DD`, optionally followed by a time component.
    #[serde(default)]
    pub date_of_birth: Option<String>,
}

impl Demographic {
    #[must_use]
    pub fn birth_date(&self) -> Option<Date> {
        let raw = self.date_of_birth.as_deref()?.trim();
        let day = raw.get(..10)?;
        Date::parse(day, format_description!("[year]-[month]-[day]")).ok()
    }

    /// Age in whole years on `as_of`. `None` when the birth date is missing,
    /// malformed or after `as_of`.
    #[must_use]
    pub fn age_on(&self, as_of: Date) -> Option<u32> {
        let born = self.birth_date()?;
        let mut years = as_of.year() - born.year();
        if (u8::from(as_of.month()), as_of.day()) < (u8::from(born.month()), born.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }

    #[must_use]
    pub fn age_group_on(&self, as_of: Date) -> Option<AgeGroup> {
        self.age_on(as_of).map(AgeGroup::from_age)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Respondent {
    #[serde(default)]
    pub demographic: Demographic,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    pub id: String,
    pub survey_id: String,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
    #[serde(default)]
    pub respondent: Option<Respondent>,
}

impl SurveyResponse {
    /// First answer recorded for `question_id`.
    #[must_use]
    pub fn answer(&self, question_id: &str) -> Option<&AnswerValue> {
        self.answers
            .iter()
            .find(|a| a.question_id == question_id)
            .map(|a| &a.value)
    }

    #[must_use]
    pub fn demographic(&self) -> Option<&Demographic> {
        self.respondent.as_ref().map(|r| &r.demographic)
    }
}

/// Check that a response only answers questions of `survey`.
///
/// # Errors
///
/// Returns [`ModelError::SurveyMismatch`] if the response names another
/// survey, or [`ModelError::UnknownQuestion`] for the first foreign answer.
pub fn validate_response(survey: &Survey, response: &SurveyResponse) -> Result<(), ModelError> {
    if response.survey_id != survey.id {
        return Err(ModelError::SurveyMismatch {
            response_id: response.id.clone(),
            expected: survey.id.clone(),
            actual: response.survey_id.clone(),
        });
    }
    for answer in &response.answers {
        if survey.question(&answer.question_id).is_none() {
            return Err(ModelError::UnknownQuestion {
                response_id: response.id.clone(),
                question_id: answer.question_id.clone(),
            });
        }
    }
    Ok(())
}

/// Split `responses` into those that pass [`validate_response`] and the
/// rejection for each one that does not. Order is preserved on both sides.
#[must_use]
pub fn partition_valid(survey: &Survey, responses: Vec<SurveyResponse>) -> (Vec<SurveyResponse>, Vec<ModelError>) {
    let mut valid = Vec::with_capacity(responses.len());
    let mut rejected = Vec::new();
    for response in responses {
        match validate_response(survey, &response) {
            Ok(()) => valid.push(response),
            Err(e) => rejected.push(e),
        }
    }
    (valid, rejected)
}

// =============================================================================
// SHARES
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ShareStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Apply a decision. Only `Pending` may transition.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShareAlreadyResolved`] for accepted or rejected shares.
    pub fn respond(self, decision: ShareDecision) -> Result<Self, ModelError> {
        match self {
            Self::Pending => Ok(match decision {
                ShareDecision::Accept => Self::Accepted,
                ShareDecision::Reject => Self::Rejected,
            }),
            resolved => Err(ModelError::ShareAlreadyResolved(resolved)),
        }
    }
}

impl fmt::Display for ShareStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareDecision {
    Accept,
    Reject,
}

impl ShareDecision {
    /// Status value sent to the backend for this decision.
    #[must_use]
    pub fn target_status(self) -> ShareStatus {
        match self {
            Self::Accept => ShareStatus::Accepted,
            Self::Reject => ShareStatus::Rejected,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// An invitation granting the current user access to another user's survey.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyShare {
    pub id: String,
    pub survey_id: String,
    pub shared_by: SharedUser,
    pub status: ShareStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub survey_title: Option<String>,
}

impl SurveyShare {
    /// Record a decision on this share.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShareAlreadyResolved`] if the share is not pending.
    pub fn respond(&mut self, decision: ShareDecision) -> Result<(), ModelError> {
        self.status = self.status.respond(decision)?;
        Ok(())
    }
}
