//! Response filtering for the analytics filter panel.
//!
//! DESIGN
//! ======
//! A [`FilterSpec`] is a conjunction of independent constraints: demographic
//! equality (gender, education level, city, derived age group; exact after
//! trimming), per-question
//! answer constraints, and an optional branch path the response must have
//! followed. A constraint without a value is inactive and matches everything,
//! so an empty spec is the identity filter.
//!
//! TRADE-OFFS
//! ==========
//! An active filter that matches nothing would leave the panel with an empty
//! table. [`EmptyResultPolicy::ShowAll`] falls back to the unfiltered set and
//! flags it in [`FilterOutcome::fell_back`] so the caller can say so.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::model::{AgeGroup, Demographic, SurveyResponse};
use crate::paths::SurveyPath;

#[cfg(test)]
#[path = "filter_test.rs"]
mod filter_test;

// =============================================================================
// ANSWER CONSTRAINTS
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerOperator {
    #[default]
    Equals,
    Contains,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerConstraint {
    pub question_id: String,
    #[serde(default)]
    pub operator: AnswerOperator,
    #[serde(default)]
    pub value: Option<String>,
}

impl AnswerConstraint {
    #[must_use]
    pub fn equals(question_id: &str, value: &str) -> Self {
        Self { question_id: question_id.to_owned(), operator: AnswerOperator::Equals, value: Some(value.to_owned()) }
    }

    #[must_use]
    pub fn contains(question_id: &str, value: &str) -> Self {
        Self { question_id: question_id.to_owned(), operator: AnswerOperator::Contains, value: Some(value.to_owned()) }
    }

    fn active_value(&self) -> Option<&str> {
        self.value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active_value().is_some()
    }

    /// Whether `response` satisfies this constraint. Unanswered questions never
    /// satisfy an active constraint.
    #[must_use]
    pub fn matches(&self, response: &SurveyResponse) -> bool {
        let Some(wanted) = self.active_value() else {
            return true;
        };
        let Some(value) = response.answer(&self.question_id) else {
            return false;
        };
        let wanted = wanted.to_lowercase();
        let mut candidates = value.items();
        if candidates.len() > 1 {
            candidates.push(value.canonical());
        }
        candidates.iter().any(|item| {
            let item = item.to_lowercase();
            match self.operator {
                AnswerOperator::Equals => item == wanted,
                AnswerOperator::Contains => item.contains(&wanted),
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid answer filter {0:?}: expected QUESTION=VALUE or QUESTION~VALUE")]
pub struct ParseConstraintError(String);

/// `q1=Yes` parses as an equality constraint, `q4~long` as a substring one.
impl FromStr for AnswerConstraint {
    type Err = ParseConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s.find(['=', '~']).ok_or_else(|| ParseConstraintError(s.to_owned()))?;
        let (question_id, rest) = s.split_at(split);
        let question_id = question_id.trim();
        if question_id.is_empty() {
            return Err(ParseConstraintError(s.to_owned()));
        }
        let value = &rest[1..];
        Ok(if rest.starts_with('~') {
            Self::contains(question_id, value)
        } else {
            Self::equals(question_id, value)
        })
    }
}

impl fmt::Display for AnswerConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.operator {
            AnswerOperator::Equals => '=',
            AnswerOperator::Contains => '~',
        };
        write!(f, "{}{op}{}", self.question_id, self.value.as_deref().unwrap_or_default())
    }
}

// =============================================================================
// FILTER SPEC
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemographicField {
    Gender,
    EducationLevel,
    City,
}

impl DemographicField {
    pub const ALL: [Self; 3] = [Self::Gender, Self::EducationLevel, Self::City];

    #[must_use]
    pub fn value(self, demographic: &Demographic) -> Option<&str> {
        match self {
            Self::Gender => demographic.gender.as_deref(),
            Self::EducationLevel => demographic.education_level.as_deref(),
            Self::City => demographic.city.as_deref(),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Gender => "gender",
            Self::EducationLevel => "education level",
            Self::City => "city",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmptyResultPolicy {
    /// Show the unfiltered set when an active filter matches nothing.
    #[default]
    ShowAll,
    /// Show the empty result as-is.
    ShowEmpty,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub education_level: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub age_group: Option<AgeGroup>,
    /// Reference date for age groups; today (UTC) when unset.
    #[serde(default)]
    pub as_of: Option<Date>,
    #[serde(default)]
    pub answers: Vec<AnswerConstraint>,
    #[serde(default)]
    pub path: Option<SurveyPath>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterOutcome {
    pub responses: Vec<SurveyResponse>,
    /// Responses that actually satisfied the filter.
    pub matched: usize,
    /// `true` when `responses` is the unfiltered set shown in place of an
    /// empty result.
    pub fell_back: bool,
}

fn normalized(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl FilterSpec {
    #[must_use]
    pub fn demographic(&self, field: DemographicField) -> Option<&str> {
        let value = match field {
            DemographicField::Gender => self.gender.as_deref(),
            DemographicField::EducationLevel => self.education_level.as_deref(),
            DemographicField::City => self.city.as_deref(),
        };
        normalized(value)
    }

    pub fn set_demographic(&mut self, field: DemographicField, value: Option<String>) {
        let slot = match field {
            DemographicField::Gender => &mut self.gender,
            DemographicField::EducationLevel => &mut self.education_level,
            DemographicField::City => &mut self.city,
        };
        *slot = value;
    }

    /// Replace the constraint on `constraint.question_id`, or add it.
    pub fn set_answer(&mut self, constraint: AnswerConstraint) {
        if let Some(existing) = self.answers.iter_mut().find(|c| c.question_id == constraint.question_id) {
            *existing = constraint;
        } else {
            self.answers.push(constraint);
        }
    }

    pub fn clear_answer(&mut self, question_id: &str) {
        self.answers.retain(|c| c.question_id != question_id);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        DemographicField::ALL.iter().any(|f| self.demographic(*f).is_some())
            || self.age_group.is_some()
            || self.answers.iter().any(AnswerConstraint::is_active)
            || self.path.as_ref().is_some_and(|p| !p.is_empty())
    }

    fn reference_date(&self) -> Date {
        self.as_of.unwrap_or_else(|| OffsetDateTime::now_utc().date())
    }

    #[must_use]
    pub fn matches(&self, response: &SurveyResponse) -> bool {
        self.matches_on(response, self.reference_date())
    }

    fn matches_on(&self, response: &SurveyResponse, as_of: Date) -> bool {
        let demographic = response.demographic();
        for field in DemographicField::ALL {
            let Some(wanted) = self.demographic(field) else {
                continue;
            };
            let actual = demographic.and_then(|d| normalized(field.value(d)));
            if actual != Some(wanted) {
                return false;
            }
        }

        if let Some(group) = self.age_group {
            if demographic.and_then(|d| d.age_group_on(as_of)) != Some(group) {
                return false;
            }
        }

        if !self.answers.iter().all(|c| c.matches(response)) {
            return false;
        }

        self.path.as_ref().is_none_or(|p| p.matches(response))
    }

    /// Responses satisfying every active constraint, in input order.
    #[must_use]
    pub fn apply(&self, responses: &[SurveyResponse]) -> Vec<SurveyResponse> {
        let as_of = self.reference_date();
        responses
            .iter()
            .filter(|r| self.matches_on(r, as_of))
            .cloned()
            .collect()
    }

    /// [`FilterSpec::apply`] with the empty-result policy applied.
    #[must_use]
    pub fn apply_with_policy(&self, responses: &[SurveyResponse], policy: EmptyResultPolicy) -> FilterOutcome {
        let filtered = self.apply(responses);
        let matched = filtered.len();
        if matched == 0 && self.is_active() && policy == EmptyResultPolicy::ShowAll && !responses.is_empty() {
            return FilterOutcome { responses: responses.to_vec(), matched, fell_back: true };
        }
        FilterOutcome { responses: filtered, matched, fell_back: false }
    }
}
