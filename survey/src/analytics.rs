//! Aggregated counts for the analytics dashboard.
//!
//! DESIGN
//! ======
//! Every aggregate is a plain typed record so renderers never reflect over
//! arbitrary JSON. Counts keep a stable order: declared options first (zero
//! counts included so charts keep their axes), then unlisted values in
//! first-seen order. Demographic tallies are sorted by count, with missing
//! values grouped under [`UNKNOWN`].

use std::collections::{BTreeMap, HashMap};

use serde::{Serialize, Serializer};
use time::{Date, UtcOffset};

use crate::model::{AgeGroup, Question, QuestionType, Survey, SurveyResponse};

#[cfg(test)]
#[path = "analytics_test.rs"]
mod analytics_test;

/// Label for responses without a value for a demographic field.
pub const UNKNOWN: &str = "Unknown";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnswerCount {
    pub answer: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuestionSummary {
    pub question_id: String,
    pub question_text: String,
    pub question_type: QuestionType,
    /// Responses with a non-blank answer.
    pub answered: usize,
    pub counts: Vec<AnswerCount>,
    pub numeric: Option<NumericSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgeGroupCount {
    /// `None` for respondents without a usable birth date.
    pub group: Option<AgeGroup>,
    pub count: usize,
}

impl AgeGroupCount {
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.group.map_or(UNKNOWN, AgeGroup::label)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DemographicBreakdown {
    pub gender: Vec<AnswerCount>,
    pub education_level: Vec<AnswerCount>,
    pub city: Vec<AnswerCount>,
    pub age_group: Vec<AgeGroupCount>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    #[serde(serialize_with = "serialize_date")]
    pub date: Date,
    pub count: usize,
}

fn serialize_date<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(date)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SurveyAnalytics {
    pub survey_id: String,
    pub total_responses: usize,
    pub questions: Vec<QuestionSummary>,
    pub demographics: DemographicBreakdown,
    pub daily: Vec<DailyCount>,
}

// =============================================================================
// TALLY
// =============================================================================

/// Insertion-ordered counter keyed case-insensitively.
#[derive(Default)]
struct Tally {
    entries: Vec<AnswerCount>,
    index: HashMap<String, usize>,
}

impl Tally {
    fn seeded(labels: &[String]) -> Self {
        let mut tally = Self::default();
        for label in labels {
            tally.slot(label);
        }
        tally
    }

    fn slot(&mut self, label: &str) -> &mut AnswerCount {
        let key = label.to_lowercase();
        let i = match self.index.get(&key) {
            Some(i) => *i,
            None => {
                self.entries.push(AnswerCount { answer: label.to_owned(), count: 0 });
                self.index.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[i]
    }

    fn add(&mut self, label: &str) {
        self.slot(label).count += 1;
    }

    fn into_counts(self) -> Vec<AnswerCount> {
        self.entries
    }

    fn into_ranked(self) -> Vec<AnswerCount> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| {
            (a.answer == UNKNOWN)
                .cmp(&(b.answer == UNKNOWN))
                .then(b.count.cmp(&a.count))
                .then_with(|| a.answer.cmp(&b.answer))
        });
        entries
    }
}

// =============================================================================
// AGGREGATES
// =============================================================================

/// Answer counts (and numeric summary for rating/slider) for one question.
#[must_use]
pub fn question_summary(question: &Question, responses: &[SurveyResponse]) -> QuestionSummary {
    let mut tally = Tally::seeded(&question.choices());
    let mut answered = 0;
    let mut numbers = Vec::new();

    for response in responses {
        let Some(value) = response.answer(&question.id) else {
            continue;
        };
        let items = value.items();
        if items.is_empty() {
            continue;
        }
        answered += 1;
        for item in &items {
            tally.add(item);
        }
        if question.question_type.is_numeric() {
            if let Some(n) = value.as_number() {
                numbers.push(n);
            }
        }
    }

    QuestionSummary {
        question_id: question.id.clone(),
        question_text: question.text.clone(),
        question_type: question.question_type,
        answered,
        counts: tally.into_counts(),
        numeric: numeric_summary(&numbers),
    }
}

#[allow(clippy::cast_precision_loss)]
fn numeric_summary(numbers: &[f64]) -> Option<NumericSummary> {
    if numbers.is_empty() {
        return None;
    }
    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
    Some(NumericSummary { count: numbers.len(), min, max, mean })
}

fn label(value: Option<&str>) -> &str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(UNKNOWN)
}

/// Demographic tallies over `responses`, with ages computed on `as_of`.
#[must_use]
pub fn demographic_breakdown(responses: &[SurveyResponse], as_of: Date) -> DemographicBreakdown {
    let mut gender = Tally::default();
    let mut education = Tally::default();
    let mut city = Tally::default();
    let mut ages: BTreeMap<Option<AgeGroup>, usize> = BTreeMap::new();

    for response in responses {
        let demographic = response.demographic();
        gender.add(label(demographic.and_then(|d| d.gender.as_deref())));
        education.add(label(demographic.and_then(|d| d.education_level.as_deref())));
        city.add(label(demographic.and_then(|d| d.city.as_deref())));
        *ages.entry(demographic.and_then(|d| d.age_group_on(as_of))).or_default() += 1;
    }

    // Known groups in age order, unknown last.
    let mut age_group: Vec<AgeGroupCount> = ages
        .iter()
        .filter(|(group, _)| group.is_some())
        .map(|(group, count)| AgeGroupCount { group: *group, count: *count })
        .collect();
    if let Some(count) = ages.get(&None) {
        age_group.push(AgeGroupCount { group: None, count: *count });
    }

    DemographicBreakdown {
        gender: gender.into_ranked(),
        education_level: education.into_ranked(),
        city: city.into_ranked(),
        age_group,
    }
}

/// Responses per UTC calendar day, oldest first.
#[must_use]
pub fn responses_per_day(responses: &[SurveyResponse]) -> Vec<DailyCount> {
    let mut days: BTreeMap<Date, usize> = BTreeMap::new();
    for response in responses {
        let day = response.submitted_at.to_offset(UtcOffset::UTC).date();
        *days.entry(day).or_default() += 1;
    }
    days.into_iter().map(|(date, count)| DailyCount { date, count }).collect()
}

/// Full dashboard aggregate for `survey` over `responses`.
#[must_use]
pub fn summarize(survey: &Survey, responses: &[SurveyResponse], as_of: Date) -> SurveyAnalytics {
    SurveyAnalytics {
        survey_id: survey.id.clone(),
        total_responses: responses.len(),
        questions: survey
            .questions
            .iter()
            .map(|q| question_summary(q, responses))
            .collect(),
        demographics: demographic_breakdown(responses, as_of),
        daily: responses_per_day(responses),
    }
}
