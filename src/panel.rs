//! Filter panel state over a fetched response set.
//!
//! SYSTEM CONTEXT
//! ==============
//! The `responses` and `analytics` commands build a panel from the full
//! response list and the command-line filters. Every setter re-applies the
//! filter immediately, so `visible()` always reflects the current filter.

use std::collections::BTreeSet;

use survey::{
    AgeGroup, AnswerConstraint, DemographicField, EmptyResultPolicy, FilterOutcome, FilterSpec, SurveyPath,
    SurveyResponse,
};
use time::Date;
use tracing::debug;

#[cfg(test)]
#[path = "panel_test.rs"]
mod panel_test;

pub struct FilterPanel {
    all: Vec<SurveyResponse>,
    spec: FilterSpec,
    policy: EmptyResultPolicy,
    outcome: FilterOutcome,
}

impl FilterPanel {
    #[must_use]
    pub fn new(responses: Vec<SurveyResponse>) -> Self {
        Self::with_spec(responses, FilterSpec::default(), EmptyResultPolicy::default())
    }

    #[must_use]
    pub fn with_spec(responses: Vec<SurveyResponse>, spec: FilterSpec, policy: EmptyResultPolicy) -> Self {
        let outcome = spec.apply_with_policy(&responses, policy);
        Self { all: responses, spec, policy, outcome }
    }

    #[must_use]
    pub fn all(&self) -> &[SurveyResponse] {
        &self.all
    }

    #[must_use]
    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    #[must_use]
    pub fn policy(&self) -> EmptyResultPolicy {
        self.policy
    }

    /// Responses to display under the current filter and policy.
    #[must_use]
    pub fn visible(&self) -> &[SurveyResponse] {
        &self.outcome.responses
    }

    /// Responses that actually satisfied the filter.
    #[must_use]
    pub fn matched(&self) -> usize {
        self.outcome.matched
    }

    /// Whether `visible()` is the unfiltered set shown in place of an empty result.
    #[must_use]
    pub fn fell_back(&self) -> bool {
        self.outcome.fell_back
    }

    pub fn set_responses(&mut self, responses: Vec<SurveyResponse>) {
        self.all = responses;
        self.reapply();
    }

    pub fn set_demographic(&mut self, field: DemographicField, value: Option<String>) {
        self.spec.set_demographic(field, value);
        self.reapply();
    }

    pub fn set_age_group(&mut self, group: Option<AgeGroup>) {
        self.spec.age_group = group;
        self.reapply();
    }

    pub fn set_as_of(&mut self, as_of: Option<Date>) {
        self.spec.as_of = as_of;
        self.reapply();
    }

    pub fn set_answer(&mut self, constraint: AnswerConstraint) {
        self.spec.set_answer(constraint);
        self.reapply();
    }

    pub fn clear_answer(&mut self, question_id: &str) {
        self.spec.clear_answer(question_id);
        self.reapply();
    }

    pub fn set_path(&mut self, path: Option<SurveyPath>) {
        self.spec.path = path;
        self.reapply();
    }

    pub fn set_spec(&mut self, spec: FilterSpec) {
        self.spec = spec;
        self.reapply();
    }

    /// Drop every constraint.
    pub fn clear(&mut self) {
        self.set_spec(FilterSpec::default());
    }

    /// Distinct non-blank values of `field` across the full set, sorted.
    #[must_use]
    pub fn demographic_options(&self, field: DemographicField) -> Vec<String> {
        let options: BTreeSet<&str> = self
            .all
            .iter()
            .filter_map(|r| r.demographic())
            .filter_map(|d| field.value(d))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();
        options.into_iter().map(str::to_owned).collect()
    }

    /// For each active demographic constraint, the values actually present in
    /// the full set. Empty unless the panel fell back to the unfiltered set.
    #[must_use]
    pub fn fallback_hints(&self) -> Vec<String> {
        if !self.fell_back() {
            return Vec::new();
        }
        DemographicField::ALL
            .into_iter()
            .filter(|field| self.spec.demographic(*field).is_some())
            .map(|field| {
                let options = self.demographic_options(field);
                let known = if options.is_empty() { "none".to_owned() } else { options.join(", ") };
                format!("known {} values: {known}", field.label())
            })
            .collect()
    }

    fn reapply(&mut self) {
        self.outcome = self.spec.apply_with_policy(&self.all, self.policy);
        debug!(
            total = self.all.len(),
            matched = self.outcome.matched,
            fell_back = self.outcome.fell_back,
            "filter applied"
        );
    }
}
