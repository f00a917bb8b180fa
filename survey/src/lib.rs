//! Survey data model and response analytics.
//!
//! This crate is UI-framework agnostic: it owns the wire types exchanged with
//! the survey backend plus the pure derivations front ends render from them
//! (response filtering, branch-path annotation, aggregated counts). Nothing
//! here performs I/O.

pub mod analytics;
pub mod filter;
pub mod model;
pub mod paths;

pub use analytics::{
    AgeGroupCount, AnswerCount, DailyCount, DemographicBreakdown, NumericSummary, QuestionSummary, SurveyAnalytics,
    summarize,
};
pub use filter::{AnswerConstraint, AnswerOperator, DemographicField, EmptyResultPolicy, FilterOutcome, FilterSpec};
pub use model::{
    AgeGroup, Answer, AnswerValue, Demographic, ModelError, Question, QuestionType, Respondent, ShareDecision,
    ShareStatus, SharedUser, Survey, SurveyResponse, SurveyShare, partition_valid, validate_response,
};
pub use paths::{
    NamedPath, PathMembership, PathStep, QuestionPathInfo, SurveyPath, annotate_questions, enumerate_paths,
    generated_path_label, name_listed_paths, path_name,
};

#[cfg(test)]
pub(crate) mod test_helpers;
