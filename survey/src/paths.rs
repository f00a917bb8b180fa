//! Branch paths through conditionally branching surveys.
//!
//! SYSTEM CONTEXT
//! ==============
//! A path is the ordered list of (question, chosen answer) decisions a
//! respondent made at branch points. The analytics views let users select
//! paths, then show each question's place in them and filter responses down
//! to the ones that followed a path.
//!
//! Paths are compared structurally: two paths with the same steps get the
//! same catalog name no matter where they were built.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{Question, Survey, SurveyResponse};

#[cfg(test)]
#[path = "paths_test.rs"]
mod paths_test;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStep {
    pub question_id: String,
    pub answer: String,
}

impl PathStep {
    #[must_use]
    pub fn new(question_id: &str, answer: &str) -> Self {
        Self { question_id: question_id.to_owned(), answer: answer.to_owned() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurveyPath {
    steps: Vec<PathStep>,
}

impl SurveyPath {
    #[must_use]
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 1-based position of `question_id` in this path.
    #[must_use]
    pub fn position_of(&self, question_id: &str) -> Option<usize> {
        self.steps
            .iter()
            .position(|s| s.question_id == question_id)
            .map(|i| i + 1)
    }

    /// Whether `response` answered every step with that step's answer.
    #[must_use]
    pub fn matches(&self, response: &SurveyResponse) -> bool {
        self.steps.iter().all(|step| {
            response
                .answer(&step.question_id)
                .is_some_and(|value| value.items().iter().any(|item| item.eq_ignore_ascii_case(step.answer.trim())))
        })
    }
}

/// A user-named path from the saved-path catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedPath {
    pub name: String,
    pub steps: SurveyPath,
}

/// `Path A` .. `Path Z`, then `Path AA`, `Path AB`, ...
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn generated_path_label(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index;
    loop {
        letters.push(char::from(b'A' + (n % 26) as u8));
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.reverse();
    format!("Path {}", letters.into_iter().collect::<String>())
}

/// Display name for the `index`-th selected path: the catalog name of a
/// structurally equal path, else a generated label.
#[must_use]
pub fn path_name(path: &SurveyPath, index: usize, catalog: &[NamedPath]) -> String {
    catalog
        .iter()
        .find(|named| named.steps == *path)
        .map_or_else(|| generated_path_label(index), |named| named.name.clone())
}

/// Fix a name for every path in `listed` so it survives re-selection: the
/// catalog entries come first, then each listed path the catalog does not name
/// gets the generated label of its position in `listed`.
#[must_use]
pub fn name_listed_paths(listed: &[SurveyPath], catalog: &[NamedPath]) -> Vec<NamedPath> {
    let mut named = catalog.to_vec();
    for (i, path) in listed.iter().enumerate() {
        if !named.iter().any(|n| n.steps == *path) {
            named.push(NamedPath { name: generated_path_label(i), steps: path.clone() });
        }
    }
    named
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathMembership {
    /// Index of the path in the selection.
    pub path_index: usize,
    pub path_name: String,
    /// 1-based step position within the path.
    pub position: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuestionPathInfo<'a> {
    pub question: &'a Question,
    /// Memberships in selection order.
    pub memberships: Vec<PathMembership>,
}

impl QuestionPathInfo<'_> {
    #[must_use]
    pub fn in_path(&self) -> bool {
        !self.memberships.is_empty()
    }

    #[must_use]
    pub fn primary(&self) -> Option<&PathMembership> {
        self.memberships.first()
    }
}

/// Annotate every question with its place in the selected paths.
#[must_use]
pub fn annotate_questions<'a>(
    questions: &'a [Question],
    selected: &[SurveyPath],
    catalog: &[NamedPath],
) -> Vec<QuestionPathInfo<'a>> {
    let names: Vec<String> = selected
        .iter()
        .enumerate()
        .map(|(i, p)| path_name(p, i, catalog))
        .collect();

    questions
        .iter()
        .map(|question| {
            let memberships = selected
                .iter()
                .enumerate()
                .filter_map(|(path_index, path)| {
                    path.position_of(&question.id).map(|position| PathMembership {
                        path_index,
                        path_name: names[path_index].clone(),
                        position,
                    })
                })
                .collect();
            QuestionPathInfo { question, memberships }
        })
        .collect()
}

// =============================================================================
// ENUMERATION
// =============================================================================

/// Every distinct path through `survey`'s branch points, capped at `limit`.
///
/// The walk starts at the first question. At a branch point each choice (and
/// any branch key not among the choices) becomes a step; the walk continues at
/// the first target of that answer's branch, or at the next question when the
/// answer has none. Other questions are passed through without a step. A walk
/// ends past the last question, at an unknown target, or on revisiting a
/// question.
#[must_use]
pub fn enumerate_paths(survey: &Survey, limit: usize) -> Vec<SurveyPath> {
    let mut out = Vec::new();
    if survey.questions.is_empty() || limit == 0 {
        return out;
    }
    let mut seen = HashSet::new();
    let mut visited = HashSet::new();
    walk(survey, Some(0), &mut Vec::new(), &mut visited, &mut seen, &mut out, limit);
    out
}

fn branch_answers(question: &Question) -> Vec<String> {
    let mut answers = question.choices();
    for key in question.conditional_branching.keys() {
        if !answers.iter().any(|a| a == key) {
            answers.push(key.clone());
        }
    }
    answers
}

fn walk(
    survey: &Survey,
    index: Option<usize>,
    steps: &mut Vec<PathStep>,
    visited: &mut HashSet<usize>,
    seen: &mut HashSet<SurveyPath>,
    out: &mut Vec<SurveyPath>,
    limit: usize,
) {
    if out.len() >= limit {
        return;
    }
    let Some(i) = index.filter(|i| *i < survey.questions.len() && !visited.contains(i)) else {
        let path = SurveyPath::new(steps.clone());
        if !path.is_empty() && seen.insert(path.clone()) {
            out.push(path);
        }
        return;
    };

    let question = &survey.questions[i];
    visited.insert(i);
    if question.is_branch_point() {
        for answer in branch_answers(question) {
            let next = match question.conditional_branching.get(&answer).and_then(|t| t.first()) {
                Some(target) => survey.question_index(target),
                None => Some(i + 1),
            };
            steps.push(PathStep { question_id: question.id.clone(), answer });
            walk(survey, next, steps, visited, seen, out, limit);
            steps.pop();
        }
    } else {
        walk(survey, Some(i + 1), steps, visited, seen, out, limit);
    }
    visited.remove(&i);
}
