//! Shared fixtures for unit tests.

use std::collections::BTreeMap;

use time::OffsetDateTime;
use time::macros::datetime;

use crate::model::{Answer, AnswerValue, Demographic, Question, QuestionType, Respondent, Survey, SurveyResponse};

pub(crate) const SUBMITTED_AT: OffsetDateTime = datetime!(2024-03-01 10:00 UTC);

pub(crate) fn question(id: &str, question_type: QuestionType, options: &[&str]) -> Question {
    Question {
        id: id.to_owned(),
        text: format!("Question {id}"),
        question_type,
        options: options.iter().map(|s| (*s).to_owned()).collect(),
        conditional_branching: BTreeMap::new(),
    }
}

/// Four questions: `q1` (yes/no) branches to `q2` on Yes and `q3` on No,
/// `q2` is a colour choice, `q3` a rating, `q4` free text.
pub(crate) fn sample_survey() -> Survey {
    let mut q1 = question("q1", QuestionType::YesNo, &[]);
    q1.conditional_branching.insert("Yes".to_owned(), vec!["q2".to_owned()]);
    q1.conditional_branching.insert("No".to_owned(), vec!["q3".to_owned()]);
    Survey {
        id: "s1".to_owned(),
        title: "Sample".to_owned(),
        description: String::new(),
        questions: vec![
            q1,
            question("q2", QuestionType::MultipleChoice, &["Red", "Green", "Blue"]),
            question("q3", QuestionType::Rating, &[]),
            question("q4", QuestionType::Text, &[]),
        ],
    }
}

pub(crate) fn demographic(gender: &str, education: &str, city: &str, dob: &str) -> Demographic {
    let opt = |s: &str| if s.is_empty() { None } else { Some(s.to_owned()) };
    Demographic {
        gender: opt(gender),
        education_level: opt(education),
        city: opt(city),
        date_of_birth: opt(dob),
    }
}

pub(crate) fn response(id: &str, answers: &[(&str, AnswerValue)], demographic: Option<Demographic>) -> SurveyResponse {
    SurveyResponse {
        id: id.to_owned(),
        survey_id: "s1".to_owned(),
        answers: answers
            .iter()
            .map(|(question_id, value)| Answer { question_id: (*question_id).to_owned(), value: value.clone() })
            .collect(),
        submitted_at: SUBMITTED_AT,
        respondent: demographic.map(|demographic| Respondent { demographic }),
    }
}

pub(crate) fn text(s: &str) -> AnswerValue {
    AnswerValue::Text(s.to_owned())
}

/// Five responses with mixed demographics and answers.
pub(crate) fn sample_responses() -> Vec<SurveyResponse> {
    vec![
        response(
            "r1",
            &[("q1", AnswerValue::Bool(true)), ("q2", text("Red")), ("q4", text("Loved it"))],
            Some(demographic("female", "Bachelor", "Lagos", "1990-05-01")),
        ),
        response(
            "r2",
            &[("q1", AnswerValue::Bool(false)), ("q3", AnswerValue::Number(4.0))],
            Some(demographic("male", "Master", "Abuja", "1985-11-20")),
        ),
        response(
            "r3",
            &[
                ("q1", text("Yes")),
                ("q2", AnswerValue::List(vec!["Green".to_owned(), "Blue".to_owned()])),
                ("q4", text("Too long")),
            ],
            Some(demographic("female", "Master", "Abuja", "2001-02-14")),
        ),
        response("r4", &[("q1", AnswerValue::Bool(false)), ("q3", AnswerValue::Number(2.0))], None),
        response(
            "r5",
            &[("q1", AnswerValue::Bool(true)), ("q2", text("red"))],
            Some(demographic("male", "", "Lagos", "")),
        ),
    ]
}
