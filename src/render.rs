//! Plain-text rendering for terminal output.
//!
//! Charts use proportional block bars scaled to the largest count. All
//! functions return `String` so callers decide where output goes.

use std::fmt::Write;

use survey::{
    AnswerCount, DemographicBreakdown, NamedPath, QuestionPathInfo, QuestionSummary, Survey, SurveyAnalytics,
    SurveyPath, SurveyResponse, SurveyShare, path_name,
};
use time::format_description::well_known::Rfc3339;

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

pub const DEFAULT_BAR_WIDTH: usize = 30;
const BLOCK: char = '█';
const CELL_WIDTH: usize = 18;

/// Bar of `count` scaled so `max` fills `width`. Non-zero counts get at least
/// one block.
#[must_use]
pub fn bar(count: usize, max: usize, width: usize) -> String {
    if count == 0 || max == 0 {
        return String::new();
    }
    let blocks = (count * width).div_ceil(max).clamp(1, width);
    std::iter::repeat_n(BLOCK, blocks).collect()
}

fn percent(count: usize, total: usize) -> usize {
    if total == 0 { 0 } else { (count * 100 + total / 2) / total }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// One row per count: label, bar, count and share of `total`.
#[must_use]
pub fn bar_chart(rows: &[AnswerCount], total: usize, width: usize) -> String {
    let label_width = rows.iter().map(|r| r.answer.chars().count()).max().unwrap_or(0);
    let max = rows.iter().map(|r| r.count).max().unwrap_or(0);
    let mut out = String::new();
    for row in rows {
        let _ = writeln!(
            out,
            "  {:<label_width$}  {:<width$}  {} ({}%)",
            row.answer,
            bar(row.count, max, width),
            row.count,
            percent(row.count, total),
        );
    }
    out
}

#[must_use]
pub fn question_summary(summary: &QuestionSummary, width: usize) -> String {
    let mut out = format!(
        "{} [{}] {} answered\n",
        summary.question_text,
        summary.question_type.as_str(),
        summary.answered
    );
    out.push_str(&bar_chart(&summary.counts, summary.answered, width));
    if let Some(numeric) = &summary.numeric {
        let _ = writeln!(out, "  min {} max {} mean {:.2}", numeric.min, numeric.max, numeric.mean);
    }
    out
}

fn demographics(breakdown: &DemographicBreakdown, total: usize, width: usize) -> String {
    let age_rows: Vec<AnswerCount> = breakdown
        .age_group
        .iter()
        .map(|a| AnswerCount { answer: a.label().to_owned(), count: a.count })
        .collect();
    let mut out = String::new();
    for (title, rows) in [
        ("Gender", breakdown.gender.as_slice()),
        ("Education level", breakdown.education_level.as_slice()),
        ("City", breakdown.city.as_slice()),
        ("Age group", age_rows.as_slice()),
    ] {
        let _ = writeln!(out, "{title}");
        out.push_str(&bar_chart(rows, total, width));
    }
    out
}

/// Full dashboard: per-question charts, demographics and daily volume.
#[must_use]
pub fn analytics(analytics: &SurveyAnalytics, width: usize) -> String {
    let mut out = format!("Survey {}: {} responses\n", analytics.survey_id, analytics.total_responses);
    for summary in &analytics.questions {
        out.push('\n');
        out.push_str(&question_summary(summary, width));
    }
    out.push_str("\nDemographics\n");
    out.push_str(&demographics(&analytics.demographics, analytics.total_responses, width));

    let daily: Vec<AnswerCount> = analytics
        .daily
        .iter()
        .map(|d| AnswerCount { answer: d.date.to_string(), count: d.count })
        .collect();
    out.push_str("\nResponses per day\n");
    out.push_str(&bar_chart(&daily, analytics.total_responses, width));
    out
}

/// One row per response with its demographic snapshot and every answer.
#[must_use]
pub fn response_table(survey: &Survey, responses: &[SurveyResponse]) -> String {
    let mut header = vec!["id".to_owned(), "submitted".to_owned(), "gender".to_owned(), "city".to_owned()];
    header.extend(survey.questions.iter().map(|q| q.id.clone()));

    let mut out = String::new();
    write_row(&mut out, &header);
    for response in responses {
        let demographic = response.demographic();
        let mut row = vec![
            response.id.clone(),
            response.submitted_at.format(&Rfc3339).unwrap_or_default(),
            demographic.and_then(|d| d.gender.clone()).unwrap_or_default(),
            demographic.and_then(|d| d.city.clone()).unwrap_or_default(),
        ];
        row.extend(
            survey
                .questions
                .iter()
                .map(|q| response.answer(&q.id).map(survey::AnswerValue::canonical).unwrap_or_default()),
        );
        write_row(&mut out, &row);
    }
    out
}

fn write_row(out: &mut String, cells: &[String]) {
    let line = cells
        .iter()
        .map(|c| format!("{:<CELL_WIDTH$}", truncate(c, CELL_WIDTH)))
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(out, "{}", line.trim_end());
}

/// Numbered question list with each question's place in the selected paths.
#[must_use]
pub fn question_list(info: &[QuestionPathInfo<'_>]) -> String {
    let mut out = String::new();
    for (i, entry) in info.iter().enumerate() {
        let tag = entry
            .primary()
            .map(|m| format!(" [{} #{}]", m.path_name, m.position))
            .unwrap_or_default();
        let _ = write!(
            out,
            "{:>3}.{tag} {} ({})",
            i + 1,
            entry.question.text,
            entry.question.question_type.as_str()
        );
        let others: Vec<String> = entry
            .memberships
            .iter()
            .skip(1)
            .map(|m| format!("{} #{}", m.path_name, m.position))
            .collect();
        if !others.is_empty() {
            let _ = write!(out, " also in {}", others.join(", "));
        }
        out.push('\n');
    }
    out
}

/// `Path A: q1=Yes -> q2=Red`, one line per path.
#[must_use]
pub fn path_list(paths: &[SurveyPath], catalog: &[NamedPath]) -> String {
    let mut out = String::new();
    for (i, path) in paths.iter().enumerate() {
        let steps = path
            .steps()
            .iter()
            .map(|s| format!("{}={}", s.question_id, s.answer))
            .collect::<Vec<_>>()
            .join(" -> ");
        let _ = writeln!(out, "{}: {steps}", path_name(path, i, catalog));
    }
    out
}

#[must_use]
pub fn share_list(shares: &[SurveyShare]) -> String {
    if shares.is_empty() {
        return "No pending shares.\n".to_owned();
    }
    let mut out = String::new();
    for share in shares {
        let title = share.survey_title.as_deref().unwrap_or(&share.survey_id);
        let from = if share.shared_by.email.is_empty() { &share.shared_by.name } else { &share.shared_by.email };
        let _ = writeln!(
            out,
            "{}  {title}  from {from}  {}",
            share.id,
            share.created_at.format(&Rfc3339).unwrap_or_default()
        );
    }
    out
}
