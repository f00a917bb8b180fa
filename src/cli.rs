//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use survey::{AgeGroup, AnswerConstraint, EmptyResultPolicy, FilterSpec, PathStep, SurveyPath};
use time::Date;
use time::macros::format_description;

use crate::api::OAuthProvider;
use crate::render::DEFAULT_BAR_WIDTH;

#[cfg(test)]
#[path = "cli_test.rs"]
mod cli_test;

#[derive(Parser, Debug)]
#[command(name = "surveyhub", about = "Survey analytics and sharing client")]
pub struct Cli {
    /// Backend origin; overrides SURVEYHUB_BASE_URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Token file; overrides SURVEYHUB_TOKEN_FILE.
    #[arg(long, global = true)]
    pub token_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SURVEYHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "SURVEYHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    VerifyEmail {
        token: String,
    },
    ForgotPassword {
        email: String,
    },
    ResetPassword {
        token: String,
        #[arg(long)]
        password: String,
    },
    ChangePassword {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
    /// Print the URL that starts an OAuth sign-in (google or github).
    OauthUrl {
        provider: OAuthProvider,
    },
    Logout,
    Profile,
    Cities,
    Surveys(SurveysCommand),
    /// List responses, filtered.
    Responses {
        survey_id: String,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Aggregated analytics over the filtered responses.
    Analytics {
        survey_id: String,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value_t = false)]
        json: bool,
        #[arg(long, default_value_t = DEFAULT_BAR_WIDTH)]
        width: usize,
    },
    /// Enumerate branch paths and show where each question sits in them.
    Paths {
        survey_id: String,
        /// 1-based indexes of enumerated paths to highlight.
        #[arg(long = "select", value_delimiter = ',')]
        select: Vec<usize>,
        /// JSON file with `[{"name": ..., "steps": [...]}]` path names.
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long, default_value_t = 26)]
        limit: usize,
    },
    Shares(SharesCommand),
}

#[derive(Args, Debug)]
pub struct SurveysCommand {
    #[command(subcommand)]
    pub command: SurveysSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum SurveysSubcommand {
    List,
    Show { survey_id: String },
}

#[derive(Args, Debug)]
pub struct SharesCommand {
    #[command(subcommand)]
    pub command: SharesSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum SharesSubcommand {
    Pending,
    Accept { share_id: String },
    Reject { share_id: String },
    Send { survey_id: String, email: String },
    /// Poll for pending shares until interrupted.
    Watch {
        /// Poll interval; overrides SURVEYHUB_SHARE_POLL_SECS.
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub gender: Option<String>,
    #[arg(long = "education")]
    pub education_level: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    /// `under-18`, `18-24`, ..., `65+`.
    #[arg(long)]
    pub age_group: Option<AgeGroup>,
    /// Reference date for age groups (YYYY-MM-DD); defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub as_of: Option<Date>,
    /// `QUESTION=VALUE` (equals) or `QUESTION~VALUE` (contains); repeatable.
    #[arg(long = "answer")]
    pub answers: Vec<AnswerConstraint>,
    /// Comma-separated `QUESTION=ANSWER` steps.
    #[arg(long, value_parser = parse_path)]
    pub path: Option<SurveyPath>,
    /// Show nothing instead of every response when no response matches.
    #[arg(long, default_value_t = false)]
    pub show_empty: bool,
}

impl FilterArgs {
    #[must_use]
    pub fn spec(&self) -> FilterSpec {
        FilterSpec {
            gender: self.gender.clone(),
            education_level: self.education_level.clone(),
            city: self.city.clone(),
            age_group: self.age_group,
            as_of: self.as_of,
            answers: self.answers.clone(),
            path: self.path.clone(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> EmptyResultPolicy {
        if self.show_empty { EmptyResultPolicy::ShowEmpty } else { EmptyResultPolicy::ShowAll }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<Date, String> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("invalid date {raw:?}: {e}"))
}

pub(crate) fn parse_path(raw: &str) -> Result<SurveyPath, String> {
    let steps = raw
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            let (question_id, answer) = part
                .split_once('=')
                .ok_or_else(|| format!("invalid path step {part:?}: expected QUESTION=ANSWER"))?;
            let (question_id, answer) = (question_id.trim(), answer.trim());
            if question_id.is_empty() || answer.is_empty() {
                return Err(format!("invalid path step {part:?}: expected QUESTION=ANSWER"));
            }
            Ok(PathStep::new(question_id, answer))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SurveyPath::new(steps))
}
