mod api;
mod auth;
mod cli;
mod config;
mod panel;
mod poll;
mod render;
mod shares;
mod storage;

use std::collections::BTreeSet;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use survey::{
    NamedPath, Survey, SurveyPath, annotate_questions, enumerate_paths, name_listed_paths, partition_valid, summarize,
};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use crate::api::{ApiClient, ApiError};
use crate::auth::AuthStore;
use crate::cli::{Cli, Command, FilterArgs, SharesSubcommand, SurveysSubcommand};
use crate::config::{Config, ConfigError};
use crate::panel::FilterPanel;
use crate::shares::ShareInbox;
use crate::storage::FileStorage;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no path {index}; survey has {available} paths")]
    UnknownPath { index: usize, available: usize },
    #[error("waiting for shutdown signal failed: {0}")]
    Signal(std::io::Error),
}

impl CliError {
    fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }

    fn needs_login(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_unauthorized())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {}", e.user_message());
            if e.needs_login() {
                eprintln!("hint: run `surveyhub login` to start a new session");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = Config::from_env()?
        .with_base_url(cli.base_url.as_deref())?
        .with_token_file(cli.token_file);
    let auth = Arc::new(AuthStore::new(Arc::new(FileStorage::new(&config.token_file))));
    let client = ApiClient::new(&config, auth)?;

    match cli.command {
        Command::Login { email, password } => {
            let user = client.login(&email, &password).await?;
            println!("Signed in as {} <{}>", user.name, user.email);
            Ok(())
        }
        Command::Register { name, email, password } => print_ack(client.register(&name, &email, &password).await?),
        Command::VerifyEmail { token } => print_ack(client.verify_email(&token).await?),
        Command::ForgotPassword { email } => print_ack(client.forgot_password(&email).await?),
        Command::ResetPassword { token, password } => print_ack(client.reset_password(&token, &password).await?),
        Command::ChangePassword { current, new } => print_ack(client.change_password(&current, &new).await?),
        Command::OauthUrl { provider } => {
            println!("{}", client.oauth_url(provider));
            Ok(())
        }
        Command::Logout => {
            client.logout()?;
            println!("Signed out");
            Ok(())
        }
        Command::Profile => print_json(&client.profile().await?),
        Command::Cities => print_json(&client.cities().await?),
        Command::Surveys(surveys) => match surveys.command {
            SurveysSubcommand::List => print_json(&client.list_surveys().await?),
            SurveysSubcommand::Show { survey_id } => print_json(&client.get_survey(&survey_id).await?),
        },
        Command::Responses { survey_id, filters, json } => run_responses(&client, &survey_id, &filters, json).await,
        Command::Analytics { survey_id, filters, json, width } => {
            run_analytics(&client, &survey_id, &filters, json, width).await
        }
        Command::Paths { survey_id, select, catalog, limit } => {
            run_paths(&client, &survey_id, &select, catalog.as_deref(), limit).await
        }
        Command::Shares(shares) => run_shares(client, &config, shares.command).await,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

fn print_ack(ack: api::Ack) -> Result<(), CliError> {
    if !ack.message.is_empty() {
        println!("{}", ack.message);
    }
    Ok(())
}

async fn filtered_panel(client: &ApiClient, survey: &Survey, filters: &FilterArgs) -> Result<FilterPanel, CliError> {
    let (responses, rejected) = partition_valid(survey, client.survey_responses(&survey.id).await?);
    for e in &rejected {
        warn!(survey_id = %survey.id, error = %e, "skipping invalid response");
    }
    let panel = FilterPanel::with_spec(responses, filters.spec(), filters.policy());
    if panel.fell_back() {
        eprintln!("No responses match the selected filters; showing all {} responses.", panel.all().len());
        for hint in panel.fallback_hints() {
            eprintln!("  {hint}");
        }
    }
    Ok(panel)
}

async fn run_responses(client: &ApiClient, survey_id: &str, filters: &FilterArgs, json: bool) -> Result<(), CliError> {
    let survey = client.get_survey(survey_id).await?;
    let panel = filtered_panel(client, &survey, filters).await?;
    if json {
        return print_json(&panel.visible());
    }
    print!("{}", render::response_table(&survey, panel.visible()));
    println!("{} of {} responses", panel.visible().len(), panel.all().len());
    Ok(())
}

async fn run_analytics(
    client: &ApiClient,
    survey_id: &str,
    filters: &FilterArgs,
    json: bool,
    width: usize,
) -> Result<(), CliError> {
    let survey = client.get_survey(survey_id).await?;
    let panel = filtered_panel(client, &survey, filters).await?;
    let as_of = filters.as_of.unwrap_or_else(|| OffsetDateTime::now_utc().date());
    let analytics = summarize(&survey, panel.visible(), as_of);
    if json {
        return print_json(&analytics);
    }
    print!("{}", render::analytics(&analytics, width));
    Ok(())
}

async fn run_paths(
    client: &ApiClient,
    survey_id: &str,
    select: &[usize],
    catalog: Option<&std::path::Path>,
    limit: usize,
) -> Result<(), CliError> {
    let survey = client.get_survey(survey_id).await?;
    let catalog: Vec<NamedPath> = match catalog {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|source| CliError::Read { path: path.display().to_string(), source })?;
            serde_json::from_str(&raw)?
        }
        None => Vec::new(),
    };

    let paths = enumerate_paths(&survey, limit);
    let catalog = name_listed_paths(&paths, &catalog);
    print!("{}", render::path_list(&paths, &catalog));

    let selected = select
        .iter()
        .map(|index| {
            index
                .checked_sub(1)
                .and_then(|i| paths.get(i))
                .cloned()
                .ok_or(CliError::UnknownPath { index: *index, available: paths.len() })
        })
        .collect::<Result<Vec<SurveyPath>, _>>()?;
    println!();
    print!("{}", render::question_list(&annotate_questions(&survey.questions, &selected, &catalog)));
    Ok(())
}

async fn run_shares(client: ApiClient, config: &Config, command: SharesSubcommand) -> Result<(), CliError> {
    match command {
        SharesSubcommand::Pending => {
            print!("{}", render::share_list(&client.pending_shares().await?));
            Ok(())
        }
        SharesSubcommand::Accept { share_id } => {
            let mut inbox = ShareInbox::new(client);
            inbox.refresh().await?;
            let survey_id = inbox.accept(&share_id).await?;
            println!("Accepted {share_id}; survey {survey_id} is now available.");
            Ok(())
        }
        SharesSubcommand::Reject { share_id } => {
            let mut inbox = ShareInbox::new(client);
            inbox.refresh().await?;
            inbox.reject(&share_id).await?;
            println!("Rejected {share_id}.");
            Ok(())
        }
        SharesSubcommand::Send { survey_id, email } => print_ack(client.share_survey(&survey_id, &email).await?),
        SharesSubcommand::Watch { interval_secs } => {
            let interval = interval_secs.map_or(config.share_poll_interval, |s| Duration::from_secs(s.max(1)));
            let inbox = Arc::new(Mutex::new(ShareInbox::new(client)));
            let mut last: Option<BTreeSet<String>> = None;
            let handle = poll::spawn_share_poller(inbox, interval, move |shares| {
                let ids: BTreeSet<String> = shares.iter().map(|s| s.id.clone()).collect();
                if last.as_ref() != Some(&ids) {
                    print!("{}", render::share_list(shares));
                    last = Some(ids);
                }
            });
            let signal = tokio::signal::ctrl_c().await;
            handle.abort();
            signal.map_err(CliError::Signal)
        }
    }
}
