use super::*;
use time::macros::date;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("surveyhub").chain(args.iter().copied())).unwrap()
}

#[test]
fn filter_flags_build_a_spec() {
    let cli = parse(&[
        "responses",
        "s1",
        "--gender",
        "female",
        "--education",
        "Master",
        "--age-group",
        "18-24",
        "--as-of",
        "2024-03-01",
        "--answer",
        "q1=Yes",
        "--answer",
        "q4~long",
        "--path",
        "q1=Yes, q2=Red",
        "--show-empty",
    ]);
    let Command::Responses { survey_id, filters, json } = cli.command else {
        panic!("expected responses command");
    };
    assert_eq!(survey_id, "s1");
    assert!(!json);

    let spec = filters.spec();
    assert_eq!(spec.gender.as_deref(), Some("female"));
    assert_eq!(spec.education_level.as_deref(), Some("Master"));
    assert_eq!(spec.age_group, Some(AgeGroup::From18To24));
    assert_eq!(spec.as_of, Some(date!(2024 - 03 - 01)));
    assert_eq!(spec.answers, vec![AnswerConstraint::equals("q1", "Yes"), AnswerConstraint::contains("q4", "long")]);
    assert_eq!(
        spec.path,
        Some(SurveyPath::new(vec![PathStep::new("q1", "Yes"), PathStep::new("q2", "Red")]))
    );
    assert_eq!(filters.policy(), EmptyResultPolicy::ShowEmpty);
}

#[test]
fn no_filter_flags_is_inactive() {
    let cli = parse(&["analytics", "s1"]);
    let Command::Analytics { filters, width, .. } = cli.command else {
        panic!("expected analytics command");
    };
    assert!(!filters.spec().is_active());
    assert_eq!(filters.policy(), EmptyResultPolicy::ShowAll);
    assert_eq!(width, DEFAULT_BAR_WIDTH);
}

#[test]
fn bad_values_are_rejected() {
    for args in [
        vec!["surveyhub", "responses", "s1", "--as-of", "March"],
        vec!["surveyhub", "responses", "s1", "--answer", "nope"],
        vec!["surveyhub", "responses", "s1", "--path", "q1"],
        vec!["surveyhub", "responses", "s1", "--age-group", "ancient"],
        vec!["surveyhub", "oauth-url", "myspace"],
    ] {
        assert!(Cli::try_parse_from(&args).is_err(), "{args:?}");
    }
}

#[test]
fn global_flags_and_nested_commands() {
    let cli = parse(&["--base-url", "https://x.test", "shares", "send", "s1", "friend@example.com"]);
    assert_eq!(cli.base_url.as_deref(), Some("https://x.test"));
    assert!(matches!(
        cli.command,
        Command::Shares(SharesCommand { command: SharesSubcommand::Send { ref survey_id, ref email } })
            if survey_id == "s1" && email == "friend@example.com"
    ));

    let cli = parse(&["paths", "s1", "--select", "1,3"]);
    assert!(matches!(cli.command, Command::Paths { ref select, limit: 26, .. } if select == &vec![1, 3]));
}

#[test]
fn parse_path_rejects_blank_parts() {
    assert!(parse_path("q1=").is_err());
    assert!(parse_path("=Yes").is_err());
    assert_eq!(parse_path("").unwrap(), SurveyPath::default());
}

#[test]
fn clap_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
