use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["shelfwatch"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_run_with_defaults() {
    let cli = Cli::try_parse_from(["shelfwatch", "run", "ebooks"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Run {
            ref category,
            smoke: false,
            no_history: false,
            max_pages: None,
        }) if category == "ebooks"
    ));
}

#[test]
fn parses_run_smoke_without_history() {
    let cli = Cli::try_parse_from([
        "shelfwatch",
        "run",
        "monitors",
        "--smoke",
        "--no-history",
        "--max-pages",
        "4",
    ])
    .unwrap();

    assert!(matches!(
        cli.command,
        Some(Commands::Run {
            smoke: true,
            no_history: true,
            max_pages: Some(4),
            ..
        })
    ));
}

#[test]
fn help_and_usage_errors_come_from_the_parser() {
    let help = Cli::try_parse_from(["shelfwatch", "--help"]).unwrap_err();
    assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);

    assert!(Cli::try_parse_from(["shelfwatch", "scrape"]).is_err());
}

#[test]
fn run_requires_a_category() {
    assert!(Cli::try_parse_from(["shelfwatch", "run"]).is_err());
}

#[test]
fn parses_categories_command() {
    let cli = Cli::try_parse_from(["shelfwatch", "categories"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Categories)));
}

#[test]
fn parses_reconcile_with_union_drift() {
    let cli = Cli::try_parse_from([
        "shelfwatch",
        "reconcile",
        "--history",
        "h.csv",
        "--batch",
        "b.csv",
        "--out",
        "o.csv",
        "--schema-drift",
        "union",
    ])
    .unwrap();

    match cli.command {
        Some(Commands::Reconcile {
            history,
            batch,
            out,
            schema_drift,
        }) => {
            assert_eq!(history, PathBuf::from("h.csv"));
            assert_eq!(batch, PathBuf::from("b.csv"));
            assert_eq!(out, PathBuf::from("o.csv"));
            assert_eq!(schema_drift, Some(SchemaDrift::Union));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn reconcile_rejects_unknown_drift_policy() {
    let result = Cli::try_parse_from([
        "shelfwatch",
        "reconcile",
        "--history",
        "h.csv",
        "--batch",
        "b.csv",
        "--out",
        "o.csv",
        "--schema-drift",
        "outer",
    ]);
    assert!(result.is_err());
}
