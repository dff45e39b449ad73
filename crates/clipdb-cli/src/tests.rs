use super::*;
use crate::account_metrics::AccountMetricsCommands;
use crate::analyze::AnalyzeCommands;
use clipdb_vision::ExtractionTask;

#[test]
fn parses_db_migrate_command() {
    let cli = Cli::try_parse_from(["clipdb-cli", "db", "migrate"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn parses_db_seed_command() {
    let cli = Cli::try_parse_from(["clipdb-cli", "db", "seed"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Seed
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["clipdb-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn account_metrics_clear_defaults_to_unconfirmed() {
    let cli = Cli::try_parse_from(["clipdb-cli", "account-metrics", "clear"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::AccountMetrics {
            command: AccountMetricsCommands::Clear { yes: false }
        })
    ));
}

#[test]
fn account_metrics_load_requires_period() {
    let result = Cli::try_parse_from(["clipdb-cli", "account-metrics", "load"]);
    assert!(result.is_err());
}

#[test]
fn account_metrics_load_parses_period_and_images() {
    let cli = Cli::try_parse_from([
        "clipdb-cli",
        "account-metrics",
        "load",
        "--period-start",
        "2025-03-01",
        "--period-end",
        "2025-03-07",
        "--search-image",
        "https://storage.example.com/search.png",
    ])
    .unwrap();
    let Some(Commands::AccountMetrics {
        command: AccountMetricsCommands::Load(args),
    }) = cli.command
    else {
        panic!("expected account-metrics load");
    };
    assert_eq!(args.period_start.to_string(), "2025-03-01");
    assert_eq!(
        args.search_image.as_deref(),
        Some("https://storage.example.com/search.png")
    );
    assert!(args.creators_image.is_none());
}

#[test]
fn analyze_images_accepts_legacy_task_alias() {
    let cli = Cli::try_parse_from([
        "clipdb-cli",
        "analyze",
        "images",
        "--task",
        "viewers_times",
        "a.png",
        "b.png",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Analyze {
            command: AnalyzeCommands::Images {
                task: ExtractionTask::ViewerActiveTimes,
                ref files,
            }
        }) if files.len() == 2
    ));
}

#[test]
fn analyze_images_rejects_unknown_task() {
    let result = Cli::try_parse_from([
        "clipdb-cli",
        "analyze",
        "images",
        "--task",
        "horoscope",
        "a.png",
    ]);
    assert!(result.is_err());
}

#[test]
fn analyze_images_requires_files() {
    let result = Cli::try_parse_from(["clipdb-cli", "analyze", "images", "--task", "search"]);
    assert!(result.is_err());
}
