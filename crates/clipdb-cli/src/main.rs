mod account_metrics;
mod analyze;
mod db;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::account_metrics::AccountMetricsCommands;
use crate::analyze::AnalyzeCommands;

#[derive(Debug, Parser)]
#[command(name = "clipdb-cli")]
#[command(about = "clipdb command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Account-level metrics maintenance
    AccountMetrics {
        #[command(subcommand)]
        command: AccountMetricsCommands,
    },
    /// Run vision extraction locally and print the result as JSON
    Analyze {
        #[command(subcommand)]
        command: AnalyzeCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Insert the demo dataset
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = clipdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("clipdb-cli: no command given (try --help)");
        return Ok(());
    };

    match command {
        Commands::Db { command } => {
            let pool = db::connect(&config).await?;
            match command {
                DbCommands::Ping => db::run_db_ping(&pool).await?,
                DbCommands::Migrate => db::run_db_migrate(&pool).await?,
                DbCommands::Seed => db::run_db_seed(&pool).await?,
            }
        }
        Commands::AccountMetrics { command } => {
            let pool = db::connect(&config).await?;
            match command {
                AccountMetricsCommands::Clear { yes } => {
                    account_metrics::run_clear(&pool, yes).await?;
                }
                AccountMetricsCommands::Load(args) => {
                    account_metrics::run_load(&pool, &config, &args).await?;
                }
            }
        }
        Commands::Analyze { command } => analyze::run(&config, command).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;
