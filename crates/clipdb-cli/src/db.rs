//! `db` subcommand handlers.

use clipdb_core::AppConfig;
use clipdb_db::PoolConfig;
use sqlx::PgPool;

pub(crate) async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool =
        clipdb_db::connect_pool(&config.database_url, PoolConfig::from_app_config(config)).await?;
    Ok(pool)
}

pub(crate) async fn run_db_ping(pool: &PgPool) -> anyhow::Result<()> {
    clipdb_db::ping(pool).await?;
    println!("database ok");
    Ok(())
}

pub(crate) async fn run_db_migrate(pool: &PgPool) -> anyhow::Result<()> {
    let applied = clipdb_db::run_migrations(pool).await?;
    tracing::info!(applied, "migrations complete");
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Seeds demo data. Not idempotent: every run inserts another copy.
pub(crate) async fn run_db_seed(pool: &PgPool) -> anyhow::Result<()> {
    let summary = clipdb_db::seed_demo_data(pool).await?;
    println!(
        "seeded {} publications, {} metric snapshots, {} planned items, {} referents",
        summary.publications, summary.metrics, summary.planned_content, summary.referents
    );
    Ok(())
}
