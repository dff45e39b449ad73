mod api;
mod middleware;
mod vision;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    vision::VisionService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = clipdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting clipdb-server");

    let pool_config = clipdb_db::PoolConfig::from_app_config(&config);
    let pool = clipdb_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = clipdb_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let vision = VisionService::from_app_config(&config)?.map(Arc::new);
    let app = build_app(AppState { pool, vision }, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
