use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("CLIPDB_ENV", "development"));
    let bind_addr = parse_addr("CLIPDB_BIND_ADDR", "0.0.0.0:3001")?;
    let log_level = or_default("CLIPDB_LOG_LEVEL", "info");
    let cors_origins = parse_list(&or_default("CLIPDB_CORS_ORIGINS", ""));

    let db_max_connections = parse_u32("CLIPDB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("CLIPDB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("CLIPDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let gemini_api_key = lookup("GEMINI_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty());
    let gemini_model = or_default("CLIPDB_GEMINI_MODEL", "gemini-1.5-pro");
    let gemini_base_url = or_default(
        "CLIPDB_GEMINI_BASE_URL",
        "https://generativelanguage.googleapis.com",
    );
    let vision_request_timeout_secs = parse_u64("CLIPDB_VISION_REQUEST_TIMEOUT_SECS", "120")?;

    let video_poll_interval_ms = parse_u64("CLIPDB_VIDEO_POLL_INTERVAL_MS", "2000")?;
    let video_max_wait_secs = parse_u64("CLIPDB_VIDEO_MAX_WAIT_SECS", "600")?;
    let video_max_poll_attempts = parse_u32("CLIPDB_VIDEO_MAX_POLL_ATTEMPTS", "300")?;
    if video_poll_interval_ms == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CLIPDB_VIDEO_POLL_INTERVAL_MS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    let scratch_dir = lookup("CLIPDB_SCRATCH_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map_or_else(|| std::env::temp_dir().join("clipdb"), PathBuf::from);

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        cors_origins,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        gemini_api_key,
        gemini_model,
        gemini_base_url,
        vision_request_timeout_secs,
        video_poll_interval_ms,
        video_max_wait_secs,
        video_max_poll_attempts,
        scratch_dir,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
