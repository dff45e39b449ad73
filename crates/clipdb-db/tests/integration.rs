//! Offline tests for clipdb-db pool configuration and input types.
//! These tests do not require a live database connection.

use clipdb_core::{AppConfig, Environment};
use clipdb_db::{NewMetric, NewPublication, PoolConfig, ReferentPatch};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3001),
        log_level: "info".to_string(),
        cors_origins: vec![],
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        gemini_api_key: None,
        gemini_model: "gemini-1.5-pro".to_string(),
        gemini_base_url: "http://localhost".to_string(),
        vision_request_timeout_secs: 120,
        video_poll_interval_ms: 2000,
        video_max_wait_secs: 600,
        video_max_poll_attempts: 300,
        scratch_dir: PathBuf::from("/tmp/clipdb"),
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn new_publication_fills_defaults() {
    let input: NewPublication = serde_json::from_str(
        r#"{
            "title": "Morning routine",
            "content_type": "Vlog",
            "hashtags": ["routine"],
            "metrics": {"views": 1000, "likes": 90, "comments": 5, "shares": 5}
        }"#,
    )
    .expect("valid payload");

    assert_eq!(input.description, "");
    assert_eq!(input.duration_secs, 0);
    assert!(!input.sound_trending);
    assert!(input.published_at.is_none());
    let metrics: &NewMetric = input.metrics.as_ref().expect("metrics");
    assert!((metrics.engagement_rate() - 10.0).abs() < 1e-9);
}

#[test]
fn referent_patch_leaves_absent_fields_unset() {
    let patch: ReferentPatch =
        serde_json::from_str(r#"{"followers": 1200}"#).expect("valid patch");
    assert_eq!(patch.followers, Some(1200));
    assert!(patch.username.is_none());
    assert!(patch.notes.is_none());
}
