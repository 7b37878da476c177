//! Tests for configuration resolution and graceful degradation
//!
//! - Missing config files SHALL NOT cause termination
//! - Missing or partial configs → defaults for the absent fields
//! - Priority order: CLI → environment → user config → compiled defaults
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.
//! Tests that manipulate RACKSCAN_CONFIG are marked with #[serial].

mod helpers;

use helpers::LogCapture;
use rackscan_common::config::{
    load_toml_config, write_toml_config, ConfigResolver, ConfigSource, LoggingConfig, TomlConfig,
    CONFIG_ENV_VAR,
};
use rackscan_common::Error;
use tracing::Level;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn test_cli_path_takes_precedence_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/rackscan-from-env.toml");

    let resolver = ConfigResolver::new(Some(PathBuf::from("/tmp/rackscan-from-cli.toml")));
    assert_eq!(
        resolver.resolve(),
        Some(PathBuf::from("/tmp/rackscan-from-cli.toml"))
    );

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli_path() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/rackscan-from-env.toml");

    let resolver = ConfigResolver::new(None);
    assert_eq!(
        resolver.resolve(),
        Some(PathBuf::from("/tmp/rackscan-from-env.toml"))
    );

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_custom_env_var_name() {
    env::set_var("RACKSCAN_TEST_ALT_CONFIG", "/tmp/alt.toml");

    let resolver = ConfigResolver::new(None).with_env_var("RACKSCAN_TEST_ALT_CONFIG");
    assert_eq!(resolver.resolve(), Some(PathBuf::from("/tmp/alt.toml")));

    env::remove_var("RACKSCAN_TEST_ALT_CONFIG");
}

#[test]
#[serial]
fn test_missing_config_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    // Should not panic - should return compiled defaults
    let config = ConfigResolver::new(Some(missing)).load();
    assert_eq!(config, TomlConfig::default());
}

#[test]
#[serial]
fn test_malformed_config_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[analysis\nmax_depth = ").unwrap();

    let config = ConfigResolver::new(Some(path)).load();
    assert_eq!(config.analysis.max_depth, 10);
}

#[test]
fn test_malformed_config_reports_fallback_source() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[analysis\nmax_depth = ").unwrap();

    let loaded = ConfigResolver::new(Some(path.clone())).load_detailed();
    assert!(loaded.is_fallback());
    assert_eq!(loaded.config, TomlConfig::default());
    match &loaded.source {
        ConfigSource::Fallback { path: p, error } => {
            assert_eq!(p, &path);
            assert!(error.contains("Failed to parse"), "unexpected error: {}", error);
        }
        other => panic!("expected fallback, got {:?}", other),
    }
}

#[test]
fn test_fallback_warning_reaches_installed_subscriber() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[analysis]\nworkers = 0\n").unwrap();

    // Load before any subscriber exists, then report once one is installed
    let loaded = ConfigResolver::new(Some(path.clone())).load_detailed();

    let capture = LogCapture::new();
    capture.capture(|| loaded.log_source());

    let record = capture
        .find(Level::WARN, "Failed to load config file")
        .expect("fallback warning was not logged");
    assert!(record
        .fields
        .iter()
        .any(|(k, v)| k == "error" && v.contains("analysis.workers")));
    assert!(record
        .fields
        .iter()
        .any(|(k, v)| k == "path" && v.contains("config.toml")));
}

#[test]
fn test_valid_config_reports_file_source() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[analysis]\nmax_depth = 3\n").unwrap();

    let loaded = ConfigResolver::new(Some(path.clone())).load_detailed();
    assert_eq!(loaded.source, ConfigSource::File(path));
    assert_eq!(loaded.config.analysis.max_depth, 3);

    let capture = LogCapture::new();
    capture.capture(|| loaded.log_source());
    assert!(capture.find(Level::INFO, "Loaded configuration").is_some());
    assert!(capture.find(Level::WARN, "Failed to load").is_none());
}

#[test]
fn test_load_missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let result = load_toml_config(&dir.path().join("nope.toml"));
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn test_partial_config_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
            output_folder = "/tmp/reports"

            [analysis]
            max_depth = 4

            [analysis.custom_device_mappings]
            MyGlitch = "Glitch Box"

            [performance]
            heavy_devices = ["Operator"]
        "#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.output_folder, Some(PathBuf::from("/tmp/reports")));
    assert_eq!(config.analysis.max_depth, 4);
    assert_eq!(config.analysis.min_file_size, 100);
    assert_eq!(
        config.analysis.custom_device_mappings.get("MyGlitch"),
        Some(&"Glitch Box".to_string())
    );
    assert_eq!(config.performance.heavy_devices, vec!["Operator".to_string()]);
    assert_eq!(config.performance.freeze_threshold, 70.0);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[analysis]\nworkers = 0\n").unwrap();

    let err = load_toml_config(&path).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidSetting {
            key: "analysis.workers",
            ..
        }
    ));
}

#[test]
fn test_write_then_load_preserves_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = TomlConfig::default();
    config.output_folder = Some(PathBuf::from("/music/analysis"));
    config.logging = LoggingConfig {
        level: "debug".to_string(),
        file: Some(PathBuf::from("/tmp/rackscan.log")),
    };
    config
        .analysis
        .custom_device_mappings
        .insert("Foo".to_string(), "Foo Deluxe".to_string());

    write_toml_config(&config, &path).unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("toml.tmp").exists());

    let loaded = load_toml_config(&path).unwrap();
    assert_eq!(loaded, config);
}
