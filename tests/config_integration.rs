//! Loading benchmark configuration from disk

mod common;

use channel_scaling::config::{BenchConfig, Tuning};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
pool_capacity = 6
source_interval_ms = 2

[stages]
stage1_ms = 7
sink_ms = 3

[factors]
tuned = [1, 1, 5, 5]
"#
    )
    .unwrap();

    let config = BenchConfig::load(file.path()).unwrap();
    assert_eq!(config.pool_capacity, 6);
    assert_eq!(config.source_interval(), Some(Duration::from_millis(2)));
    assert_eq!(config.stages.delays()[0], Duration::from_millis(7));
    assert_eq!(config.stages.delays()[3], Duration::from_millis(3));
    assert_eq!(config.factors.for_tuning(Tuning::Tuned), [1, 1, 5, 5]);
    assert_eq!(config.factors.for_tuning(Tuning::Untuned), [2, 1, 2, 2]);
}

#[test]
fn test_saved_config_loads_back() {
    let config = common::fast_config();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(config.to_toml().unwrap().as_bytes()).unwrap();

    assert_eq!(BenchConfig::load(file.path()).unwrap(), config);
}

#[test]
fn test_missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = BenchConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read"));
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "pool_capacity = 0").unwrap();
    let err = BenchConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().starts_with("Invalid config"));
    assert!(err.to_string().contains("pool_capacity"));

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "pool_capacity = \"many\"").unwrap();
    assert!(BenchConfig::load(file.path()).is_err());
}
