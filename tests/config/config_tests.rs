use multifit_rs::{FitConfig, FitEngine, FitError};
use std::fs;

#[test]
fn test_json_round_trip() {
    let config = FitConfig::default()
        .with_starts(8)
        .with_seed(99)
        .with_parallel(true)
        .with_ftol(1e-10)
        .with_incremental_preview(true);

    let json = config.to_json().unwrap();
    let back = FitConfig::from_json(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_load_json_file() {
    let path = std::env::temp_dir().join(format!("multifit-config-{}.json", std::process::id()));
    fs::write(&path, r#"{ "starts": 2, "improvement_delta": 0.5 }"#).unwrap();

    let config = FitConfig::load_json(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(config.starts, 2);
    assert_eq!(config.improvement_delta, 0.5);
    assert!(config.scale_covariance);

    let engine = FitEngine::with_config(config.clone());
    assert_eq!(engine.config(), &config);
}

#[test]
fn test_missing_file() {
    let path = std::env::temp_dir().join("multifit-config-does-not-exist.json");
    assert!(matches!(FitConfig::load_json(path), Err(FitError::Io(_))));
}
