use dust_config::load_path;
use std::fs;
use tempfile::tempdir;

#[test]
fn loads_and_validates_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dust.toml");
    fs::write(&path, "[epoch]\nsample_duration_ms = 1000\n").unwrap();
    let cfg = load_path(&path).expect("load");
    assert_eq!(cfg.epoch.sample_duration_ms, 1000);
}

#[test]
fn reports_missing_file_with_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.toml");
    let err = load_path(&path).expect_err("missing file");
    assert!(format!("{err}").contains("nope.toml"));
}

#[test]
fn validation_errors_surface() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[sampling]\nqueue_capacity = 0\n").unwrap();
    let err = load_path(&path).expect_err("invalid");
    assert!(format!("{err}").contains("queue_capacity"));
}
