use dust_config::{ReadErrorPolicy, SamplingMode, ShutdownPolicy, load_toml};
use rstest::rstest;

#[test]
fn parses_full_config() {
    let toml = r#"
[sensor]
pin = 17
active_low = false
pull_up = true

[sampling]
mode = "free"
interval_ms = 0
queue_capacity = 256
on_read_error = "stop"

[epoch]
sample_duration_ms = 30000
on_shutdown = "flush"

[store]
path = "/var/lib/dust/data.csv"

[sync]
interval_s = 3600
remote = "backup"
message = "added rows"
pull_first = true
repo_dir = "/var/lib/dust"

[calibration]
cubic = 1004388.0
quadratic = -28273.0
linear = 51483.0
constant = -5.46

[plot]
path = "index.html"
title = "St Nicholas Park"

[logging]
file = "dust.log"
level = "debug"
rotation = "daily"
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.sensor.pin, 17);
    assert!(!cfg.sensor.active_low);
    assert!(cfg.sensor.pull_up);
    assert_eq!(cfg.sampling.mode, SamplingMode::Free);
    assert_eq!(cfg.sampling.on_read_error, ReadErrorPolicy::Stop);
    assert_eq!(cfg.epoch.on_shutdown, ShutdownPolicy::Flush);
    assert_eq!(cfg.sync.repo_dir.as_deref(), Some("/var/lib/dust"));
    assert_eq!(cfg.plot.path.as_deref(), Some("index.html"));
    assert_eq!(cfg.plot.title, "St Nicholas Park");
    let cal = cfg.calibration.expect("calibration present");
    assert_eq!(cal.constant, -5.46);
}

#[test]
fn free_running_ignores_zero_interval() {
    let cfg = load_toml("[sampling]\nmode = \"free\"\ninterval_ms = 0\n").unwrap();
    cfg.validate().expect("free mode does not need an interval");
}

#[rstest]
#[case("[sensor]\npin = 40\n", "sensor.pin")]
#[case("[sampling]\ninterval_ms = 0\n", "interval_ms must be >= 1")]
#[case("[sampling]\nqueue_capacity = 0\n", "queue_capacity must be >= 1")]
#[case("[epoch]\nsample_duration_ms = 0\n", "sample_duration_ms must be >= 1")]
#[case(
    "[epoch]\nsample_duration_ms = 50\n[sampling]\ninterval_ms = 100\n",
    "must not exceed"
)]
#[case("[store]\npath = \"  \"\n", "store.path")]
#[case("[sync]\nremote = \"\"\n", "sync.remote")]
#[case("[plot]\npath = \"\"\n", "plot.path")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
#[case("[logging]\nlevel = \"loud\"\n", "logging.level")]
#[case(
    "[calibration]\ncubic = nan\nquadratic = 0.0\nlinear = 1.0\nconstant = 0.0\n",
    "finite"
)]
fn rejects_invalid(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "{msg:?} does not mention {needle:?}");
}

#[test]
fn sync_remote_may_be_empty_when_disabled() {
    let cfg = load_toml("[sync]\ninterval_s = 0\nremote = \"\"\n").unwrap();
    cfg.validate().expect("disabled sync needs no remote");
}

#[rstest]
#[case("[sampling]\nmode = \"burst\"\n")]
#[case("[epoch]\non_shutdown = \"keep\"\n")]
#[case("[sensor]\npin = -1\n")]
fn rejects_unparseable(#[case] toml: &str) {
    assert!(load_toml(toml).is_err());
}
