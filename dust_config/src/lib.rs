#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the dust sensor logger.
//!
//! Every section is optional; an empty file yields the defaults below, which
//! match a sensor on BCM pin 2 sampled every 100 ms into 5 s epochs.
//!
//! ```toml
//! [sensor]
//! pin = 2
//! active_low = true
//!
//! [sampling]
//! mode = "timer"        # or "free"
//! interval_ms = 100
//! queue_capacity = 64
//! on_read_error = "hold_last"   # or "stop"
//!
//! [epoch]
//! sample_duration_ms = 5000
//! on_shutdown = "discard"       # or "flush"
//!
//! [store]
//! path = "data.csv"
//!
//! [sync]
//! interval_s = 600              # 0 disables
//! remote = "origin"
//!
//! [plot]
//! path = "index.html"           # unset: no chart
//! ```
use serde::Deserialize;
use std::path::Path;

/// BCM GPIO numbers exposed on the 40-pin header.
pub const MAX_BCM_PIN: u8 = 27;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SensorCfg {
    /// BCM pin number of the sensor output line
    pub pin: u8,
    /// Particles are reported by pulling the line low
    pub active_low: bool,
    /// Enable the internal pull-up resistor
    pub pull_up: bool,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            pin: 2,
            active_low: true,
            pull_up: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMode {
    /// Read once per `interval_ms` tick
    #[default]
    Timer,
    /// Read as fast as the pin driver allows
    Free,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReadErrorPolicy {
    /// Repeat the previous state with a fresh timestamp
    #[default]
    HoldLast,
    /// End sampling; the pipeline stops once the queue drains
    Stop,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplingCfg {
    pub mode: SamplingMode,
    /// Tick period for `mode = "timer"`; ignored in free-running mode
    pub interval_ms: u64,
    /// Bounded queue size between sampler and accumulator
    pub queue_capacity: usize,
    pub on_read_error: ReadErrorPolicy,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            mode: SamplingMode::Timer,
            interval_ms: 100,
            queue_capacity: 64,
            on_read_error: ReadErrorPolicy::HoldLast,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    /// Drop the in-flight epoch
    #[default]
    Discard,
    /// Emit the in-flight epoch as a short final sample
    Flush,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EpochCfg {
    /// An epoch closes once it has lasted strictly longer than this
    pub sample_duration_ms: u64,
    pub on_shutdown: ShutdownPolicy,
}

impl Default for EpochCfg {
    fn default() -> Self {
        Self {
            sample_duration_ms: 5_000,
            on_shutdown: ShutdownPolicy::Discard,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreCfg {
    /// CSV file the samples are appended to
    pub path: String,
}

impl Default for StoreCfg {
    fn default() -> Self {
        Self {
            path: "data.csv".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncCfg {
    /// Seconds between archive pushes; 0 disables syncing
    pub interval_s: u64,
    pub remote: String,
    pub message: String,
    /// Run `git pull` before committing
    pub pull_first: bool,
    /// Repository to run git in; defaults to the store's directory
    pub repo_dir: Option<String>,
}

impl Default for SyncCfg {
    fn default() -> Self {
        Self {
            interval_s: 600,
            remote: "origin".to_string(),
            message: "update data".to_string(),
            pull_first: false,
            repo_dir: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PlotCfg {
    /// Chart rendered before every sync commit (`.svg`, or `.html` wrapping
    /// the SVG); no chart when unset
    pub path: Option<String>,
    pub title: String,
}

impl Default for PlotCfg {
    fn default() -> Self {
        Self {
            path: None,
            title: "Airborne particulate concentration".to_string(),
        }
    }
}

/// Optional override of the cubic occupancy → concentration curve.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct CalibrationCfg {
    pub cubic: f64,
    pub quadratic: f64,
    pub linear: f64,
    pub constant: f64,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub sensor: SensorCfg,
    pub sampling: SamplingCfg,
    pub epoch: EpochCfg,
    pub store: StoreCfg,
    pub sync: SyncCfg,
    pub plot: PlotCfg,
    pub calibration: Option<CalibrationCfg>,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_path(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {}", path.display(), e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {}: {}", path.display(), e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sensor
        if self.sensor.pin > MAX_BCM_PIN {
            eyre::bail!("sensor.pin must be in 0..={MAX_BCM_PIN}");
        }

        // Sampling
        if self.sampling.mode == SamplingMode::Timer && self.sampling.interval_ms == 0 {
            eyre::bail!("sampling.interval_ms must be >= 1 in timer mode");
        }
        if self.sampling.interval_ms > 60 * 1000 {
            eyre::bail!("sampling.interval_ms is unreasonably large (>1min)");
        }
        if self.sampling.queue_capacity == 0 {
            eyre::bail!("sampling.queue_capacity must be >= 1");
        }
        if self.sampling.queue_capacity > 1_000_000 {
            eyre::bail!("sampling.queue_capacity is unreasonably large (>1000000)");
        }

        // Epoch
        if self.epoch.sample_duration_ms == 0 {
            eyre::bail!("epoch.sample_duration_ms must be >= 1");
        }
        if self.epoch.sample_duration_ms > 24 * 60 * 60 * 1000 {
            eyre::bail!("epoch.sample_duration_ms is unreasonably large (>24h)");
        }
        if self.sampling.mode == SamplingMode::Timer
            && self.sampling.interval_ms > self.epoch.sample_duration_ms
        {
            eyre::bail!("sampling.interval_ms must not exceed epoch.sample_duration_ms");
        }

        // Store
        if self.store.path.trim().is_empty() {
            eyre::bail!("store.path must not be empty");
        }

        // Sync
        if self.sync.interval_s > 0 && self.sync.remote.trim().is_empty() {
            eyre::bail!("sync.remote must not be empty when sync is enabled");
        }
        if self.sync.interval_s > 0 && self.sync.message.trim().is_empty() {
            eyre::bail!("sync.message must not be empty when sync is enabled");
        }

        // Plot
        if let Some(p) = self.plot.path.as_deref()
            && p.trim().is_empty()
        {
            eyre::bail!("plot.path must not be empty when set");
        }

        // Calibration
        if let Some(c) = self.calibration {
            let all_finite = [c.cubic, c.quadratic, c.linear, c.constant]
                .iter()
                .all(|v| v.is_finite());
            if !all_finite {
                eyre::bail!("calibration coefficients must be finite");
            }
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {r:?}");
        }
        if let Some(l) = self.logging.level.as_deref()
            && !matches!(
                l.to_ascii_lowercase().as_str(),
                "error" | "warn" | "info" | "debug" | "trace"
            )
        {
            eyre::bail!("logging.level must be one of error|warn|info|debug|trace, got {l:?}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = load_toml("").unwrap();
        assert_eq!(cfg.sensor.pin, 2);
        assert!(cfg.sensor.active_low);
        assert_eq!(cfg.sampling.mode, SamplingMode::Timer);
        assert_eq!(cfg.sampling.interval_ms, 100);
        assert_eq!(cfg.sampling.queue_capacity, 64);
        assert_eq!(cfg.epoch.sample_duration_ms, 5_000);
        assert_eq!(cfg.epoch.on_shutdown, ShutdownPolicy::Discard);
        assert_eq!(cfg.store.path, "data.csv");
        assert_eq!(cfg.sync.interval_s, 600);
        assert!(cfg.calibration.is_none());
        assert!(cfg.plot.path.is_none());
        cfg.validate().unwrap();
    }
}
