//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Config file read when `--config` is not given (optional).
pub const DEFAULT_CONFIG: &str = "etc/dust_config.toml";
/// Chart written by `plot` when neither `--out` nor [plot].path is set.
pub const DEFAULT_CHART: &str = "chart.svg";

#[derive(Parser, Debug)]
#[command(name = "dust", version, about = "Dust sensor concentration logger")]
pub struct Cli {
    /// Path to config TOML (defaults to etc/dust_config.toml if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sample the sensor and append one row per epoch to the store
    Run {
        /// Use the seeded simulator instead of the GPIO pin
        #[arg(long, action = ArgAction::SetTrue)]
        simulate: bool,
        /// Simulator seed
        #[arg(long, value_name = "N")]
        seed: Option<u64>,
        /// Simulator probability that a read reports particles
        #[arg(long, value_name = "P")]
        detect_probability: Option<f64>,
        /// Stop after this many samples
        #[arg(long, value_name = "N")]
        max_samples: Option<u64>,
        /// Override [store].path
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,
        /// Override [epoch].sample_duration_ms
        #[arg(long, value_name = "MS")]
        sample_duration_ms: Option<u64>,
        /// Override [sampling].interval_ms
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
        /// Do not start the periodic git sync
        #[arg(long, action = ArgAction::SetTrue)]
        no_sync: bool,
    },
    /// Validate config, open the pin (or simulator) and the store, then exit
    SelfCheck {
        #[arg(long, action = ArgAction::SetTrue)]
        simulate: bool,
    },
    /// Render the sample store as a concentration-over-time chart
    Plot {
        /// Output file (`.svg`, or `.html` for a standalone page); defaults to
        /// [plot].path, then chart.svg
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Override [store].path
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,
    },
    /// Summarize the sample store
    Report {
        /// Show this many most recent rows
        #[arg(long, default_value_t = 5)]
        last: usize,
        /// Override [store].path
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,
    },
}
