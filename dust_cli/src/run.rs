//! `run` and `self-check`: assemble pin, store and sync around the pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dust_config::Config;
use dust_core::error::Result;
use dust_core::runner::{self, RunParams, RunSummary};
use dust_core::{CsvSampleStore, DustError, GitArchiver, PeriodicSync};
use dust_traits::{PinReader, SystemClock};

pub type BoxedPin = Box<dyn PinReader + Send>;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub simulate: bool,
    pub seed: Option<u64>,
    pub detect_probability: Option<f64>,
    pub max_samples: Option<u64>,
    pub no_sync: bool,
}

/// Simulator when asked for; otherwise the GPIO pin from `[sensor]`.
pub fn open_pin(
    cfg: &Config,
    simulate: bool,
    seed: Option<u64>,
    detect_probability: Option<f64>,
) -> Result<BoxedPin> {
    if simulate {
        let seed = seed.unwrap_or(dust_hardware::DEFAULT_SEED);
        let mut pin = dust_hardware::SimulatedPin::new(seed);
        if let Some(p) = detect_probability {
            pin = pin.with_detect_probability(p);
        }
        tracing::info!(seed, "using simulated sensor");
        return Ok(Box::new(pin));
    }

    #[cfg(all(feature = "hardware", target_os = "linux"))]
    {
        let pin = dust_hardware::GpioPin::new(cfg.sensor.pin, cfg.sensor.active_low, cfg.sensor.pull_up)
            .map_err(|e| DustError::Hardware(e.to_string()))?;
        tracing::info!(pin = cfg.sensor.pin, "using GPIO sensor");
        Ok(Box::new(pin))
    }
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    {
        let _ = &cfg.sensor;
        Err(DustError::Hardware(
            "built without the `hardware` feature; use --simulate".into(),
        )
        .into())
    }
}

fn start_sync(cfg: &Config, store_path: &Path, disabled: bool) -> Option<PeriodicSync> {
    if disabled || cfg.sync.interval_s == 0 {
        tracing::debug!("periodic sync disabled");
        return None;
    }
    let data_path = std::path::absolute(store_path).unwrap_or_else(|_| store_path.to_path_buf());
    let repo_dir = cfg
        .sync
        .repo_dir
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| data_path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    tracing::info!(
        repo = %repo_dir.display(),
        interval_s = cfg.sync.interval_s,
        remote = %cfg.sync.remote,
        "periodic sync enabled"
    );
    let mut archiver = GitArchiver::new(repo_dir, data_path)
        .with_remote(cfg.sync.remote.clone())
        .with_message(cfg.sync.message.clone())
        .with_pull_first(cfg.sync.pull_first);
    if let Some(chart) = cfg.plot.path.as_deref() {
        let chart = Path::new(chart);
        let chart = std::path::absolute(chart).unwrap_or_else(|_| chart.to_path_buf());
        tracing::info!(chart = %chart.display(), "chart refreshed before each sync");
        archiver = archiver.with_chart(chart, cfg.plot.title.clone());
    }
    Some(PeriodicSync::spawn(
        archiver,
        Duration::from_secs(cfg.sync.interval_s),
    ))
}

fn install_ctrlc(shutdown: &Arc<AtomicBool>) {
    let flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::Relaxed);
    }) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }
}

/// Run until Ctrl-C, `max_samples`, or the sensor stops.
pub fn run_pipeline(cfg: &Config, opts: &RunOptions) -> Result<RunSummary> {
    let pin = open_pin(cfg, opts.simulate, opts.seed, opts.detect_probability)?;
    let store_path = PathBuf::from(&cfg.store.path);
    let mut store = CsvSampleStore::open(&store_path)?;
    let sync = start_sync(cfg, &store_path, opts.no_sync);

    let shutdown = Arc::new(AtomicBool::new(false));
    install_ctrlc(&shutdown);

    let mut params = RunParams::from(cfg);
    params.max_samples = opts.max_samples;
    let summary = runner::run(pin, &mut store, params, SystemClock::new(), shutdown)?;

    if let Some(sync) = sync {
        tracing::debug!(runs = sync.runs(), "stopping periodic sync");
    }
    Ok(summary)
}

/// Open the configured pin and store once and take a single reading.
pub fn self_check(cfg: &Config, simulate: bool) -> Result<String> {
    let mut pin = open_pin(cfg, simulate, None, None)?;
    let state = pin
        .read()
        .map_err(|e| dust_core::hw_error::map_pin_error(&*e))?;
    let store = CsvSampleStore::open(&cfg.store.path)?;
    Ok(format!(
        "self-check ok: pin reads {state:?}, store {} writable",
        store.path().display()
    ))
}
