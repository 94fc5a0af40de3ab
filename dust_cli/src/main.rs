#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod logging;
mod report;
mod run;

use std::path::{Path, PathBuf};

use clap::Parser;
use dust_config::Config;
use dust_core::DustError;
use dust_core::error::Result;

use crate::cli::{Cli, Commands, DEFAULT_CHART, DEFAULT_CONFIG, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::run::RunOptions;

fn config_err(e: eyre::Report) -> eyre::Report {
    DustError::Config(e.to_string()).into()
}

/// `--config` if given, else the default path if it exists, else built-in defaults.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.map(Path::to_path_buf).or_else(|| {
        let p = PathBuf::from(DEFAULT_CONFIG);
        p.exists().then_some(p)
    });
    match path {
        Some(p) => dust_config::load_path(&p).map_err(config_err),
        None => Ok(Config::default()),
    }
}

fn real_main(cli: Cli) -> Result<()> {
    let mut cfg = load_config(cli.config.as_deref())?;

    // Command-line overrides are validated like the file itself.
    if let Commands::Run {
        store,
        sample_duration_ms,
        interval_ms,
        ..
    } = &cli.cmd
    {
        if let Some(p) = store {
            cfg.store.path = p.display().to_string();
        }
        if let Some(ms) = sample_duration_ms {
            cfg.epoch.sample_duration_ms = *ms;
        }
        if let Some(ms) = interval_ms {
            cfg.sampling.interval_ms = *ms;
        }
        cfg.validate().map_err(config_err)?;
    }

    logging::init(&cfg.logging, cli.json, cli.log_level.as_deref())?;
    tracing::debug!(config = ?cli.config, "configuration loaded");

    match cli.cmd {
        Commands::Run {
            simulate,
            seed,
            detect_probability,
            max_samples,
            no_sync,
            ..
        } => {
            let opts = RunOptions {
                simulate,
                seed,
                detect_probability,
                max_samples,
                no_sync,
            };
            let summary = run::run_pipeline(&cfg, &opts)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "stop": format!("{:?}", summary.stop),
                        "samples": summary.samples,
                        "observations": summary.observations,
                        "partial_flushed": summary.partial_flushed,
                        "partial_discarded": summary.partial_discarded,
                        "store": cfg.store.path,
                    })
                );
            } else {
                println!(
                    "stopped ({:?}): {} samples from {} observations written to {}",
                    summary.stop, summary.samples, summary.observations, cfg.store.path
                );
            }
            if let Some(e) = summary.sampler_error {
                return Err(e.into());
            }
        }
        Commands::SelfCheck { simulate } => {
            println!("{}", run::self_check(&cfg, simulate)?);
        }
        Commands::Plot { out, store } => {
            let store = store.unwrap_or_else(|| PathBuf::from(&cfg.store.path));
            let out = out
                .or_else(|| cfg.plot.path.as_ref().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CHART));
            let n = dust_core::write_chart(&store, &out, &cfg.plot.title)?;
            println!("plotted {n} samples to {}", out.display());
        }
        Commands::Report { last, store } => {
            let path = store.unwrap_or_else(|| PathBuf::from(&cfg.store.path));
            println!("{}", report::render(&path, last, cli.json)?);
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if !cli.json {
        let _ = color_eyre::install();
    }

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}
