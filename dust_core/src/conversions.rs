//! `From` implementations bridging `dust_config` types to `dust_core` types.

use std::time::Duration;

use crate::config::{EpochCfg, ReadErrorPolicy, SamplerCfg, SamplingDiscipline, ShutdownPolicy};
use crate::model::ConcentrationModel;
use crate::runner::RunParams;

// ── SamplerCfg ───────────────────────────────────────────────────────────────

impl From<dust_config::ReadErrorPolicy> for ReadErrorPolicy {
    fn from(p: dust_config::ReadErrorPolicy) -> Self {
        match p {
            dust_config::ReadErrorPolicy::HoldLast => Self::HoldLast,
            dust_config::ReadErrorPolicy::Stop => Self::Stop,
        }
    }
}

impl From<&dust_config::SamplingCfg> for SamplerCfg {
    fn from(c: &dust_config::SamplingCfg) -> Self {
        let discipline = match c.mode {
            dust_config::SamplingMode::Timer => {
                SamplingDiscipline::Timer(Duration::from_millis(c.interval_ms))
            }
            dust_config::SamplingMode::Free => SamplingDiscipline::FreeRunning,
        };
        Self {
            discipline,
            queue_capacity: c.queue_capacity,
            on_read_error: c.on_read_error.into(),
        }
    }
}

// ── EpochCfg ─────────────────────────────────────────────────────────────────

impl From<dust_config::ShutdownPolicy> for ShutdownPolicy {
    fn from(p: dust_config::ShutdownPolicy) -> Self {
        match p {
            dust_config::ShutdownPolicy::Discard => Self::Discard,
            dust_config::ShutdownPolicy::Flush => Self::Flush,
        }
    }
}

impl From<&dust_config::EpochCfg> for EpochCfg {
    fn from(c: &dust_config::EpochCfg) -> Self {
        Self {
            sample_duration: Duration::from_millis(c.sample_duration_ms),
            on_shutdown: c.on_shutdown.into(),
        }
    }
}

// ── ConcentrationModel ───────────────────────────────────────────────────────

impl From<&dust_config::CalibrationCfg> for ConcentrationModel {
    fn from(c: &dust_config::CalibrationCfg) -> Self {
        Self::new(c.cubic, c.quadratic, c.linear, c.constant)
    }
}

// ── RunParams ────────────────────────────────────────────────────────────────

impl From<&dust_config::Config> for RunParams {
    fn from(c: &dust_config::Config) -> Self {
        Self {
            sampler: (&c.sampling).into(),
            epoch: (&c.epoch).into(),
            model: c
                .calibration
                .as_ref()
                .map(ConcentrationModel::from)
                .unwrap_or_default(),
            max_samples: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_map_to_runtime_defaults() {
        let cfg = dust_config::load_toml("").unwrap();
        let params = RunParams::from(&cfg);
        assert_eq!(
            params.sampler.discipline,
            SamplingDiscipline::Timer(Duration::from_millis(100))
        );
        assert_eq!(params.sampler.queue_capacity, 64);
        assert_eq!(params.epoch.sample_duration, Duration::from_secs(5));
        assert_eq!(params.epoch.on_shutdown, ShutdownPolicy::Discard);
        assert_eq!(params.model, ConcentrationModel::DEFAULT);
        assert_eq!(params.max_samples, None);
    }

    #[test]
    fn free_mode_and_overrides() {
        let cfg = dust_config::load_toml(
            r#"
[sampling]
mode = "free"
on_read_error = "stop"
[epoch]
on_shutdown = "flush"
[calibration]
cubic = 0.0
quadratic = 0.0
linear = 100.0
constant = 0.0
"#,
        )
        .unwrap();
        let params = RunParams::from(&cfg);
        assert_eq!(params.sampler.discipline, SamplingDiscipline::FreeRunning);
        assert_eq!(params.sampler.on_read_error, ReadErrorPolicy::Stop);
        assert_eq!(params.epoch.on_shutdown, ShutdownPolicy::Flush);
        assert_eq!(params.model.concentration(0.5), 50.0);
    }
}
