//! Runtime configuration types for the measurement pipeline.
//!
//! These are the structs `PinSampler`, `Accumulator` and the runner consume.
//! They are separate from the TOML-deserialized config in `dust_config`.

use std::time::Duration;

/// How the sampler paces pin reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingDiscipline {
    /// One read per tick of a fixed period. Late ticks are skipped, not queued.
    Timer(Duration),
    /// Read as fast as the pin driver returns.
    FreeRunning,
}

/// What the sampler does when a pin read fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadErrorPolicy {
    /// Publish the previous state with a fresh timestamp (skip if none yet).
    #[default]
    HoldLast,
    /// Stop sampling; the queue closes and the pipeline winds down.
    Stop,
}

/// What happens to the in-flight epoch when the pipeline stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPolicy {
    #[default]
    Discard,
    /// Emit the partial epoch if it has non-zero length.
    Flush,
}

#[derive(Debug, Clone)]
pub struct SamplerCfg {
    pub discipline: SamplingDiscipline,
    /// Capacity of the bounded observation queue (min 1).
    pub queue_capacity: usize,
    pub on_read_error: ReadErrorPolicy,
}

impl Default for SamplerCfg {
    fn default() -> Self {
        Self {
            discipline: SamplingDiscipline::Timer(Duration::from_millis(100)),
            queue_capacity: 64,
            on_read_error: ReadErrorPolicy::HoldLast,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EpochCfg {
    /// An epoch closes on the first observation (outside a pulse) at which it
    /// has lasted strictly longer than this.
    pub sample_duration: Duration,
    pub on_shutdown: ShutdownPolicy,
}

impl Default for EpochCfg {
    fn default() -> Self {
        Self {
            sample_duration: Duration::from_secs(5),
            on_shutdown: ShutdownPolicy::Discard,
        }
    }
}
