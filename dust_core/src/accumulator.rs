//! Pulse/epoch state machine.
//!
//! Consumes observations in arrival order and closes an epoch once it has
//! lasted strictly longer than the configured sample duration. Time spent
//! inside pulses (runs of `ParticleDetected`) is summed per epoch.
//!
//! States:
//! - `WaitingForEpochStart`: no epoch open; the next observation opens one.
//! - `Idle`: epoch open, line not low.
//! - `InPulse`: epoch open, a pulse started and has not resolved yet.
//!
//! While `InPulse` observations are consumed without checking for epoch
//! closure. A pulse that crosses the nominal epoch end therefore stretches the
//! epoch instead of being split, and its full length is counted.

use dust_traits::{PinState, Timestamp};
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::model::ConcentrationModel;
use crate::types::{Observation, Sample};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    WaitingForEpochStart,
    Idle,
    InPulse,
}

#[derive(Debug, Clone, Copy)]
enum PulseState {
    Idle,
    InPulse { started_at: Timestamp },
}

/// Mutable totals of the open epoch.
#[derive(Debug, Clone, Copy)]
struct EpochAccumulator {
    epoch_start: Timestamp,
    low_duration: Duration,
    pulse: PulseState,
    latest: Timestamp,
    pulses: u32,
}

impl EpochAccumulator {
    fn open(at: Timestamp) -> Self {
        Self {
            epoch_start: at,
            low_duration: Duration::ZERO,
            pulse: PulseState::Idle,
            latest: at,
            pulses: 0,
        }
    }

    fn resolve_pulse(&mut self, started_at: Timestamp, stop: Timestamp) {
        let len = stop.saturating_since(started_at);
        self.low_duration = self.low_duration.saturating_add(len);
        self.pulse = PulseState::Idle;
        self.pulses = self.pulses.saturating_add(1);
        trace!(pulse_ns = len.as_nanos() as u64, "pulse resolved");
    }

    fn duration(&self) -> Duration {
        self.latest.saturating_since(self.epoch_start)
    }
}

pub struct Accumulator {
    sample_duration: Duration,
    model: ConcentrationModel,
    epoch: Option<EpochAccumulator>,
}

impl Accumulator {
    pub fn new(sample_duration: Duration, model: ConcentrationModel) -> Self {
        Self {
            sample_duration,
            model,
            epoch: None,
        }
    }

    pub fn sample_duration(&self) -> Duration {
        self.sample_duration
    }

    pub fn state(&self) -> AccumulatorState {
        match self.epoch.map(|e| e.pulse) {
            None => AccumulatorState::WaitingForEpochStart,
            Some(PulseState::Idle) => AccumulatorState::Idle,
            Some(PulseState::InPulse { .. }) => AccumulatorState::InPulse,
        }
    }

    /// Low time accumulated so far in the open epoch (resolved pulses only).
    pub fn pending_low_duration(&self) -> Duration {
        self.epoch.map_or(Duration::ZERO, |e| e.low_duration)
    }

    /// Feed one observation; returns the sample if it closed the epoch.
    pub fn push(&mut self, obs: Observation) -> Option<Sample> {
        let epoch = self
            .epoch
            .get_or_insert_with(|| EpochAccumulator::open(obs.timestamp));

        if obs.timestamp < epoch.latest {
            warn!(
                latest_ns = epoch.latest.as_nanos(),
                got_ns = obs.timestamp.as_nanos(),
                "observation timestamp went backwards"
            );
        }
        epoch.latest = obs.timestamp;

        match (epoch.pulse, obs.state) {
            (PulseState::Idle, PinState::ParticleDetected) => {
                epoch.pulse = PulseState::InPulse {
                    started_at: obs.timestamp,
                };
                return None;
            }
            (PulseState::InPulse { .. }, PinState::ParticleDetected) => return None,
            (PulseState::InPulse { started_at }, PinState::NoParticle) => {
                epoch.resolve_pulse(started_at, obs.timestamp);
            }
            (PulseState::Idle, PinState::NoParticle) => {}
        }

        let epoch_duration = epoch.duration();
        if epoch_duration <= self.sample_duration {
            return None;
        }

        let closed = *epoch;
        self.epoch = None;
        debug!(
            epoch_s = epoch_duration.as_secs_f64(),
            low_s = closed.low_duration.as_secs_f64(),
            pulses = closed.pulses,
            "epoch closed"
        );
        Sample::from_epoch(closed.epoch_start, closed.low_duration, epoch_duration, &self.model)
    }

    /// Close the open epoch early, ending any unresolved pulse at the latest
    /// observation. Returns `None` when no epoch is open or it has zero length.
    pub fn flush(&mut self) -> Option<Sample> {
        let mut epoch = self.epoch.take()?;
        if let PulseState::InPulse { started_at } = epoch.pulse {
            epoch.resolve_pulse(started_at, epoch.latest);
        }
        let duration = epoch.duration();
        let sample = Sample::from_epoch(epoch.epoch_start, epoch.low_duration, duration, &self.model);
        if sample.is_none() {
            debug!("partial epoch has zero length; nothing to flush");
        }
        sample
    }

    /// Drop the open epoch. Returns whether there was one.
    pub fn discard(&mut self) -> bool {
        self.epoch.take().is_some()
    }
}
