//! Pin backends for the dust sensor output line.
//!
//! - `SimulatedPin`: seeded pseudo-random line, reproducible across runs
//! - `ScriptedPin`: replays a fixed sequence of states, then errors
//! - `GpioPin` (feature `hardware`): Raspberry Pi input via rppal
pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;

use dust_traits::{PinReader, PinState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::HwError;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gpio::GpioPin;

/// Seed used when none is given; keeps simulated runs comparable.
pub const DEFAULT_SEED: u64 = 42;

/// Simulated sensor line: each read independently reports a particle with
/// probability `detect_probability`.
pub struct SimulatedPin {
    rng: StdRng,
    detect_probability: f64,
}

impl SimulatedPin {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            detect_probability: 0.5,
        }
    }

    /// Probability is clamped to `[0.0, 1.0]`; NaN falls back to 0.5.
    pub fn with_detect_probability(mut self, p: f64) -> Self {
        self.detect_probability = if p.is_nan() { 0.5 } else { p.clamp(0.0, 1.0) };
        self
    }
}

impl Default for SimulatedPin {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl PinReader for SimulatedPin {
    fn read(&mut self) -> Result<PinState, Box<dyn std::error::Error + Send + Sync>> {
        let state = if self.rng.gen_bool(self.detect_probability) {
            PinState::ParticleDetected
        } else {
            PinState::NoParticle
        };
        tracing::trace!(?state, "simulated pin read");
        Ok(state)
    }
}

/// Replays a fixed list of states in order. Once the script runs out every
/// read fails with `HwError::ScriptExhausted`.
#[derive(Debug, Clone)]
pub struct ScriptedPin {
    states: Vec<PinState>,
    idx: usize,
}

impl ScriptedPin {
    pub fn new(states: impl Into<Vec<PinState>>) -> Self {
        Self {
            states: states.into(),
            idx: 0,
        }
    }

    /// Build from a compact string: `1`/`L` = detected, `0`/`H` = no particle.
    /// Any other character is ignored.
    pub fn from_pattern(pattern: &str) -> Self {
        let states = pattern
            .chars()
            .filter_map(|c| match c {
                '1' | 'L' | 'l' => Some(PinState::ParticleDetected),
                '0' | 'H' | 'h' => Some(PinState::NoParticle),
                _ => None,
            })
            .collect::<Vec<_>>();
        Self::new(states)
    }

    pub fn remaining(&self) -> usize {
        self.states.len().saturating_sub(self.idx)
    }
}

impl PinReader for ScriptedPin {
    fn read(&mut self) -> Result<PinState, Box<dyn std::error::Error + Send + Sync>> {
        match self.states.get(self.idx).copied() {
            Some(s) => {
                self.idx += 1;
                Ok(s)
            }
            None => Err(Box::new(HwError::ScriptExhausted(self.idx))),
        }
    }
}
