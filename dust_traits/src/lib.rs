//! Hardware seams shared by the dust logger crates.
pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};

/// Logical state of the sensor output line.
///
/// The sensor pulls its output low while particles pass the sensing chamber;
/// backends translate the electrical level into this enum so nothing above
/// the driver needs to know which level means "detected".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinState {
    ParticleDetected,
    NoParticle,
}

impl PinState {
    #[inline]
    pub fn is_detected(self) -> bool {
        matches!(self, PinState::ParticleDetected)
    }
}

/// A digital input that can be polled for the sensor's current state.
pub trait PinReader {
    fn read(&mut self) -> Result<PinState, Box<dyn std::error::Error + Send + Sync>>;
}

impl<P: PinReader + ?Sized> PinReader for Box<P> {
    fn read(&mut self) -> Result<PinState, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read()
    }
}
