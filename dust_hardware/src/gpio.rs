use dust_traits::{PinReader, PinState};
use rppal::gpio::{Gpio, InputPin, Level};
use tracing::{debug, trace};

use crate::error::{HwError, Result};

/// Sensor output line wired to a Raspberry Pi GPIO input (BCM numbering).
pub struct GpioPin {
    input: InputPin,
    detected_level: Level,
}

impl GpioPin {
    /// Open `bcm_pin` as an input. The sensor pulls the line low while
    /// particles are detected, so `active_low` is normally true.
    pub fn new(bcm_pin: u8, active_low: bool, pull_up: bool) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(format!("open gpio: {e}")))?;
        let pin = gpio
            .get(bcm_pin)
            .map_err(|e| HwError::Gpio(format!("open sensor pin {bcm_pin}: {e}")))?;
        let input = if pull_up {
            pin.into_input_pullup()
        } else {
            pin.into_input()
        };
        debug!(pin = bcm_pin, active_low, pull_up, "sensor pin ready");
        Ok(Self {
            input,
            detected_level: if active_low { Level::Low } else { Level::High },
        })
    }
}

impl PinReader for GpioPin {
    fn read(&mut self) -> std::result::Result<PinState, Box<dyn std::error::Error + Send + Sync>> {
        let level = self.input.read();
        trace!(?level, "gpio read");
        Ok(if level == self.detected_level {
            PinState::ParticleDetected
        } else {
            PinState::NoParticle
        })
    }
}
