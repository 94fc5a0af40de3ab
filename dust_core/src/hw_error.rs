//! Maps `Box<dyn Error>` from the `PinReader` boundary to typed `DustError`.
//!
//! The traits in `dust_traits` use `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `dust_hardware::HwError` downcasting.

use crate::error::DustError;

/// Map a pin-read error to a typed `DustError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to treating the error as a hardware fault.
pub fn map_pin_error(e: &(dyn std::error::Error + 'static)) -> DustError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<dust_hardware::error::HwError>() {
            return match hw {
                dust_hardware::error::HwError::ScriptExhausted(_) => {
                    DustError::Sampler(hw.to_string())
                }
                dust_hardware::error::HwError::Io(io) => DustError::Io(io.to_string()),
                other => DustError::Hardware(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>() {
        return DustError::Io(io.to_string());
    }
    DustError::Hardware(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_stay_io() {
        let e = std::io::Error::other("bus gone");
        assert!(matches!(map_pin_error(&e), DustError::Io(m) if m.contains("bus gone")));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn exhausted_script_is_a_sampler_error() {
        let e = dust_hardware::error::HwError::ScriptExhausted(3);
        assert!(matches!(map_pin_error(&e), DustError::Sampler(_)));
        let g = dust_hardware::error::HwError::Gpio("no /dev/gpiomem".into());
        assert!(matches!(map_pin_error(&g), DustError::Hardware(_)));
    }
}
