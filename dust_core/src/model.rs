//! Occupancy ratio → particle concentration.

use std::time::Duration;

/// Cubic calibration curve `c3·r³ + c2·r² + c1·r + c0`.
///
/// `r` is the low-pulse-occupancy as a fraction in `[0, 1]`, not a
/// percentage. Non-finite input never yields a finite concentration: NaN stays
/// NaN, and +∞ comes out as NaN because the cubic and quadratic terms cancel
/// as `∞ − ∞`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcentrationModel {
    pub cubic: f64,
    pub quadratic: f64,
    pub linear: f64,
    pub constant: f64,
}

impl ConcentrationModel {
    /// Empirical curve for the stock sensor.
    pub const DEFAULT: ConcentrationModel = ConcentrationModel {
        cubic: 1.1,
        quadratic: -3.8,
        linear: 520.0,
        constant: 0.62,
    };

    pub const fn new(cubic: f64, quadratic: f64, linear: f64, constant: f64) -> Self {
        Self {
            cubic,
            quadratic,
            linear,
            constant,
        }
    }

    #[inline]
    pub fn concentration(&self, ratio: f64) -> f64 {
        self.cubic * ratio.powi(3) + self.quadratic * ratio.powi(2) + self.linear * ratio
            + self.constant
    }
}

impl Default for ConcentrationModel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Fraction of `epoch` spent low. `None` when the epoch has zero length.
#[inline]
pub fn lpo_ratio(low: Duration, epoch: Duration) -> Option<f64> {
    if epoch.is_zero() {
        return None;
    }
    Some(low.as_secs_f64() / epoch.as_secs_f64())
}
