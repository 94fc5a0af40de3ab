//! Values that flow through the pipeline.

use dust_traits::{PinState, Timestamp};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::model::{ConcentrationModel, lpo_ratio};

/// One pin reading together with the instant it was taken.
///
/// The pair is published as a single value so the timestamp can never drift
/// apart from the state it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub timestamp: Timestamp,
    pub state: PinState,
}

impl Observation {
    #[inline]
    pub fn new(timestamp: Timestamp, state: PinState) -> Self {
        Self { timestamp, state }
    }

    #[inline]
    pub fn at_nanos(ns: u64, state: PinState) -> Self {
        Self::new(Timestamp::from_nanos(ns), state)
    }
}

/// Concentration estimate for one closed epoch.
///
/// Serde field names match the columns of the sample store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Start of the epoch, seconds since the Unix epoch
    #[serde(rename = "timestamp")]
    pub epoch_start_secs: f64,
    /// Time spent inside pulses during the epoch
    #[serde(rename = "particlesDetectedDuration")]
    pub low_duration_secs: f64,
    /// Realized epoch length (may overshoot the configured duration by one pulse)
    #[serde(rename = "sampleDuration")]
    pub epoch_duration_secs: f64,
    pub concentration: f64,
}

impl Sample {
    /// Build a sample from raw epoch totals. Returns `None` for a zero-length
    /// epoch, whose occupancy ratio is undefined.
    pub fn from_epoch(
        epoch_start: Timestamp,
        low: Duration,
        epoch: Duration,
        model: &ConcentrationModel,
    ) -> Option<Self> {
        let ratio = lpo_ratio(low, epoch)?;
        Some(Self {
            epoch_start_secs: epoch_start.as_secs_f64(),
            low_duration_secs: low.as_secs_f64(),
            epoch_duration_secs: epoch.as_secs_f64(),
            concentration: model.concentration(ratio),
        })
    }

    /// Fraction of the epoch spent inside pulses.
    pub fn ratio(&self) -> f64 {
        self.low_duration_secs / self.epoch_duration_secs
    }

    /// Store columns, each with three fractional digits.
    pub fn csv_fields(&self) -> [String; 4] {
        [
            format!("{:.3}", self.epoch_start_secs),
            format!("{:.3}", self.low_duration_secs),
            format!("{:.3}", self.epoch_duration_secs),
            format!("{:.3}", self.concentration),
        ]
    }

    /// Newline-terminated store row.
    pub fn to_csv_row(&self) -> String {
        let mut row = self.csv_fields().join(",");
        row.push('\n');
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_three_fractional_digits() {
        let s = Sample {
            epoch_start_secs: 1_600_000_000.123_456,
            low_duration_secs: 1.0,
            epoch_duration_secs: 6.0,
            concentration: 87.205_6,
        };
        assert_eq!(s.to_csv_row(), "1600000000.123,1.000,6.000,87.206\n");
    }

    #[test]
    fn zero_length_epoch_has_no_sample() {
        let m = ConcentrationModel::default();
        assert!(Sample::from_epoch(Timestamp::ZERO, Duration::ZERO, Duration::ZERO, &m).is_none());
    }
}
