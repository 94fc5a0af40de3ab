#![no_main]
use std::time::Duration;

use dust_core::{Accumulator, ConcentrationModel, Observation};
use dust_traits::PinState;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u16, Vec<(u32, bool)>)| {
    let (threshold_ms, steps) = input;
    let mut acc = Accumulator::new(
        Duration::from_millis(u64::from(threshold_ms)),
        ConcentrationModel::default(),
    );
    let mut t: u64 = 0;
    for (gap, detected) in steps {
        // Arbitrary gaps, including backwards jumps when the high bit is set.
        t = if gap & 0x8000_0000 != 0 {
            t.saturating_sub(u64::from(gap & 0x7fff_ffff))
        } else {
            t.saturating_add(u64::from(gap))
        };
        let state = if detected {
            PinState::ParticleDetected
        } else {
            PinState::NoParticle
        };
        if let Some(s) = acc.push(Observation::at_nanos(t, state)) {
            assert!(s.low_duration_secs >= 0.0);
            assert!(s.epoch_duration_secs > 0.0);
        }
    }
    if let Some(s) = acc.flush() {
        assert!(s.epoch_duration_secs > 0.0);
    }
});
