use std::error::Error;
use std::time::{Duration, Instant};

use dust_core::{PinSampler, ReadErrorPolicy, SamplerCfg, SamplerExit, SamplingDiscipline};
use dust_hardware::{ScriptedPin, SimulatedPin};
use dust_traits::{ManualClock, PinReader, PinState, SystemClock, Timestamp};

const MS: u64 = 1_000_000;

fn cfg(discipline: SamplingDiscipline, capacity: usize, on_err: ReadErrorPolicy) -> SamplerCfg {
    SamplerCfg {
        discipline,
        queue_capacity: capacity,
        on_read_error: on_err,
    }
}

/// Alternates between a good read and a failure, starting with `first_ok`.
struct FlakyPin {
    n: usize,
    first_ok: bool,
}

impl PinReader for FlakyPin {
    fn read(&mut self) -> Result<PinState, Box<dyn Error + Send + Sync>> {
        let i = self.n;
        self.n += 1;
        let ok = (i % 2 == 0) == self.first_ok;
        if !ok {
            return Err(Box::new(std::io::Error::other("glitch")));
        }
        Ok(if (i / 2) % 2 == 0 {
            PinState::ParticleDetected
        } else {
            PinState::NoParticle
        })
    }
}

#[test]
fn timer_sampling_stamps_every_tick() {
    let clock = ManualClock::starting_at(Timestamp::from_nanos(1_000 * MS));
    let (sampler, rx) = PinSampler::spawn(
        ScriptedPin::from_pattern("0110"),
        &cfg(
            SamplingDiscipline::Timer(Duration::from_millis(100)),
            8,
            ReadErrorPolicy::Stop,
        ),
        clock,
    );
    let got: Vec<_> = rx.iter().collect();
    let times: Vec<u64> = got.iter().map(|o| o.timestamp.as_nanos() / MS).collect();
    let states: Vec<PinState> = got.iter().map(|o| o.state).collect();
    assert_eq!(times, [1_000, 1_100, 1_200, 1_300]);
    assert_eq!(
        states,
        [
            PinState::NoParticle,
            PinState::ParticleDetected,
            PinState::ParticleDetected,
            PinState::NoParticle
        ]
    );
    assert_eq!(sampler.observations_published(), 4);
    match sampler.stop() {
        Some(SamplerExit::ReadFailed(e)) => assert!(e.to_string().contains("exhausted")),
        other => panic!("expected ReadFailed, got {other:?}"),
    }
}

#[test]
fn full_queue_applies_backpressure_without_loss() {
    let n = 500;
    let pattern: String = (0..n).map(|i| if i % 3 == 0 { '1' } else { '0' }).collect();
    let (_sampler, rx) = PinSampler::spawn(
        ScriptedPin::from_pattern(&pattern),
        &cfg(
            SamplingDiscipline::Timer(Duration::from_millis(1)),
            1,
            ReadErrorPolicy::Stop,
        ),
        ManualClock::new(),
    );

    let mut received = Vec::with_capacity(n);
    for (i, obs) in rx.iter().enumerate() {
        if i % 50 == 0 {
            // Slow consumer: the producer must wait, not drop.
            std::thread::sleep(Duration::from_millis(5));
        }
        received.push(obs);
    }
    assert_eq!(received.len(), n);
    for (i, obs) in received.iter().enumerate() {
        assert_eq!(obs.timestamp.as_nanos(), i as u64 * MS, "observation {i} out of order");
        let expected = if i % 3 == 0 {
            PinState::ParticleDetected
        } else {
            PinState::NoParticle
        };
        assert_eq!(obs.state, expected);
    }
}

#[test]
fn hold_last_substitutes_previous_state() {
    let (sampler, rx) = PinSampler::spawn(
        FlakyPin {
            n: 0,
            first_ok: true,
        },
        &cfg(
            SamplingDiscipline::Timer(Duration::from_millis(10)),
            16,
            ReadErrorPolicy::HoldLast,
        ),
        ManualClock::new(),
    );
    let got: Vec<_> = rx.iter().take(8).collect();
    drop(sampler);
    let states: Vec<PinState> = got.iter().map(|o| o.state).collect();
    use PinState::{NoParticle as N, ParticleDetected as D};
    assert_eq!(states, [D, D, N, N, D, D, N, N]);
    // Held readings still get their own tick's timestamp.
    assert_eq!(got[1].timestamp.as_nanos(), 10 * MS);
}

#[test]
fn hold_last_skips_when_nothing_to_hold() {
    let (sampler, rx) = PinSampler::spawn(
        FlakyPin {
            n: 0,
            first_ok: false,
        },
        &cfg(
            SamplingDiscipline::Timer(Duration::from_millis(10)),
            16,
            ReadErrorPolicy::HoldLast,
        ),
        ManualClock::new(),
    );
    let first = rx.recv().expect("one observation");
    drop(sampler);
    // Read 0 failed with no prior state, so the first published tick is read 1.
    assert_eq!(first.timestamp.as_nanos(), 10 * MS);
    assert_eq!(first.state, PinState::ParticleDetected);
}

#[test]
fn free_running_timestamps_never_decrease() {
    let (sampler, rx) = PinSampler::spawn(
        SimulatedPin::new(9),
        &cfg(SamplingDiscipline::FreeRunning, 64, ReadErrorPolicy::Stop),
        SystemClock::new(),
    );
    let got: Vec<_> = rx.iter().take(1_000).collect();
    drop(sampler);
    assert!(
        got.windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp)
    );
}

#[test]
fn sampler_shutdown_is_prompt_when_blocked() {
    let (sampler, rx) = PinSampler::spawn(
        SimulatedPin::new(1),
        &cfg(
            SamplingDiscipline::Timer(Duration::from_millis(1)),
            1,
            ReadErrorPolicy::HoldLast,
        ),
        ManualClock::new(),
    );
    // Let the queue fill so the sampler is parked in publish.
    std::thread::sleep(Duration::from_millis(20));
    assert!(!sampler.is_finished());

    let start = Instant::now();
    let exit = sampler.stop();
    let shutdown_time = start.elapsed();
    assert!(matches!(exit, Some(SamplerExit::Shutdown)));
    assert!(
        shutdown_time < Duration::from_millis(200),
        "Shutdown took {shutdown_time:?}, expected < 200ms"
    );
    drop(rx);
}

#[test]
fn sampler_exits_when_consumer_drops() {
    let (sampler, rx) = PinSampler::spawn(
        SimulatedPin::new(1),
        &cfg(
            SamplingDiscipline::Timer(Duration::from_millis(1)),
            1,
            ReadErrorPolicy::HoldLast,
        ),
        ManualClock::new(),
    );
    drop(rx);
    let deadline = Instant::now() + Duration::from_secs(2);
    while !sampler.is_finished() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(matches!(sampler.stop(), Some(SamplerExit::ConsumerGone)));
}
