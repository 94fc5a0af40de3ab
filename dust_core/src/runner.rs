use crossbeam_channel as xch;
use dust_traits::PinReader;
use dust_traits::clock::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::accumulator::Accumulator;
use crate::config::{EpochCfg, SamplerCfg, ShutdownPolicy};
use crate::error::{DustError, Result};
use crate::model::ConcentrationModel;
use crate::sampler::{PinSampler, SamplerExit};
use crate::sink::SampleSink;
use crate::types::Sample;

/// How often the consumer wakes to check the shutdown flag while idle.
const RECV_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Default)]
pub struct RunParams {
    pub sampler: SamplerCfg,
    pub epoch: EpochCfg,
    pub model: ConcentrationModel,
    /// Stop after this many samples (runs forever when `None`).
    pub max_samples: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown flag was raised.
    Shutdown,
    /// The sampler ended and the queue drained.
    SourceClosed,
    MaxSamples,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stop: StopReason,
    /// Samples handed to the sink, including a flushed partial one.
    pub samples: u64,
    /// Observations consumed by the accumulator.
    pub observations: u64,
    pub partial_flushed: bool,
    pub partial_discarded: bool,
    /// Set when the sampler stopped on a read error.
    pub sampler_error: Option<DustError>,
}

fn emit<K: SampleSink + ?Sized>(sink: &mut K, sample: &Sample) -> Result<()> {
    sink.append(sample)?;
    tracing::info!(
        timestamp = sample.epoch_start_secs,
        low_s = sample.low_duration_secs,
        epoch_s = sample.epoch_duration_secs,
        concentration = sample.concentration,
        "sample"
    );
    Ok(())
}

/// Run the measurement pipeline until shutdown, source exhaustion or
/// `max_samples`.
///
/// The sampler runs on its own thread; the accumulator runs on the caller's
/// thread and hands every closed epoch to `sink`. A sink error is returned
/// immediately (the sampler is stopped on the way out).
///
/// On shutdown the sampler is stopped first and the observations already
/// queued are still accumulated before `EpochCfg::on_shutdown` decides the
/// fate of the open epoch. No more than `max_samples` samples reach the sink,
/// even from the drained backlog; once the limit is hit the open epoch is
/// discarded whatever the policy says.
pub fn run<P, C, K>(
    pin: P,
    sink: &mut K,
    params: RunParams,
    clock: C,
    shutdown: Arc<AtomicBool>,
) -> Result<RunSummary>
where
    P: PinReader + Send + 'static,
    C: Clock + Send + 'static,
    K: SampleSink + ?Sized,
{
    let (sampler, rx) = PinSampler::spawn(pin, &params.sampler, clock);
    let mut acc = Accumulator::new(params.epoch.sample_duration, params.model);
    let mut summary = RunSummary {
        stop: StopReason::SourceClosed,
        samples: 0,
        observations: 0,
        partial_flushed: false,
        partial_discarded: false,
        sampler_error: None,
    };
    let reached_max = |n: u64| params.max_samples.is_some_and(|max| n >= max);

    tracing::info!(
        sample_duration_ms = acc.sample_duration().as_millis() as u64,
        queue_capacity = params.sampler.queue_capacity,
        "pipeline start"
    );

    summary.stop = if reached_max(0) {
        StopReason::MaxSamples
    } else {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                break StopReason::Shutdown;
            }
            match rx.recv_timeout(RECV_POLL) {
                Ok(obs) => {
                    summary.observations += 1;
                    if let Some(sample) = acc.push(obs) {
                        emit(sink, &sample)?;
                        summary.samples += 1;
                        if reached_max(summary.samples) {
                            break StopReason::MaxSamples;
                        }
                    }
                }
                Err(xch::RecvTimeoutError::Timeout) => continue,
                Err(xch::RecvTimeoutError::Disconnected) => break StopReason::SourceClosed,
            }
        }
    };

    let published = sampler.observations_published();
    if let Some(SamplerExit::ReadFailed(e)) = sampler.stop() {
        summary.sampler_error = Some(e);
    }

    if summary.stop == StopReason::Shutdown {
        // The sampler has been joined, so the backlog is finite.
        for obs in rx.try_iter() {
            if reached_max(summary.samples) {
                break;
            }
            summary.observations += 1;
            if let Some(sample) = acc.push(obs) {
                emit(sink, &sample)?;
                summary.samples += 1;
            }
        }
    }

    // A flushed partial epoch would count against the limit too.
    let on_shutdown = if reached_max(summary.samples) {
        ShutdownPolicy::Discard
    } else {
        params.epoch.on_shutdown
    };
    match on_shutdown {
        ShutdownPolicy::Flush => {
            if let Some(sample) = acc.flush() {
                tracing::info!("flushing partial epoch");
                emit(sink, &sample)?;
                summary.samples += 1;
                summary.partial_flushed = true;
            }
        }
        ShutdownPolicy::Discard => {
            if acc.discard() {
                tracing::info!("discarding partial epoch");
                summary.partial_discarded = true;
            }
        }
    }

    tracing::info!(
        stop = ?summary.stop,
        samples = summary.samples,
        observations = summary.observations,
        published,
        "pipeline stopped"
    );
    Ok(summary)
}
