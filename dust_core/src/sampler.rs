//! Background pin sampling.
//!
//! Spawns a thread that owns the `PinReader`, stamps every reading with the
//! clock and publishes the pair on a bounded channel. A full channel blocks
//! the sampler (backpressure); observations are never dropped or reordered.
//! Timer-paced and free-running variants are provided.
//!
//! Safety: Each `PinSampler` spawns exactly one thread that is automatically
//! shut down when the `PinSampler` is dropped, preventing thread leaks.
use crossbeam_channel as xch;
use dust_traits::clock::Clock;
use dust_traits::{PinReader, PinState};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::config::{ReadErrorPolicy, SamplerCfg, SamplingDiscipline};
use crate::error::DustError;
use crate::hw_error::map_pin_error;
use crate::types::Observation;

/// How long a blocked publish waits before re-checking the shutdown flag.
const PUBLISH_POLL: Duration = Duration::from_millis(50);

/// Why the sampler thread ended.
#[derive(Debug, Clone)]
pub enum SamplerExit {
    /// Shutdown was requested through the handle.
    Shutdown,
    /// The receiving end of the queue was dropped.
    ConsumerGone,
    /// A read failed under `ReadErrorPolicy::Stop`.
    ReadFailed(DustError),
}

pub struct PinSampler {
    published: Arc<AtomicU64>,
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<SamplerExit>>,
}

impl PinSampler {
    /// Start sampling `pin`. The returned receiver yields observations in the
    /// order they were taken.
    pub fn spawn<P, C>(pin: P, cfg: &SamplerCfg, clock: C) -> (Self, xch::Receiver<Observation>)
    where
        P: PinReader + Send + 'static,
        C: Clock + Send + 'static,
    {
        let (tx, rx) = xch::bounded(cfg.queue_capacity.max(1));
        let shutdown = Arc::new(AtomicBool::new(false));
        let published = Arc::new(AtomicU64::new(0));
        let worker = Worker {
            pin,
            clock,
            tx,
            discipline: cfg.discipline,
            on_read_error: cfg.on_read_error,
            shutdown: shutdown.clone(),
            published: published.clone(),
        };

        let join_handle = std::thread::spawn(move || {
            let exit = worker.run();
            tracing::trace!(?exit, "Sampler thread exiting cleanly");
            exit
        });

        (
            Self {
                published,
                shutdown,
                join_handle: Some(join_handle),
            },
            rx,
        )
    }

    /// Number of observations handed to the queue so far.
    pub fn observations_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .is_none_or(std::thread::JoinHandle::is_finished)
    }

    /// Signal shutdown, wait for the thread and report why it ended.
    /// `None` if the thread panicked or was already joined.
    pub fn stop(mut self) -> Option<SamplerExit> {
        self.shutdown.store(true, Ordering::Relaxed);
        let handle = self.join_handle.take()?;
        match handle.join() {
            Ok(exit) => Some(exit),
            Err(e) => {
                tracing::warn!(?e, "Sampler thread panicked");
                None
            }
        }
    }
}

impl Drop for PinSampler {
    fn drop(&mut self) {
        // The thread exits:
        // 1. Immediately if it's between reads (checking shutdown flag)
        // 2. Within PUBLISH_POLL if it's blocked on a full queue
        // 3. After the current pin read or tick sleep otherwise
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(_) => {
                    tracing::trace!("Sampler thread joined successfully");
                }
                Err(e) => {
                    // Thread panicked; log but don't propagate (we're in Drop)
                    tracing::warn!(?e, "Sampler thread panicked during shutdown");
                }
            }
        }
    }
}

struct Worker<P, C> {
    pin: P,
    clock: C,
    tx: xch::Sender<Observation>,
    discipline: SamplingDiscipline,
    on_read_error: ReadErrorPolicy,
    shutdown: Arc<AtomicBool>,
    published: Arc<AtomicU64>,
}

impl<P: PinReader, C: Clock> Worker<P, C> {
    fn run(mut self) -> SamplerExit {
        let mut last: Option<PinState> = None;
        let mut next_tick = self.clock.now();

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                tracing::debug!("Sampler thread received shutdown signal");
                return SamplerExit::Shutdown;
            }

            let timestamp = self.clock.now();
            let state = match self.pin.read() {
                Ok(s) => Some(s),
                Err(e) => {
                    let err = map_pin_error(&*e);
                    match self.on_read_error {
                        ReadErrorPolicy::Stop => {
                            tracing::error!(error = %err, "pin read failed; stopping sampler");
                            return SamplerExit::ReadFailed(err);
                        }
                        ReadErrorPolicy::HoldLast => {
                            tracing::warn!(error = %err, held = ?last, "pin read failed; holding last state");
                            last
                        }
                    }
                }
            };

            if let Some(state) = state {
                last = Some(state);
                if let Err(exit) = self.publish(Observation::new(timestamp, state)) {
                    return exit;
                }
                self.published.fetch_add(1, Ordering::Relaxed);
            }

            if let SamplingDiscipline::Timer(period) = self.discipline {
                // Check shutdown before sleep to avoid unnecessary delay
                if self.shutdown.load(Ordering::Relaxed) {
                    return SamplerExit::Shutdown;
                }
                next_tick = next_tick.saturating_add(period);
                let now = self.clock.now();
                if next_tick > now {
                    self.clock.sleep(next_tick.saturating_since(now));
                } else {
                    // Running late: drop the missed ticks instead of bursting.
                    next_tick = now;
                }
            }
        }
    }

    /// Blocking send that still honors shutdown while the queue is full.
    fn publish(&self, mut obs: Observation) -> Result<(), SamplerExit> {
        loop {
            match self.tx.send_timeout(obs, PUBLISH_POLL) {
                Ok(()) => return Ok(()),
                Err(xch::SendTimeoutError::Timeout(back)) => {
                    if self.shutdown.load(Ordering::Relaxed) {
                        return Err(SamplerExit::Shutdown);
                    }
                    tracing::trace!("observation queue full; waiting");
                    obs = back;
                }
                Err(xch::SendTimeoutError::Disconnected(_)) => {
                    tracing::debug!("Sampler consumer disconnected, exiting thread");
                    return Err(SamplerExit::ConsumerGone);
                }
            }
        }
    }
}
