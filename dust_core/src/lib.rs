#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Measurement pipeline for a low-pulse-occupancy dust sensor (hardware-agnostic).
//!
//! The sensor pulls its output low while particles pass the sensing chamber.
//! This crate turns a stream of timestamped pin readings into one
//! concentration `Sample` per epoch. All pin access goes through
//! `dust_traits::PinReader`.
//!
//! ## Architecture
//!
//! - **Sampling**: `PinSampler` thread publishing `Observation`s on a bounded queue (`sampler`)
//! - **Accumulation**: pulse/epoch state machine (`accumulator`)
//! - **Conversion**: occupancy ratio → concentration (`model`)
//! - **Persistence**: append-only CSV store (`sink`)
//! - **Charting**: concentration-over-time SVG from the store (`plot`)
//! - **Archiving**: periodic git add/commit/push, independent of sampling (`sync`)
//! - **Orchestration**: wires the pieces together and applies the shutdown policy (`runner`)

pub mod accumulator;
pub mod config;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod model;
pub mod plot;
pub mod runner;
pub mod sampler;
pub mod sink;
pub mod sync;
pub mod types;

pub use accumulator::{Accumulator, AccumulatorState};
pub use config::{EpochCfg, ReadErrorPolicy, SamplerCfg, SamplingDiscipline, ShutdownPolicy};
pub use error::{DustError, Result};
pub use model::{ConcentrationModel, lpo_ratio};
pub use plot::{render_svg, write_chart};
pub use runner::{RunParams, RunSummary, StopReason};
pub use sampler::{PinSampler, SamplerExit};
pub use sink::{CsvSampleStore, MemorySink, SampleSink, read_samples};
pub use sync::{Archiver, GitArchiver, PeriodicSync, SyncReport};
pub use types::{Observation, Sample};
