//! Overhead-bounded discrete dynamic sampler.
//!
//! This crate provides:
//! - [`DynamicSampler`]: the per-stream control loop deciding which events to sample
//! - [`SamplerConfig`]: calibration constants, loadable from TOML/JSON/env
//! - [`ReadjustObserver`]: hook receiving a [`ReadjustmentSnapshot`] every window
//! - [`clock`]: clock-reading wrappers for hosts that don't supply timestamps
//! - [`logging`]: optional `tracing` subscriber bootstrap

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod sampler;

pub use clock::{Clock, ClockedSampler, ManualClock, MonotonicClock};
pub use config::SamplerConfig;
pub use error::{Result, SamplerError};
pub use sampler::{
    DynamicSampler, MinuteProjection, ReadjustObserver, ReadjustmentSnapshot, SamplerStats,
};
