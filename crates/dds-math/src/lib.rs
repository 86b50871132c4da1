//! Discrete dynamic sampler math utilities.

pub mod math;

pub use math::ema::Ema;
pub use math::stable::*;
