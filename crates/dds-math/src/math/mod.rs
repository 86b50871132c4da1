//! Core math modules.

pub mod ema;
pub mod stable;
