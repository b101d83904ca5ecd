//! A 2D gas of equal-mass elastic discs whose spatial Shannon entropy is
//! sampled into a rolling time series.
//!
//! The crate owns the physics and the measurements; drawing and input wiring
//! belong to the caller, who drives [`core::Simulation::step`] once per frame
//! and reads [`core::Simulation::views`] and [`core::Simulation::history`].

pub mod config;
pub mod core;
pub mod error;

#[cfg(feature = "python")]
mod python;

pub use crate::config::SimConfig;
pub use crate::core::Simulation;
pub use crate::error::{Error, Result};
