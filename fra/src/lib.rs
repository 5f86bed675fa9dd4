//! Swept frequency response analysis.
//!
//! Drives a DDS stimulus through a ladder of frequencies, measures the
//! peak-to-peak voltage at the input and output of an unknown network, and
//! classifies the resulting gain curve as a filter type. The same amplitude
//! calibration and reference model inversion also back the direct signal
//! setpoints.
//!
//! Hardware is reached only through the [SignalSource] and [Acquire]
//! capabilities and an [embedded_hal::delay::DelayNs] for settling.
#![cfg_attr(not(test), no_std)]

mod analyzer;
pub use analyzer::*;
mod calibration;
pub use calibration::*;
mod classify;
pub use classify::*;
mod model;
pub use model::*;
mod sampler;
pub use sampler::*;
mod settings;
pub use settings::*;
mod source;
pub use source::*;
mod sweep;
pub use sweep::*;

#[cfg(test)]
pub mod testing;
