//! Physics module - joint angles, calibrated range and control signal
//!
//! Re-exports only. All logic in submodules.

mod angles;
mod calibration;
mod control;
mod phase;

pub use calibration::{RangeTracker, NEUTRAL_PERCENTAGE};
pub use control::{ControlSignal, ControlSignalMapper};
pub use phase::{classify_phase, Phase};
