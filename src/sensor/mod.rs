// src/sensor/mod.rs
//! Body-tracking sensor abstraction

pub mod traits;
pub mod types;
pub mod script;
pub mod simulator;

#[cfg(test)]
mod tests;

pub use traits::*;
pub use types::*;
pub use script::{script_for, BodyPose, MotionScript};
pub use simulator::{ScriptedSkeletonSource, SimulatorConfig, SimulatorError};
