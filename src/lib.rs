//! Transit Simulation Library
//!
//! A passenger rail network simulation that runs headless, driven by an
//! external frame clock.

pub mod advisory;
pub mod driver;
pub mod simulation;
