//! FormCoach Test Harness - synthetic input and scenario validation
//!
//! This crate provides:
//! - Synthetic side-view squat traces (depth, tempo, jitter, dropouts)
//! - Scripted angle sequences for state machine scenarios
//! - End-to-end scenario runs through a session
//! - JSON-lines trace reading and writing

pub mod scenario;
pub mod script;
pub mod trace;

pub use scenario::*;
pub use script::*;
pub use trace::*;
