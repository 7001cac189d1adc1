//! FormCoach Runtime - per-session frame pipeline
//!
//! Every frame goes through the same stages:
//! 1. Extract joint angles from the landmark frame
//! 2. Advance the rep state machine
//! 3. Dispatch throttled feedback
//! 4. Deliver feedback to the sink
//! 5. Report
//!
//! Frames whose landmarks are incomplete stop after stage 1 and leave the
//! session untouched.

pub mod config;
pub mod logging;
pub mod registry;
pub mod session;

pub use config::*;
pub use registry::*;
pub use session::*;
