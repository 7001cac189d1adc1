//! FormCoach State Engine - threshold profiles and rep segmentation
//!
//! This crate implements the squat rep state machine:
//! - Skill-tier threshold profiles
//! - Posture state classification (normal / transition / pass)
//! - Rep counting and rep quality
//! - Persistent fault detection
//! - Inactivity detection

pub mod machine;
pub mod profile;

pub use machine::*;
pub use profile::*;
