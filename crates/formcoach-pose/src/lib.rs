//! FormCoach Pose - landmarks in, joint angles out
//!
//! The pose-estimation model is an external collaborator. It hands us one
//! [`LandmarkFrame`] per video frame: named body joints located in the frame.
//! This crate turns that frame into the handful of angles the rep state
//! machine needs.
//!
//! # Pipeline
//!
//! LandmarkFrame → pixel coordinates → body side selection → AngleSet
//!
//! Missing or low-visibility landmarks and degenerate geometry are reported
//! as errors so the caller can skip the frame instead of feeding a poisoned
//! angle into the state machine.

pub mod angles;
pub mod geometry;
pub mod landmark;

pub use angles::*;
pub use geometry::*;
pub use landmark::*;
