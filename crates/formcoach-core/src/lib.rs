//! FormCoach Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout the squat analysis engine:
//! - Identifiers (SessionId)
//! - Time primitives (SessionTime)
//! - Posture states and fault kinds
//! - Error types

pub mod error;
pub mod fault;
pub mod id;
pub mod state;
pub mod time;

pub use error::*;
pub use fault::*;
pub use id::*;
pub use state::*;
pub use time::*;
