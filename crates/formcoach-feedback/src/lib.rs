//! FormCoach Feedback - from active faults to spoken/printed coaching cues
//!
//! The dispatcher sees the set of faults holding on every frame and lets at
//! most one message through per cooldown window. Which fault gets the
//! message is decided by a fixed priority order over [`FaultKind`]:
//! depth before alignment before posture before generic reminders.
//!
//! [`FaultKind`]: formcoach_core::FaultKind

pub mod catalog;
pub mod dispatcher;
pub mod sink;

pub use catalog::*;
pub use dispatcher::*;
pub use sink::*;
