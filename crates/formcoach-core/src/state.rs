//! Posture state - where in a squat repetition the subject currently is

use std::fmt;

use serde::{Deserialize, Serialize};

/// Posture state of the rep state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureState {
    /// Standing upright
    #[default]
    Normal,
    /// Descending or ascending
    Transition,
    /// Bottom position reached
    Pass,
}

impl PostureState {
    pub fn all() -> &'static [PostureState] {
        &[
            PostureState::Normal,
            PostureState::Transition,
            PostureState::Pass,
        ]
    }

    /// Is the subject somewhere inside a repetition?
    #[inline]
    pub fn is_in_rep(self) -> bool {
        !matches!(self, PostureState::Normal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PostureState::Normal => "normal",
            PostureState::Transition => "transition",
            PostureState::Pass => "pass",
        }
    }
}

impl fmt::Display for PostureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
