//! Error types for the squat analysis engine

use thiserror::Error;

/// Core FormCoach errors
///
/// Per-frame form faults are NOT errors. They are domain signals carried by
/// [`crate::FaultKind`]. Only conditions that prevent a frame (or a session)
/// from being evaluated end up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    // Geometry errors
    #[error("Invalid geometry: zero-length or non-finite vector")]
    InvalidGeometry,

    // Frame errors
    #[error("Incomplete frame: landmark {joint} missing or below visibility threshold")]
    IncompleteFrame { joint: &'static str },

    // Configuration errors
    #[error("Invalid threshold profile: {field} {reason}")]
    InvalidProfile { field: &'static str, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FormError {
    /// Errors that only cost the current frame
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            FormError::InvalidGeometry | FormError::IncompleteFrame { .. }
        )
    }
}

/// Result type for FormCoach operations
pub type FormResult<T> = Result<T, FormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_local_errors() {
        assert!(FormError::InvalidGeometry.is_frame_local());
        assert!(FormError::IncompleteFrame { joint: "left_knee" }.is_frame_local());
        assert!(!FormError::Config("bad".into()).is_frame_local());
    }

    #[test]
    fn test_profile_error_message() {
        let err = FormError::InvalidProfile {
            field: "knee_thresh",
            reason: "must be non-decreasing".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid threshold profile: knee_thresh must be non-decreasing"
        );
    }
}
