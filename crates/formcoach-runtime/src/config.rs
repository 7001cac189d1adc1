//! Session configuration

use std::path::Path;
use std::time::Duration;

use formcoach_core::{FormError, FormResult};
use formcoach_feedback::FeedbackConfig;
use formcoach_pose::AngleExtractor;
use formcoach_state::{MachineConfig, SkillTier, ThresholdProfile};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Per-session configuration
///
/// Every field has a default, so `{}` is a valid configuration file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Skill tier name; unknown names fall back to beginner
    pub tier: String,
    /// Seconds between two feedback messages (clamped to 1-10)
    pub cooldown_secs: f64,
    /// Feedback events kept in the session history
    pub history_limit: usize,
    /// Minimum landmark visibility for a frame to count as complete
    pub min_visibility: f32,
    /// Longest step the inactivity timer takes across a frame gap
    pub max_frame_gap_ms: u64,
    /// Zero the rep counters when the subject goes inactive (off by default)
    pub reset_counts_on_inactivity: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let feedback = FeedbackConfig::default();
        let machine = MachineConfig::default();

        SessionConfig {
            tier: SkillTier::Beginner.as_str().to_string(),
            cooldown_secs: feedback.cooldown.as_secs_f64(),
            history_limit: feedback.history_limit,
            min_visibility: AngleExtractor::default().min_visibility,
            max_frame_gap_ms: machine.max_frame_gap.as_millis() as u64,
            reset_counts_on_inactivity: machine.reset_counts_on_inactivity,
        }
    }
}

impl SessionConfig {
    /// Configuration for a tier name, everything else default
    pub fn for_tier(tier: impl Into<String>) -> Self {
        SessionConfig {
            tier: tier.into(),
            ..SessionConfig::default()
        }
    }

    /// Parse a JSON configuration
    pub fn from_json_str(json: &str) -> FormResult<Self> {
        serde_json::from_str(json).map_err(|e| FormError::Config(e.to_string()))
    }

    /// Read a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> FormResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| FormError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Resolved skill tier
    pub fn skill_tier(&self) -> SkillTier {
        SkillTier::resolve(&self.tier)
    }

    /// Threshold profile of the configured tier
    pub fn profile(&self) -> ThresholdProfile {
        ThresholdProfile::for_skill(self.skill_tier())
    }

    pub fn feedback_config(&self) -> FeedbackConfig {
        FeedbackConfig::with_cooldown_secs(self.cooldown_secs).with_history_limit(self.history_limit)
    }

    pub fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            max_frame_gap: Duration::from_millis(self.max_frame_gap_ms),
            reset_counts_on_inactivity: self.reset_counts_on_inactivity,
        }
    }

    pub fn extractor(&self) -> AngleExtractor {
        let min_visibility = if self.min_visibility.is_finite() {
            self.min_visibility.clamp(0.0, 1.0)
        } else {
            warn!(
                min_visibility = self.min_visibility,
                "invalid visibility threshold, using default"
            );
            AngleExtractor::default().min_visibility
        };
        AngleExtractor::new(min_visibility)
    }
}
