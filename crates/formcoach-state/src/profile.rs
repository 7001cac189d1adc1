//! Threshold profiles per skill tier
//!
//! Profiles are configuration, not behaviour: immutable tables of angle bands
//! and thresholds, selected once per session.

use std::fmt;
use std::time::Duration;

use formcoach_core::{FormError, FormResult, PostureState};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Skill tier of the subject
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillTier {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Pro,
}

impl SkillTier {
    /// Parse a tier name (case-insensitive)
    pub fn parse(name: &str) -> Option<SkillTier> {
        match name.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(SkillTier::Beginner),
            "intermediate" => Some(SkillTier::Intermediate),
            "advanced" => Some(SkillTier::Advanced),
            "pro" => Some(SkillTier::Pro),
            _ => None,
        }
    }

    /// Resolve a tier name, falling back to beginner for unknown names
    pub fn resolve(name: &str) -> SkillTier {
        SkillTier::parse(name).unwrap_or_else(|| {
            warn!(tier = name, "unknown skill tier, using beginner thresholds");
            SkillTier::Beginner
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SkillTier::Beginner => "beginner",
            SkillTier::Intermediate => "intermediate",
            SkillTier::Advanced => "advanced",
            SkillTier::Pro => "pro",
        }
    }
}

impl fmt::Display for SkillTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed interval of degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AngleBand {
    pub low: f64,
    pub high: f64,
}

impl AngleBand {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    #[inline]
    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.low && angle <= self.high
    }
}

/// Hip-knee-vertical bands for the three posture states
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostureBands {
    pub normal: AngleBand,
    pub trans: AngleBand,
    pub pass: AngleBand,
}

impl PostureBands {
    /// Band containing the angle; `None` in the gaps and beyond the outer bands
    pub fn classify(&self, angle: f64) -> Option<PostureState> {
        if self.normal.contains(angle) {
            Some(PostureState::Normal)
        } else if self.trans.contains(angle) {
            Some(PostureState::Transition)
        } else if self.pass.contains(angle) {
            Some(PostureState::Pass)
        } else {
            None
        }
    }
}

/// Threshold profile for one skill tier
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProfile {
    /// Tier this profile was built for
    pub tier: SkillTier,
    /// Hip-knee-vertical bands driving the posture state
    pub hip_knee_vert: PostureBands,
    /// Acceptable torso lean at the hip, `[low, high]`
    pub hip_thresh: [f64; 2],
    /// Maximum shank lean at the ankle
    pub ankle_thresh: f64,
    /// Knee severity bands, ascending
    pub knee_thresh: [f64; 3],
    /// Maximum shoulder offset before the subject counts as misaligned
    pub offset_thresh: f64,
    /// Seconds without a posture change before the subject counts as inactive
    pub inactive_thresh: f64,
    /// Consecutive violating frames before a fault is persistent
    pub cnt_frame_thresh: u32,
}

impl Default for ThresholdProfile {
    fn default() -> Self {
        Self::beginner()
    }
}

impl ThresholdProfile {
    /// Beginner thresholds
    pub fn beginner() -> Self {
        ThresholdProfile {
            tier: SkillTier::Beginner,
            hip_knee_vert: PostureBands {
                normal: AngleBand::new(0.0, 32.0),
                trans: AngleBand::new(35.0, 65.0),
                pass: AngleBand::new(70.0, 95.0),
            },
            hip_thresh: [10.0, 50.0],
            ankle_thresh: 45.0,
            knee_thresh: [50.0, 70.0, 95.0],
            offset_thresh: 35.0,
            inactive_thresh: 15.0,
            cnt_frame_thresh: 50,
        }
    }

    /// Pro thresholds: deeper pass band, stricter ankle and hip
    pub fn pro() -> Self {
        ThresholdProfile {
            tier: SkillTier::Pro,
            hip_knee_vert: PostureBands {
                normal: AngleBand::new(0.0, 32.0),
                trans: AngleBand::new(35.0, 65.0),
                pass: AngleBand::new(80.0, 95.0),
            },
            hip_thresh: [15.0, 50.0],
            ankle_thresh: 30.0,
            knee_thresh: [50.0, 80.0, 95.0],
            offset_thresh: 35.0,
            inactive_thresh: 15.0,
            cnt_frame_thresh: 50,
        }
    }

    /// Beginner thresholds with tier-specific hip and ankle overrides
    pub fn custom(tier: SkillTier) -> Self {
        let mut profile = Self::beginner();
        profile.tier = tier;

        match tier {
            SkillTier::Intermediate => {
                profile.hip_thresh = [12.0, 45.0];
                profile.ankle_thresh = 40.0;
            }
            SkillTier::Advanced => {
                profile.hip_thresh = [15.0, 40.0];
                profile.ankle_thresh = 35.0;
            }
            SkillTier::Beginner | SkillTier::Pro => {}
        }

        profile
    }

    /// Profile for a tier
    pub fn for_skill(tier: SkillTier) -> Self {
        match tier {
            SkillTier::Beginner => Self::beginner(),
            SkillTier::Intermediate | SkillTier::Advanced => Self::custom(tier),
            SkillTier::Pro => Self::pro(),
        }
    }

    /// Profile for a tier name; unknown names get beginner thresholds
    pub fn for_tier(name: &str) -> Self {
        Self::for_skill(SkillTier::resolve(name))
    }

    /// Posture state for a hip-knee-vertical angle, if it falls in a band
    #[inline]
    pub fn classify(&self, hip_knee_vertical: i32) -> Option<PostureState> {
        self.hip_knee_vert.classify(hip_knee_vertical as f64)
    }

    /// Check the profile invariants
    ///
    /// Every band has `low <= high`, the hip pair and the knee triple are
    /// non-decreasing, scalars are finite and non-negative, the inactivity
    /// threshold fits a [`Duration`], and at least one frame is needed to make
    /// a fault persistent.
    pub fn validate(&self) -> FormResult<()> {
        check_band("hip_knee_vert.normal", &self.hip_knee_vert.normal)?;
        check_band("hip_knee_vert.trans", &self.hip_knee_vert.trans)?;
        check_band("hip_knee_vert.pass", &self.hip_knee_vert.pass)?;
        check_ascending("hip_thresh", &self.hip_thresh)?;
        check_ascending("knee_thresh", &self.knee_thresh)?;
        check_scalar("ankle_thresh", self.ankle_thresh)?;
        check_scalar("offset_thresh", self.offset_thresh)?;
        check_scalar("inactive_thresh", self.inactive_thresh)?;
        if Duration::try_from_secs_f64(self.inactive_thresh).is_err() {
            return Err(FormError::InvalidProfile {
                field: "inactive_thresh",
                reason: format!("out of range, got {}", self.inactive_thresh),
            });
        }

        if self.cnt_frame_thresh == 0 {
            return Err(FormError::InvalidProfile {
                field: "cnt_frame_thresh",
                reason: "must be at least 1".into(),
            });
        }

        Ok(())
    }
}

fn check_scalar(field: &'static str, value: f64) -> FormResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(FormError::InvalidProfile {
            field,
            reason: format!("must be finite and non-negative, got {}", value),
        });
    }
    Ok(())
}

fn check_band(field: &'static str, band: &AngleBand) -> FormResult<()> {
    check_scalar(field, band.low)?;
    check_scalar(field, band.high)?;
    if band.low > band.high {
        return Err(FormError::InvalidProfile {
            field,
            reason: format!("low {} exceeds high {}", band.low, band.high),
        });
    }
    Ok(())
}

fn check_ascending(field: &'static str, values: &[f64]) -> FormResult<()> {
    for value in values {
        check_scalar(field, *value)?;
    }
    if values.windows(2).any(|w| w[0] > w[1]) {
        return Err(FormError::InvalidProfile {
            field,
            reason: format!("must be non-decreasing, got {:?}", values),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_builtin() -> Vec<ThresholdProfile> {
        vec![
            ThresholdProfile::beginner(),
            ThresholdProfile::pro(),
            ThresholdProfile::custom(SkillTier::Intermediate),
            ThresholdProfile::custom(SkillTier::Advanced),
        ]
    }

    #[test]
    fn test_builtin_profiles_valid() {
        for profile in all_builtin() {
            assert!(profile.validate().is_ok(), "{:?}", profile.tier);
            for band in [
                profile.hip_knee_vert.normal,
                profile.hip_knee_vert.trans,
                profile.hip_knee_vert.pass,
            ] {
                assert!(band.low <= band.high);
            }
            assert!(profile.hip_thresh[0] <= profile.hip_thresh[1]);
            assert!(profile.knee_thresh.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_custom_overrides() {
        let intermediate = ThresholdProfile::custom(SkillTier::Intermediate);
        assert_eq!(intermediate.hip_thresh, [12.0, 45.0]);
        assert_eq!(intermediate.ankle_thresh, 40.0);
        assert_eq!(intermediate.knee_thresh, ThresholdProfile::beginner().knee_thresh);

        let advanced = ThresholdProfile::custom(SkillTier::Advanced);
        assert_eq!(advanced.hip_thresh, [15.0, 40.0]);
        assert_eq!(advanced.ankle_thresh, 35.0);
        assert_eq!(advanced.hip_knee_vert, ThresholdProfile::beginner().hip_knee_vert);
    }

    #[test]
    fn test_tier_lookup() {
        assert_eq!(ThresholdProfile::for_tier("pro"), ThresholdProfile::pro());
        assert_eq!(ThresholdProfile::for_tier(" Advanced ").tier, SkillTier::Advanced);
        assert_eq!(ThresholdProfile::for_tier("INTERMEDIATE").ankle_thresh, 40.0);
    }

    #[test]
    fn test_unknown_tier_falls_back() {
        assert_eq!(SkillTier::parse("olympian"), None);
        assert_eq!(ThresholdProfile::for_tier("olympian"), ThresholdProfile::beginner());
        assert_eq!(ThresholdProfile::for_tier(""), ThresholdProfile::beginner());
    }

    #[test]
    fn test_classify_bands_and_gaps() {
        let profile = ThresholdProfile::beginner();

        assert_eq!(profile.classify(0), Some(PostureState::Normal));
        assert_eq!(profile.classify(32), Some(PostureState::Normal));
        assert_eq!(profile.classify(33), None);
        assert_eq!(profile.classify(35), Some(PostureState::Transition));
        assert_eq!(profile.classify(68), None);
        assert_eq!(profile.classify(85), Some(PostureState::Pass));
        assert_eq!(profile.classify(120), None);
    }

    #[test]
    fn test_validate_rejects_inverted_band() {
        let mut profile = ThresholdProfile::beginner();
        profile.hip_knee_vert.trans = AngleBand::new(65.0, 35.0);

        match profile.validate() {
            Err(FormError::InvalidProfile { field, .. }) => {
                assert_eq!(field, "hip_knee_vert.trans")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_non_monotonic() {
        let mut profile = ThresholdProfile::beginner();
        profile.knee_thresh = [70.0, 50.0, 95.0];
        assert!(matches!(
            profile.validate(),
            Err(FormError::InvalidProfile { field: "knee_thresh", .. })
        ));

        let mut profile = ThresholdProfile::beginner();
        profile.hip_thresh = [50.0, 10.0];
        assert!(matches!(
            profile.validate(),
            Err(FormError::InvalidProfile { field: "hip_thresh", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_scalars() {
        let mut profile = ThresholdProfile::beginner();
        profile.cnt_frame_thresh = 0;
        assert!(profile.validate().is_err());

        let mut profile = ThresholdProfile::beginner();
        profile.offset_thresh = f64::NAN;
        assert!(profile.validate().is_err());

        let mut profile = ThresholdProfile::beginner();
        profile.inactive_thresh = -1.0;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unrepresentable_inactivity() {
        let mut profile = ThresholdProfile::beginner();
        profile.inactive_thresh = 1e20;
        assert!(matches!(
            profile.validate(),
            Err(FormError::InvalidProfile { field: "inactive_thresh", .. })
        ));

        profile.inactive_thresh = 3600.0;
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_profile_json() {
        let json = serde_json::to_string(&ThresholdProfile::pro()).unwrap();
        let back: ThresholdProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ThresholdProfile::pro());
        assert!(json.contains("\"tier\":\"pro\""));
    }
}
