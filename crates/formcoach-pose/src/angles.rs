//! Angle Set - the per-frame joint angles the rep state machine consumes

use formcoach_core::{FormError, FormResult};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    angle_between, denormalize, vertical_above, BodyPart, CoordinateSpace, Joint, LandmarkFrame,
    Point2, Side,
};

/// Joint angles of one frame, in whole degrees
///
/// Computed fresh every frame; never mutated, only replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AngleSet {
    /// Knee→hip vector against the vertical at the knee; drives posture state
    pub hip_knee_vertical: i32,
    /// Hip→shoulder (torso) vector against the vertical at the hip
    pub hip_angle: i32,
    /// Thigh-to-shank angle at the knee (hip, knee, ankle)
    pub knee_angle: i32,
    /// Ankle→knee (shank) vector against the vertical at the ankle
    pub ankle_angle: i32,
    /// Angle at the nose between the two shoulders
    pub offset_angle: i32,
    /// Body side the side-view angles were measured on
    pub side: Side,
}

impl AngleSet {
    pub fn new(
        hip_knee_vertical: i32,
        hip_angle: i32,
        knee_angle: i32,
        ankle_angle: i32,
        offset_angle: i32,
    ) -> Self {
        Self {
            hip_knee_vertical,
            hip_angle,
            knee_angle,
            ankle_angle,
            offset_angle,
            side: Side::Left,
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }
}

/// Turns landmark frames into angle sets
#[derive(Debug, Clone, Copy)]
pub struct AngleExtractor {
    /// Landmarks reported below this visibility make the frame incomplete
    pub min_visibility: f32,
}

impl Default for AngleExtractor {
    fn default() -> Self {
        Self {
            min_visibility: 0.5,
        }
    }
}

/// Side-view landmarks of the measured side, in pixels
#[derive(Debug, Clone, Copy)]
struct SideLandmarks {
    shoulder: Point2,
    hip: Point2,
    knee: Point2,
    ankle: Point2,
}

/// Vertical extent from foot to shoulder
fn vertical_extent(shoulder: Point2, foot: Point2) -> f64 {
    (foot.y - shoulder.y).abs()
}

impl AngleExtractor {
    pub fn new(min_visibility: f32) -> Self {
        Self { min_visibility }
    }

    /// Compute the angle set of a frame
    ///
    /// Required landmarks are the nose, both shoulders, both feet, and the
    /// hip, knee and ankle of the measured side only: the far side is often
    /// occluded in a side view.
    ///
    /// Fails with [`FormError::IncompleteFrame`] when a required landmark is
    /// missing or not visible enough, and with [`FormError::InvalidGeometry`]
    /// when landmarks coincide.
    pub fn extract(&self, frame: &LandmarkFrame) -> FormResult<AngleSet> {
        let nose = self.pixel(frame, Joint::Nose)?;
        let left_shoulder = self.pixel(frame, Joint::of(Side::Left, BodyPart::Shoulder))?;
        let right_shoulder = self.pixel(frame, Joint::of(Side::Right, BodyPart::Shoulder))?;
        let left_foot = self.pixel(frame, Joint::of(Side::Left, BodyPart::Foot))?;
        let right_foot = self.pixel(frame, Joint::of(Side::Right, BodyPart::Foot))?;

        let offset_angle = angle_between(left_shoulder, right_shoulder, nose)?;

        // Measure on the side the camera sees best in profile
        let (side, shoulder) = if vertical_extent(right_shoulder, right_foot)
            > vertical_extent(left_shoulder, left_foot)
        {
            (Side::Right, right_shoulder)
        } else {
            (Side::Left, left_shoulder)
        };
        let lm = self.side(frame, side, shoulder)?;

        let angles = AngleSet {
            hip_knee_vertical: angle_between(lm.hip, vertical_above(lm.knee), lm.knee)?,
            hip_angle: angle_between(lm.shoulder, vertical_above(lm.hip), lm.hip)?,
            knee_angle: angle_between(lm.hip, lm.ankle, lm.knee)?,
            ankle_angle: angle_between(lm.knee, vertical_above(lm.ankle), lm.ankle)?,
            offset_angle,
            side,
        };

        trace!(?angles, "extracted angles");
        Ok(angles)
    }

    fn side(&self, frame: &LandmarkFrame, side: Side, shoulder: Point2) -> FormResult<SideLandmarks> {
        Ok(SideLandmarks {
            shoulder,
            hip: self.pixel(frame, Joint::of(side, BodyPart::Hip))?,
            knee: self.pixel(frame, Joint::of(side, BodyPart::Knee))?,
            ankle: self.pixel(frame, Joint::of(side, BodyPart::Ankle))?,
        })
    }

    /// Landmark position in frame pixels
    fn pixel(&self, frame: &LandmarkFrame, joint: Joint) -> FormResult<Point2> {
        let landmark = frame
            .get(joint)
            .filter(|l| l.is_visible(self.min_visibility))
            .ok_or(FormError::IncompleteFrame {
                joint: joint.name(),
            })?;

        Ok(match frame.space {
            CoordinateSpace::Normalized => {
                denormalize(landmark.point(), frame.width, frame.height).to_point()
            }
            CoordinateSpace::Pixels => landmark.point(),
        })
    }
}
