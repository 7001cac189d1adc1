//! Landmark Frame - named body joints located in one video frame
//!
//! This is NOT a skeleton model. It is the read-only view of what the
//! external pose estimator saw in a single frame.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Body side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Left,
    Right,
}

/// Joint identifier for the landmarks the engine consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Joint {
    // Head
    Nose,

    // Left side
    LeftShoulder,
    LeftElbow,
    LeftWrist,
    LeftHip,
    LeftKnee,
    LeftAnkle,
    LeftFoot,

    // Right side
    RightShoulder,
    RightElbow,
    RightWrist,
    RightHip,
    RightKnee,
    RightAnkle,
    RightFoot,
}

/// Body part on one side of the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyPart {
    Shoulder,
    Elbow,
    Wrist,
    Hip,
    Knee,
    Ankle,
    Foot,
}

impl Joint {
    /// All joints in order
    pub fn all() -> &'static [Joint] {
        &[
            Joint::Nose,
            Joint::LeftShoulder,
            Joint::LeftElbow,
            Joint::LeftWrist,
            Joint::LeftHip,
            Joint::LeftKnee,
            Joint::LeftAnkle,
            Joint::LeftFoot,
            Joint::RightShoulder,
            Joint::RightElbow,
            Joint::RightWrist,
            Joint::RightHip,
            Joint::RightKnee,
            Joint::RightAnkle,
            Joint::RightFoot,
        ]
    }

    /// Number of joints
    pub fn count() -> usize {
        15
    }

    /// Joint for a body part on a given side
    pub fn of(side: Side, part: BodyPart) -> Joint {
        match (side, part) {
            (Side::Left, BodyPart::Shoulder) => Joint::LeftShoulder,
            (Side::Left, BodyPart::Elbow) => Joint::LeftElbow,
            (Side::Left, BodyPart::Wrist) => Joint::LeftWrist,
            (Side::Left, BodyPart::Hip) => Joint::LeftHip,
            (Side::Left, BodyPart::Knee) => Joint::LeftKnee,
            (Side::Left, BodyPart::Ankle) => Joint::LeftAnkle,
            (Side::Left, BodyPart::Foot) => Joint::LeftFoot,
            (Side::Right, BodyPart::Shoulder) => Joint::RightShoulder,
            (Side::Right, BodyPart::Elbow) => Joint::RightElbow,
            (Side::Right, BodyPart::Wrist) => Joint::RightWrist,
            (Side::Right, BodyPart::Hip) => Joint::RightHip,
            (Side::Right, BodyPart::Knee) => Joint::RightKnee,
            (Side::Right, BodyPart::Ankle) => Joint::RightAnkle,
            (Side::Right, BodyPart::Foot) => Joint::RightFoot,
        }
    }

    /// Stable landmark name used by traces and error messages
    pub fn name(self) -> &'static str {
        match self {
            Joint::Nose => "nose",
            Joint::LeftShoulder => "left_shoulder",
            Joint::LeftElbow => "left_elbow",
            Joint::LeftWrist => "left_wrist",
            Joint::LeftHip => "left_hip",
            Joint::LeftKnee => "left_knee",
            Joint::LeftAnkle => "left_ankle",
            Joint::LeftFoot => "left_foot",
            Joint::RightShoulder => "right_shoulder",
            Joint::RightElbow => "right_elbow",
            Joint::RightWrist => "right_wrist",
            Joint::RightHip => "right_hip",
            Joint::RightKnee => "right_knee",
            Joint::RightAnkle => "right_ankle",
            Joint::RightFoot => "right_foot",
        }
    }

    pub fn from_name(name: &str) -> Option<Joint> {
        Joint::all().iter().copied().find(|j| j.name() == name)
    }
}

/// 2D point (normalized or pixel coordinates, see [`CoordinateSpace`])
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const ORIGIN: Point2 = Point2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector from `origin` to this point
    pub fn relative_to(&self, origin: &Point2) -> Point2 {
        Point2 {
            x: self.x - origin.x,
            y: self.y - origin.y,
        }
    }

    pub fn dot(&self, other: &Point2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Linear interpolation
    pub fn lerp(&self, other: &Point2, t: f64) -> Point2 {
        Point2 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// A located joint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    /// Detector visibility/confidence, if it reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn point(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    /// Visible enough to trust? Landmarks without a score are trusted.
    pub fn is_visible(&self, min_visibility: f32) -> bool {
        self.visibility.map_or(true, |v| v >= min_visibility)
    }
}

/// Coordinate space of a frame's landmarks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// `[0,1] x [0,1]`, relative to frame width and height
    #[default]
    Normalized,
    /// Already in frame pixels
    Pixels,
}

/// One frame's landmarks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LandmarkFrameRecord", into = "LandmarkFrameRecord")]
pub struct LandmarkFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Space the landmark coordinates are expressed in
    pub space: CoordinateSpace,
    /// Landmarks indexed by Joint
    joints: Vec<Option<Landmark>>,
}

impl LandmarkFrame {
    /// Create an empty frame (no landmarks detected)
    pub fn new(width: u32, height: u32, space: CoordinateSpace) -> Self {
        Self {
            width,
            height,
            space,
            joints: vec![None; Joint::count()],
        }
    }

    pub fn normalized(width: u32, height: u32) -> Self {
        Self::new(width, height, CoordinateSpace::Normalized)
    }

    pub fn pixels(width: u32, height: u32) -> Self {
        Self::new(width, height, CoordinateSpace::Pixels)
    }

    /// Get a landmark by joint
    pub fn get(&self, joint: Joint) -> Option<&Landmark> {
        self.joints.get(joint as usize).and_then(|l| l.as_ref())
    }

    /// Set a landmark
    pub fn set(&mut self, joint: Joint, landmark: Landmark) {
        let idx = joint as usize;
        if idx < self.joints.len() {
            self.joints[idx] = Some(landmark);
        }
    }

    /// Builder-style [`LandmarkFrame::set`]
    pub fn with(mut self, joint: Joint, landmark: Landmark) -> Self {
        self.set(joint, landmark);
        self
    }

    /// Drop a landmark (detector lost it)
    pub fn clear(&mut self, joint: Joint) {
        let idx = joint as usize;
        if idx < self.joints.len() {
            self.joints[idx] = None;
        }
    }

    /// Number of detected landmarks
    pub fn detected(&self) -> usize {
        self.joints.iter().filter(|l| l.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.detected() == 0
    }

    /// Iterate detected landmarks
    pub fn iter(&self) -> impl Iterator<Item = (Joint, &Landmark)> {
        Joint::all()
            .iter()
            .zip(self.joints.iter())
            .filter_map(|(j, l)| l.as_ref().map(|l| (*j, l)))
    }
}

/// Serialized form: landmarks keyed by joint name
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LandmarkFrameRecord {
    width: u32,
    height: u32,
    #[serde(default)]
    space: CoordinateSpace,
    #[serde(default)]
    landmarks: BTreeMap<String, Landmark>,
}

impl From<LandmarkFrameRecord> for LandmarkFrame {
    fn from(record: LandmarkFrameRecord) -> Self {
        let mut frame = LandmarkFrame::new(record.width, record.height, record.space);
        for (name, landmark) in record.landmarks {
            // Estimators report more landmarks than we consume
            if let Some(joint) = Joint::from_name(&name) {
                frame.set(joint, landmark);
            }
        }
        frame
    }
}

impl From<LandmarkFrame> for LandmarkFrameRecord {
    fn from(frame: LandmarkFrame) -> Self {
        let landmarks = frame
            .iter()
            .map(|(joint, landmark)| (joint.name().to_string(), *landmark))
            .collect();
        LandmarkFrameRecord {
            width: frame.width,
            height: frame.height,
            space: frame.space,
            landmarks,
        }
    }
}
