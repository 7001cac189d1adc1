//! Synthetic squat traces
//!
//! Generates side-view landmark frames from a simple planar body model:
//! the ankle stays put, the shank leans forward, the thigh folds back and the
//! torso leans forward, each driven by the hip-knee-vertical angle.

use std::f64::consts::PI;

use formcoach_core::{FormError, FormResult, SessionTime};
use formcoach_pose::{BodyPart, CoordinateSpace, Joint, Landmark, LandmarkFrame, Point2, Side};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// One timestamped frame of a trace
///
/// Serializes as `{ "t": secs, "width": .., "height": .., "landmarks": {..} }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceFrame {
    /// Seconds since the start of the session
    pub t: f64,
    #[serde(flatten)]
    pub frame: LandmarkFrame,
}

impl TraceFrame {
    pub fn at(&self) -> SessionTime {
        SessionTime::from_secs_f64(self.t)
    }
}

/// Parse a JSON-lines trace; blank lines are ignored
pub fn parse_json_lines(input: &str) -> FormResult<Vec<TraceFrame>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .map_err(|e| FormError::Config(format!("trace line {}: {}", n + 1, e)))
        })
        .collect()
}

/// Render a trace as JSON lines
pub fn to_json_lines(frames: &[TraceFrame]) -> FormResult<String> {
    let mut out = String::new();
    for frame in frames {
        let line = serde_json::to_string(frame).map_err(|e| FormError::Config(e.to_string()))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

/// Body proportions and how joints follow the squat depth
#[derive(Clone, Copy, Debug)]
pub struct BodyModel {
    /// Shank length, fraction of frame height
    pub shank: f64,
    /// Thigh length, fraction of frame height
    pub thigh: f64,
    /// Torso length, fraction of frame height
    pub torso: f64,
    /// Torso lean per degree of hip-knee-vertical angle
    pub lean_ratio: f64,
    /// Shank lean per degree of hip-knee-vertical angle
    pub shin_ratio: f64,
}

impl Default for BodyModel {
    fn default() -> Self {
        BodyModel {
            shank: 0.22,
            thigh: 0.22,
            torso: 0.28,
            lean_ratio: 0.4,
            shin_ratio: 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Segment {
    Hold { angle: f64, frames: usize },
    Rep { depth: f64, frames: usize },
    Dropout { frames: usize },
    FacingCamera { frames: usize },
}

/// Builds synthetic squat traces
#[derive(Clone, Debug)]
pub struct SquatTraceBuilder {
    width: u32,
    height: u32,
    fps: u32,
    space: CoordinateSpace,
    jitter_px: f64,
    seed: u64,
    body: BodyModel,
    segments: Vec<Segment>,
}

impl Default for SquatTraceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SquatTraceBuilder {
    /// 640x480 pixel frames at 30 fps, no jitter
    pub fn new() -> Self {
        SquatTraceBuilder {
            width: 640,
            height: 480,
            fps: 30,
            space: CoordinateSpace::Pixels,
            jitter_px: 0.0,
            seed: 0,
            body: BodyModel::default(),
            segments: Vec::new(),
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    /// Emit normalized coordinates instead of pixels
    pub fn normalized(mut self) -> Self {
        self.space = CoordinateSpace::Normalized;
        self
    }

    /// Uniform landmark noise of up to `px` pixels, seeded
    pub fn jitter(mut self, px: f64, seed: u64) -> Self {
        self.jitter_px = px.abs();
        self.seed = seed;
        self
    }

    pub fn body(mut self, body: BodyModel) -> Self {
        self.body = body;
        self
    }

    pub fn lean_ratio(mut self, ratio: f64) -> Self {
        self.body.lean_ratio = ratio;
        self
    }

    pub fn shin_ratio(mut self, ratio: f64) -> Self {
        self.body.shin_ratio = ratio;
        self
    }

    fn frames_for(&self, secs: f64) -> usize {
        (secs * self.fps as f64).round().max(0.0) as usize
    }

    /// Stand upright
    pub fn stand(self, secs: f64) -> Self {
        self.hold(0.0, secs)
    }

    /// Hold a hip-knee-vertical angle
    pub fn hold(mut self, angle: f64, secs: f64) -> Self {
        let frames = self.frames_for(secs);
        self.segments.push(Segment::Hold { angle, frames });
        self
    }

    /// One rep from standing down to `depth` and back up
    pub fn rep(mut self, depth: f64, secs: f64) -> Self {
        let frames = self.frames_for(secs);
        self.segments.push(Segment::Rep { depth, frames });
        self
    }

    pub fn reps(mut self, count: usize, depth: f64, secs_each: f64) -> Self {
        for _ in 0..count {
            self = self.rep(depth, secs_each);
        }
        self
    }

    /// Frames where the detector lost the near ankle
    pub fn dropout(mut self, frames: usize) -> Self {
        self.segments.push(Segment::Dropout { frames });
        self
    }

    /// Standing, shoulders square to the camera
    pub fn facing_camera(mut self, secs: f64) -> Self {
        let frames = self.frames_for(secs);
        self.segments.push(Segment::FacingCamera { frames });
        self
    }

    /// Generate the trace
    pub fn build(&self) -> Vec<TraceFrame> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut out = Vec::new();
        let mut last_angle = 0.0;

        for segment in &self.segments {
            match *segment {
                Segment::Hold { angle, frames } => {
                    for _ in 0..frames {
                        let frame = self.side_view(angle, &mut rng);
                        self.push(&mut out, frame);
                    }
                    last_angle = angle;
                }
                Segment::Rep { depth, frames } => {
                    for i in 0..frames {
                        let phase = i as f64 / frames as f64;
                        let angle = depth * (1.0 - (2.0 * PI * phase).cos()) / 2.0;
                        let frame = self.side_view(angle, &mut rng);
                        self.push(&mut out, frame);
                    }
                    last_angle = 0.0;
                }
                Segment::Dropout { frames } => {
                    for _ in 0..frames {
                        let mut frame = self.side_view(last_angle, &mut rng);
                        frame.clear(Joint::of(Side::Left, BodyPart::Ankle));
                        self.push(&mut out, frame);
                    }
                }
                Segment::FacingCamera { frames } => {
                    for _ in 0..frames {
                        let frame = self.facing(&mut rng);
                        self.push(&mut out, frame);
                    }
                    last_angle = 0.0;
                }
            }
        }

        out
    }

    fn push(&self, out: &mut Vec<TraceFrame>, frame: LandmarkFrame) {
        let t = out.len() as f64 / self.fps as f64;
        out.push(TraceFrame { t, frame });
    }

    /// Near-side joint positions in pixels for a hip-knee-vertical angle
    fn pose(&self, angle: f64) -> Vec<(BodyPart, Point2)> {
        let h = self.height as f64;
        let b = &self.body;
        let theta = angle.to_radians();
        let phi = (b.shin_ratio * angle).to_radians();
        let psi = (b.lean_ratio * angle).to_radians();

        let ankle = Point2::new(self.width as f64 * 0.55, h * 0.9);
        let knee = Point2::new(ankle.x + b.shank * h * phi.sin(), ankle.y - b.shank * h * phi.cos());
        let hip = Point2::new(knee.x - b.thigh * h * theta.sin(), knee.y - b.thigh * h * theta.cos());
        let shoulder = Point2::new(hip.x + b.torso * h * psi.sin(), hip.y - b.torso * h * psi.cos());
        let elbow = Point2::new(shoulder.x + 0.03 * h, shoulder.y + 0.12 * h);
        let wrist = Point2::new(elbow.x + 0.06 * h, elbow.y + 0.05 * h);
        let foot = Point2::new(ankle.x + 0.06 * h, ankle.y + 0.02 * h);

        vec![
            (BodyPart::Shoulder, shoulder),
            (BodyPart::Elbow, elbow),
            (BodyPart::Wrist, wrist),
            (BodyPart::Hip, hip),
            (BodyPart::Knee, knee),
            (BodyPart::Ankle, ankle),
            (BodyPart::Foot, foot),
        ]
    }

    fn side_view(&self, angle: f64, rng: &mut StdRng) -> LandmarkFrame {
        let h = self.height as f64;
        let pose = self.pose(angle);
        let mut frame = LandmarkFrame::new(self.width, self.height, self.space);

        let ankle = pose
            .iter()
            .find(|(part, _)| *part == BodyPart::Ankle)
            .map(|(_, p)| *p)
            .unwrap_or(Point2::ORIGIN);

        let mut shoulder = Point2::ORIGIN;
        for (part, near) in pose {
            if part == BodyPart::Shoulder {
                shoulder = near;
            }
            // Far side: slightly behind and smaller in the image
            let far = Point2::new(
                ankle.x - 6.0 + 0.96 * (near.x - ankle.x),
                ankle.y - 3.0 + 0.96 * (near.y - ankle.y),
            );
            self.place(&mut frame, Joint::of(Side::Left, part), near, rng);
            self.place(&mut frame, Joint::of(Side::Right, part), far, rng);
        }

        let nose = Point2::new(shoulder.x + 0.05 * h, shoulder.y - 0.09 * h);
        self.place(&mut frame, Joint::Nose, nose, rng);
        frame
    }

    fn facing(&self, rng: &mut StdRng) -> LandmarkFrame {
        let h = self.height as f64;
        let mut frame = self.side_view(0.0, rng);

        let left = frame
            .get(Joint::LeftShoulder)
            .map(|l| self.to_pixels(l.point()))
            .unwrap_or(Point2::ORIGIN);
        let spread = 0.12 * h;

        self.place(&mut frame, Joint::LeftShoulder, Point2::new(left.x + spread, left.y), rng);
        self.place(&mut frame, Joint::RightShoulder, Point2::new(left.x - spread, left.y), rng);
        self.place(&mut frame, Joint::Nose, Point2::new(left.x, left.y - 0.09 * h), rng);
        frame
    }

    fn to_pixels(&self, p: Point2) -> Point2 {
        match self.space {
            CoordinateSpace::Pixels => p,
            CoordinateSpace::Normalized => {
                Point2::new(p.x * self.width as f64, p.y * self.height as f64)
            }
        }
    }

    fn place(&self, frame: &mut LandmarkFrame, joint: Joint, p: Point2, rng: &mut StdRng) {
        let (dx, dy) = if self.jitter_px > 0.0 {
            (
                rng.gen_range(-self.jitter_px..=self.jitter_px),
                rng.gen_range(-self.jitter_px..=self.jitter_px),
            )
        } else {
            (0.0, 0.0)
        };
        let (x, y) = (p.x + dx, p.y + dy);

        let landmark = match self.space {
            CoordinateSpace::Pixels => Landmark::new(x, y),
            CoordinateSpace::Normalized => {
                Landmark::new(x / self.width as f64, y / self.height as f64)
            }
        };
        frame.set(joint, landmark.with_visibility(0.9));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formcoach_pose::AngleExtractor;

    #[test]
    fn test_standing_frame_angles() {
        let trace = SquatTraceBuilder::new().stand(0.1).build();
        let angles = AngleExtractor::default().extract(&trace[0].frame).unwrap();

        assert_eq!(angles.side, Side::Left);
        assert_eq!(angles.hip_knee_vertical, 0);
        assert_eq!(angles.knee_angle, 180);
        assert!(angles.offset_angle < 10);
    }

    #[test]
    fn test_held_depth_angles() {
        let trace = SquatTraceBuilder::new().hold(80.0, 0.1).build();
        let angles = AngleExtractor::default().extract(&trace[0].frame).unwrap();

        assert!((angles.hip_knee_vertical - 80).abs() <= 1);
        assert!((angles.hip_angle - 32).abs() <= 1);
        assert!((angles.ankle_angle - 24).abs() <= 1);
        // 180 - (hkv + shank lean)
        assert!((angles.knee_angle - 76).abs() <= 1);
    }

    #[test]
    fn test_rep_timing() {
        let trace = SquatTraceBuilder::new().fps(30).reps(2, 85.0, 2.0).build();
        assert_eq!(trace.len(), 120);
        assert_eq!(trace[0].t, 0.0);
        assert_eq!(trace[30].at(), SessionTime::from_secs_f64(1.0));
    }

    #[test]
    fn test_dropout_frames_incomplete() {
        let trace = SquatTraceBuilder::new().stand(0.1).dropout(5).build();
        let extractor = AngleExtractor::default();

        assert!(extractor.extract(&trace[0].frame).is_ok());
        assert!(trace[3..].iter().all(|f| extractor.extract(&f.frame)
            == Err(FormError::IncompleteFrame { joint: "left_ankle" })));
    }

    #[test]
    fn test_far_side_loss_still_complete() {
        let trace = SquatTraceBuilder::new().hold(50.0, 0.1).build();
        let extractor = AngleExtractor::default();
        let expected = extractor.extract(&trace[0].frame).unwrap();

        let mut frame = trace[0].frame.clone();
        frame.clear(Joint::RightKnee);
        let angles = extractor.extract(&frame).unwrap();

        assert_eq!(angles, expected);
        assert_eq!(angles.side, Side::Left);
    }

    #[test]
    fn test_facing_camera_misaligned() {
        let trace = SquatTraceBuilder::new().facing_camera(0.1).build();
        let angles = AngleExtractor::default().extract(&trace[0].frame).unwrap();
        assert!(angles.offset_angle > 35);
    }

    #[test]
    fn test_normalized_matches_pixels() {
        let pixels = SquatTraceBuilder::new().hold(60.0, 0.1).build();
        let normalized = SquatTraceBuilder::new().normalized().hold(60.0, 0.1).build();
        let extractor = AngleExtractor::default();

        let a = extractor.extract(&pixels[0].frame).unwrap();
        let b = extractor.extract(&normalized[0].frame).unwrap();
        assert!((a.hip_knee_vertical - b.hip_knee_vertical).abs() <= 1);
    }

    #[test]
    fn test_jitter_seeded() {
        let a = SquatTraceBuilder::new().jitter(2.0, 42).rep(85.0, 1.0).build();
        let b = SquatTraceBuilder::new().jitter(2.0, 42).rep(85.0, 1.0).build();
        let c = SquatTraceBuilder::new().jitter(2.0, 7).rep(85.0, 1.0).build();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_json_lines() {
        let trace = SquatTraceBuilder::new().stand(0.1).dropout(1).build();
        let text = to_json_lines(&trace).unwrap();
        assert_eq!(text.lines().count(), trace.len());

        let parsed = parse_json_lines(&text).unwrap();
        assert_eq!(parsed, trace);
    }

    #[test]
    fn test_json_lines_error_line() {
        let input = "\n{\"t\": 0.0, \"width\": 640, \"height\": 480}\nnot json\n";
        match parse_json_lines(input) {
            Err(FormError::Config(msg)) => assert!(msg.starts_with("trace line 3")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
