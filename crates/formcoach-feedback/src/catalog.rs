//! Message catalog - rotating coaching cues per fault kind

use formcoach_core::FaultKind;

/// Coaching cues for a fault kind, in rotation order
pub fn messages(kind: FaultKind) -> &'static [&'static str] {
    match kind {
        FaultKind::TooShallow => &[
            "Lower your squat. Aim for thighs parallel to the ground.",
            "Go a little deeper before standing up.",
            "Sink your hips lower on the next rep.",
        ],
        FaultKind::TooDeep => &[
            "You're going too low. Control your descent.",
            "Stop at parallel instead of dropping to the bottom.",
            "Squat too deep. Keep tension at the bottom.",
        ],
        FaultKind::KneeAlignment => &[
            "Keep your knees aligned with your toes.",
            "Watch your knees, don't let them drift forward.",
            "Push your hips back, not your knees forward.",
        ],
        FaultKind::AnkleFlexion => &[
            "Knee falling over toes. Shift weight to your heels.",
            "Keep your heels down and your shins more upright.",
            "Sit back into your heels.",
        ],
        FaultKind::Misaligned => &[
            "Camera not aligned. Turn sideways to the camera.",
            "Stand side-on so your profile is visible.",
            "Rotate until the camera sees you from the side.",
        ],
        FaultKind::ExcessiveLean => &[
            "Keep your back straight.",
            "Chest up, core engaged.",
            "Bend backwards a little, you're leaning too far forward.",
        ],
        FaultKind::InsufficientLean => &[
            "Bend forward slightly at the hips.",
            "Hinge at the hips as you descend.",
            "Let your torso lean forward a little.",
        ],
        FaultKind::Inactive => &[
            "Remember to breathe.",
            "Keep your movements controlled.",
            "Maintain good form throughout.",
        ],
    }
}

/// Rotating cursor over each fault kind's cues
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageRotation {
    next: [usize; FaultKind::COUNT],
}

impl MessageRotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next cue for a fault kind; advances that kind's cursor
    pub fn next_message(&mut self, kind: FaultKind) -> &'static str {
        let cues = messages(kind);
        let cursor = &mut self.next[kind.index()];
        let message = cues[*cursor % cues.len()];
        *cursor = (*cursor + 1) % cues.len();
        message
    }
}
