//! Rep state machine - segments the frame stream into squat repetitions
//!
//! One machine per workout session. Each complete frame's [`AngleSet`] goes
//! through [`RepStateMachine::update`]; incomplete frames are simply not fed,
//! which leaves every counter, streak and timer exactly where it was.
//!
//! # Per-frame stages
//!
//! 1. Alignment check (shoulder offset; a fault only mid-rep)
//! 2. Posture classification and rep progression
//! 3. Frame faults with consecutive-frame persistence
//! 4. Inactivity watch
//! 5. Depth hint

use std::time::Duration;

use formcoach_core::{FaultKind, FaultSet, PostureState, SessionTime};
use formcoach_pose::AngleSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ThresholdProfile;

/// Machine configuration beyond the threshold profile
#[derive(Clone, Debug, PartialEq)]
pub struct MachineConfig {
    /// Longest step the inactivity timer may take between two complete frames
    pub max_frame_gap: Duration,
    /// Zero the rep counters when the subject goes inactive. Off by default:
    /// a rest between sets keeps the session's counts.
    pub reset_counts_on_inactivity: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            max_frame_gap: Duration::from_millis(500),
            reset_counts_on_inactivity: false,
        }
    }
}

/// Rep counters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepCounters {
    /// Reps that reached the bottom without a fault
    pub valid: u32,
    /// Reps with a fault, including shallow reps
    pub faulted: u32,
}

impl RepCounters {
    pub fn total(&self) -> u32 {
        self.valid + self.faulted
    }
}

/// Display-only hint, not a fault
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormHint {
    /// Descending but not yet deep enough
    LowerHips,
    /// Standing with the shoulders square to the camera
    TurnSideways,
}

/// How a completed rep was judged
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepVerdict {
    Valid,
    Faulted,
    Shallow,
}

/// Progress of the rep in flight
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
struct RepProgress {
    /// Entered the transition band from standing
    descended: bool,
    /// Reached the pass band after descending
    bottomed: bool,
    /// A fault was raised during this rep
    faulted: bool,
    /// Already counted as a valid rep
    counted_valid: bool,
}

/// Mutable state of one workout session
///
/// Owned exclusively by its [`RepStateMachine`].
#[derive(Clone, Debug, PartialEq)]
pub struct RepSessionState {
    posture: PostureState,
    counters: RepCounters,
    rep: RepProgress,
    /// Consecutive violating frames per fault kind
    streaks: [u32; FaultKind::COUNT],
    /// Persistent faults currently holding
    active: FaultSet,
    /// Time spent without a posture change
    stillness: Duration,
    last_frame_at: Option<SessionTime>,
    last_fault_at: Option<SessionTime>,
    frames: u64,
}

impl Default for RepSessionState {
    fn default() -> Self {
        RepSessionState {
            posture: PostureState::Normal,
            counters: RepCounters::default(),
            rep: RepProgress::default(),
            streaks: [0; FaultKind::COUNT],
            active: FaultSet::EMPTY,
            stillness: Duration::ZERO,
            last_frame_at: None,
            last_fault_at: None,
            frames: 0,
        }
    }
}

impl RepSessionState {
    pub fn posture(&self) -> PostureState {
        self.posture
    }

    pub fn counters(&self) -> RepCounters {
        self.counters
    }

    pub fn active_faults(&self) -> FaultSet {
        self.active
    }

    /// Consecutive violating frames of a fault kind
    pub fn streak(&self, kind: FaultKind) -> u32 {
        self.streaks[kind.index()]
    }

    pub fn stillness(&self) -> Duration {
        self.stillness
    }

    pub fn last_fault_at(&self) -> Option<SessionTime> {
        self.last_fault_at
    }

    /// Complete frames processed
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Result of one frame
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    /// Posture before this frame
    pub previous: PostureState,
    /// Posture after this frame
    pub state: PostureState,
    pub counters: RepCounters,
    /// Faults that became persistent (or were detected) on this frame
    pub raised: FaultSet,
    /// Faults holding after this frame, including those raised on it
    pub active: FaultSet,
    /// Rep completed on this frame
    pub rep: Option<RepVerdict>,
    pub hint: Option<FormHint>,
    /// Shoulders out of profile; posture was held. Raises
    /// [`FaultKind::Misaligned`] only during a rep.
    pub misaligned: bool,
}

/// Squat rep state machine
#[derive(Clone, Debug)]
pub struct RepStateMachine {
    profile: ThresholdProfile,
    config: MachineConfig,
    /// Stillness that raises [`FaultKind::Inactive`]
    inactive_after: Duration,
    session: RepSessionState,
}

impl RepStateMachine {
    /// Create a machine with the default configuration
    pub fn new(profile: ThresholdProfile) -> Self {
        Self::with_config(profile, MachineConfig::default())
    }

    pub fn with_config(profile: ThresholdProfile, config: MachineConfig) -> Self {
        RepStateMachine {
            inactive_after: inactivity_window(&profile),
            profile,
            config,
            session: RepSessionState::default(),
        }
    }

    pub fn profile(&self) -> &ThresholdProfile {
        &self.profile
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Current session state
    pub fn session(&self) -> &RepSessionState {
        &self.session
    }

    pub fn posture(&self) -> PostureState {
        self.session.posture
    }

    pub fn counters(&self) -> RepCounters {
        self.session.counters
    }

    /// Start a new, zeroed session
    pub fn reset(&mut self) {
        self.session = RepSessionState::default();
    }

    /// Start a new session with another profile
    pub fn reset_with(&mut self, profile: ThresholdProfile) {
        self.inactive_after = inactivity_window(&profile);
        self.profile = profile;
        self.reset();
    }

    /// Process one complete frame
    pub fn update(&mut self, angles: &AngleSet, now: SessionTime) -> StepOutcome {
        let dt = self.advance_clock(now);
        let previous = self.session.posture;
        let mut raised = FaultSet::new();
        let mut verdict = None;

        // Stage 1: Alignment
        let misaligned = angles.offset_angle as f64 > self.profile.offset_thresh;

        // Stage 2: Posture and rep progression
        if !misaligned {
            // Angles in a gap between bands hold the previous state
            if let Some(next) = self.profile.classify(angles.hip_knee_vertical) {
                if next != previous {
                    debug!(from = %previous, to = %next, angle = angles.hip_knee_vertical, "posture transition");
                    self.session.posture = next;
                    verdict = self.on_transition(previous, next, &mut raised);
                }
            }
        }

        // Stage 3: Frame faults
        let violating = self.frame_violations(angles, misaligned);
        for kind in FaultKind::all().iter().copied().filter(|k| k.is_frame_fault()) {
            let idx = kind.index();
            if violating.contains(kind) {
                self.session.streaks[idx] += 1;
                if self.session.streaks[idx] == self.profile.cnt_frame_thresh {
                    self.session.active.insert(kind);
                    raised.insert(kind);
                }
            } else {
                self.session.streaks[idx] = 0;
                self.session.active.remove(kind);
            }
        }

        for kind in raised.iter() {
            self.on_fault(kind, now);
        }

        // Stage 4: Inactivity
        if self.session.posture == previous {
            self.session.stillness = self.session.stillness.saturating_add(dt);
        } else {
            self.session.stillness = Duration::ZERO;
            self.session.active.remove(FaultKind::Inactive);
        }

        if self.session.stillness >= self.inactive_after
            && !self.session.active.contains(FaultKind::Inactive)
        {
            self.on_inactive(now);
            raised.insert(FaultKind::Inactive);
        }

        // Stage 5: Hints
        let hint = self.hint(angles, misaligned);

        StepOutcome {
            previous,
            state: self.session.posture,
            counters: self.session.counters,
            raised,
            active: self.session.active.union(raised),
            rep: verdict,
            hint,
            misaligned,
        }
    }

    /// Time elapsed since the previous complete frame, clamped
    fn advance_clock(&mut self, now: SessionTime) -> Duration {
        self.session.frames += 1;
        let dt = match self.session.last_frame_at {
            Some(last) => (now - last).min(self.config.max_frame_gap),
            None => Duration::ZERO,
        };
        self.session.last_frame_at = Some(now);
        dt
    }

    /// Rep bookkeeping for a posture change
    fn on_transition(
        &mut self,
        from: PostureState,
        to: PostureState,
        raised: &mut FaultSet,
    ) -> Option<RepVerdict> {
        let rep = &mut self.session.rep;

        match to {
            PostureState::Transition => {
                if from == PostureState::Normal {
                    *rep = RepProgress {
                        descended: true,
                        ..RepProgress::default()
                    };
                }
                None
            }
            PostureState::Pass => {
                if from != PostureState::Transition || !rep.descended || rep.bottomed {
                    // Bottom reached without a tracked descent: nothing to count
                    debug!(from = %from, "pass band entered without descent");
                    rep.bottomed = true;
                    return None;
                }

                rep.bottomed = true;
                if rep.faulted {
                    self.session.counters.faulted += 1;
                    info!(faulted = self.session.counters.faulted, "faulted rep");
                    Some(RepVerdict::Faulted)
                } else {
                    rep.counted_valid = true;
                    self.session.counters.valid += 1;
                    info!(valid = self.session.counters.valid, "valid rep");
                    Some(RepVerdict::Valid)
                }
            }
            PostureState::Normal => {
                let shallow = rep.descended && !rep.bottomed;
                *rep = RepProgress::default();

                if shallow {
                    self.session.counters.faulted += 1;
                    raised.insert(FaultKind::TooShallow);
                    info!(faulted = self.session.counters.faulted, "shallow rep");
                    Some(RepVerdict::Shallow)
                } else {
                    None
                }
            }
        }
    }

    /// Frame faults violated by this frame
    fn frame_violations(&self, angles: &AngleSet, misaligned: bool) -> FaultSet {
        let mut violating = FaultSet::new();

        if misaligned {
            // Side-view angles are meaningless when facing the camera;
            // standing that way is only a hint
            if self.session.posture.is_in_rep() {
                violating.insert(FaultKind::Misaligned);
            }
            return violating;
        }

        if !self.session.posture.is_in_rep() {
            return violating;
        }

        let p = &self.profile;
        let [k0, _, k2] = p.knee_thresh;

        if angles.hip_knee_vertical as f64 > k2 {
            violating.insert(FaultKind::TooDeep);
        }
        if (angles.knee_angle as f64) < k0 {
            violating.insert(FaultKind::KneeAlignment);
        }
        if angles.ankle_angle as f64 > p.ankle_thresh {
            violating.insert(FaultKind::AnkleFlexion);
        }
        if angles.hip_angle as f64 > p.hip_thresh[1] {
            violating.insert(FaultKind::ExcessiveLean);
        } else if (angles.hip_angle as f64) < p.hip_thresh[0] {
            violating.insert(FaultKind::InsufficientLean);
        }

        violating
    }

    /// A frame fault became persistent
    fn on_fault(&mut self, kind: FaultKind, now: SessionTime) {
        self.session.last_fault_at = Some(now);
        info!(fault = %kind, posture = %self.session.posture, "fault raised");

        let rep = &mut self.session.rep;
        if !kind.is_frame_fault() || !rep.descended {
            return;
        }

        rep.faulted = true;
        if rep.counted_valid {
            // Rep already counted as valid: it is faulted after all
            rep.counted_valid = false;
            self.session.counters.valid = self.session.counters.valid.saturating_sub(1);
            self.session.counters.faulted += 1;
        }
    }

    fn on_inactive(&mut self, now: SessionTime) {
        self.session.active.insert(FaultKind::Inactive);
        self.session.last_fault_at = Some(now);

        if self.config.reset_counts_on_inactivity {
            warn!(
                stillness_ms = self.session.stillness.as_millis() as u64,
                counters = ?self.session.counters,
                "subject inactive, resetting rep counters"
            );
            self.session.counters = RepCounters::default();
            self.session.rep = RepProgress::default();
        } else {
            warn!(
                stillness_ms = self.session.stillness.as_millis() as u64,
                "subject inactive"
            );
        }
    }

    fn hint(&self, angles: &AngleSet, misaligned: bool) -> Option<FormHint> {
        let rep = &self.session.rep;
        if misaligned && self.session.posture == PostureState::Normal {
            return Some(FormHint::TurnSideways);
        }
        if misaligned || self.session.posture != PostureState::Transition {
            return None;
        }
        if !rep.descended || rep.bottomed {
            return None;
        }

        let [k0, k1, _] = self.profile.knee_thresh;
        let angle = angles.hip_knee_vertical as f64;
        (angle > k0 && angle < k1).then_some(FormHint::LowerHips)
    }
}

/// Inactivity threshold as a duration; out of range disables the watch
fn inactivity_window(profile: &ThresholdProfile) -> Duration {
    Duration::try_from_secs_f64(profile.inactive_thresh).unwrap_or_else(|_| {
        warn!(
            inactive_thresh = profile.inactive_thresh,
            "inactivity threshold out of range, inactivity watch disabled"
        );
        Duration::MAX
    })
}
