//! Squat Session - one subject, one camera, one workout

use std::fmt;

use formcoach_core::{FaultSet, FormResult, PostureState, SessionId, SessionTime};
use formcoach_feedback::{FeedbackDispatcher, FeedbackEvent, FeedbackSink, IssueCount};
use formcoach_pose::{AngleExtractor, AngleSet, LandmarkFrame};
use formcoach_state::{FormHint, RepCounters, RepStateMachine, RepVerdict, ThresholdProfile};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::SessionConfig;

/// What happened on one frame
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub at: SessionTime,
    pub state: PostureState,
    pub valid_reps: u32,
    pub faulted_reps: u32,
    /// Faults raised on this frame
    pub raised: FaultSet,
    /// Faults holding after this frame
    pub active: FaultSet,
    /// Rep completed on this frame
    pub rep: Option<RepVerdict>,
    pub hint: Option<FormHint>,
    pub feedback: Option<FeedbackEvent>,
    /// Frame was incomplete and left the session untouched
    pub skipped: bool,
}

/// End-of-session report
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_feedback: u64,
    pub common_issues: Vec<IssueCount>,
    pub history: Vec<FeedbackEvent>,
    pub valid_reps: u32,
    pub faulted_reps: u32,
}

/// Squat analysis session
///
/// Owns the angle extractor, the rep state machine and the feedback
/// dispatcher of one workout. Frames must arrive in time order.
pub struct SquatSession {
    id: SessionId,
    extractor: AngleExtractor,
    machine: RepStateMachine,
    dispatcher: FeedbackDispatcher,
    sink: Option<Box<dyn FeedbackSink>>,
    skipped: u64,
}

impl SquatSession {
    /// Create a session with the configured tier's profile
    pub fn new(id: SessionId, config: &SessionConfig) -> FormResult<Self> {
        Self::with_profile(id, config.profile(), config)
    }

    /// Create a session with an explicit profile
    ///
    /// Fails with `InvalidProfile` when the profile breaks its invariants.
    pub fn with_profile(
        id: SessionId,
        profile: ThresholdProfile,
        config: &SessionConfig,
    ) -> FormResult<Self> {
        profile.validate()?;

        info!(session = %id, tier = %profile.tier, "session started");

        Ok(SquatSession {
            id,
            extractor: config.extractor(),
            machine: RepStateMachine::with_config(profile, config.machine_config()),
            dispatcher: FeedbackDispatcher::new(config.feedback_config()),
            sink: None,
            skipped: 0,
        })
    }

    /// Deliver every emitted message to `sink`
    pub fn with_sink(mut self, sink: impl FeedbackSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn set_sink(&mut self, sink: Box<dyn FeedbackSink>) {
        self.sink = Some(sink);
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn profile(&self) -> &ThresholdProfile {
        self.machine.profile()
    }

    pub fn machine(&self) -> &RepStateMachine {
        &self.machine
    }

    pub fn dispatcher(&self) -> &FeedbackDispatcher {
        &self.dispatcher
    }

    pub fn posture(&self) -> PostureState {
        self.machine.posture()
    }

    pub fn counters(&self) -> RepCounters {
        self.machine.counters()
    }

    /// Incomplete frames seen so far
    pub fn skipped_frames(&self) -> u64 {
        self.skipped
    }

    /// Process one landmark frame
    pub fn process_frame(&mut self, frame: &LandmarkFrame, now: SessionTime) -> FrameReport {
        match self.extractor.extract(frame) {
            Ok(angles) => self.process_angles(Some(angles), now),
            Err(e) => {
                warn!(session = %self.id, error = %e, "frame skipped");
                self.process_angles(None, now)
            }
        }
    }

    /// Process precomputed angles; `None` marks an incomplete frame
    pub fn process_angles(&mut self, angles: Option<AngleSet>, now: SessionTime) -> FrameReport {
        let Some(angles) = angles else {
            self.skipped += 1;
            return self.skipped_report(now);
        };

        // Stage 2: Rep state machine
        let outcome = self.machine.update(&angles, now);

        // Stage 3: Feedback
        let feedback = self.dispatcher.analyze_and_notify(outcome.active, now);

        // Stage 4: Delivery
        if let (Some(event), Some(sink)) = (&feedback, self.sink.as_mut()) {
            sink.deliver(event);
        }

        if outcome.previous != outcome.state {
            debug!(session = %self.id, from = %outcome.previous, to = %outcome.state, "posture");
        }

        FrameReport {
            at: now,
            state: outcome.state,
            valid_reps: outcome.counters.valid,
            faulted_reps: outcome.counters.faulted,
            raised: outcome.raised,
            active: outcome.active,
            rep: outcome.rep,
            hint: outcome.hint,
            feedback,
            skipped: false,
        }
    }

    fn skipped_report(&self, now: SessionTime) -> FrameReport {
        let session = self.machine.session();
        FrameReport {
            at: now,
            state: session.posture(),
            valid_reps: session.counters().valid,
            faulted_reps: session.counters().faulted,
            raised: FaultSet::EMPTY,
            active: session.active_faults(),
            rep: None,
            hint: None,
            feedback: None,
            skipped: true,
        }
    }

    /// Summary of the session so far
    pub fn summary(&self) -> SessionSummary {
        let feedback = self.dispatcher.session_summary();
        let counters = self.machine.counters();

        SessionSummary {
            total_feedback: feedback.total_feedback,
            common_issues: feedback.common_issues,
            history: feedback.history,
            valid_reps: counters.valid,
            faulted_reps: counters.faulted,
        }
    }

    /// End the session
    pub fn finish(self) -> SessionSummary {
        let summary = self.summary();
        info!(
            session = %self.id,
            valid = summary.valid_reps,
            faulted = summary.faulted_reps,
            feedback = summary.total_feedback,
            skipped = self.skipped,
            "session finished"
        );
        summary
    }
}

impl fmt::Debug for SquatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SquatSession")
            .field("id", &self.id)
            .field("posture", &self.machine.posture())
            .field("counters", &self.machine.counters())
            .field("skipped", &self.skipped)
            .field("sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}
