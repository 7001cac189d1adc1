//! End-to-end scenario runner

use formcoach_core::{FaultKind, FormResult, SessionId, SessionTime};
use formcoach_feedback::FeedbackEvent;
use formcoach_runtime::{FrameReport, SessionConfig, SessionSummary, SquatSession};

use crate::{AngleScript, TraceFrame};

/// Feed a landmark trace through a session
pub fn run_scenario(session: &mut SquatSession, trace: &[TraceFrame]) -> Vec<FrameReport> {
    trace
        .iter()
        .map(|f| session.process_frame(&f.frame, f.at()))
        .collect()
}

/// Feed a scripted angle sequence through a session
pub fn run_script(session: &mut SquatSession, script: &AngleScript) -> Vec<FrameReport> {
    script
        .iter()
        .map(|(at, angles)| session.process_angles(angles, at))
        .collect()
}

/// Outcome of a complete scenario
#[derive(Clone, Debug)]
pub struct ScenarioOutcome {
    pub reports: Vec<FrameReport>,
    pub summary: SessionSummary,
}

impl ScenarioOutcome {
    /// Run a trace through a fresh session and finish it
    pub fn run(config: &SessionConfig, trace: &[TraceFrame]) -> FormResult<Self> {
        let mut session = SquatSession::new(SessionId::new(1), config)?;
        let reports = run_scenario(&mut session, trace);
        Ok(ScenarioOutcome {
            reports,
            summary: session.finish(),
        })
    }

    /// Emitted feedback, in order
    pub fn feedback(&self) -> Vec<&FeedbackEvent> {
        self.reports.iter().filter_map(|r| r.feedback.as_ref()).collect()
    }

    /// When each fault was raised
    pub fn raised(&self) -> Vec<(SessionTime, FaultKind)> {
        self.reports
            .iter()
            .flat_map(|r| r.raised.iter().map(move |kind| (r.at, kind)))
            .collect()
    }

    pub fn raised_count(&self, kind: FaultKind) -> usize {
        self.raised().iter().filter(|(_, k)| *k == kind).count()
    }

    pub fn skipped(&self) -> usize {
        self.reports.iter().filter(|r| r.skipped).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clean_angles, SquatTraceBuilder};
    use formcoach_core::PostureState;
    use formcoach_feedback::CollectingSink;
    use formcoach_pose::AngleSet;
    use formcoach_state::{FormHint, RepVerdict};
    use proptest::prelude::*;

    fn beginner() -> SessionConfig {
        SessionConfig::default()
    }

    #[test]
    fn test_clean_reps_from_landmarks() {
        let trace = SquatTraceBuilder::new().stand(1.0).reps(3, 85.0, 2.0).stand(1.0).build();
        let outcome = ScenarioOutcome::run(&beginner(), &trace).unwrap();

        assert_eq!(outcome.summary.valid_reps, 3);
        assert_eq!(outcome.summary.faulted_reps, 0);
        assert_eq!(outcome.summary.total_feedback, 0);
        assert!(outcome.raised().is_empty());
        assert_eq!(outcome.reports.last().unwrap().state, PostureState::Normal);
    }

    #[test]
    fn test_excessive_lean_from_landmarks() {
        let trace = SquatTraceBuilder::new()
            .lean_ratio(0.8)
            .stand(0.5)
            .hold(50.0, 0.5)
            .hold(80.0, 3.0)
            .stand(1.0)
            .build();
        let outcome = ScenarioOutcome::run(&beginner(), &trace).unwrap();

        assert_eq!(outcome.raised_count(FaultKind::ExcessiveLean), 1);
        let feedback = outcome.feedback();
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].kind, FaultKind::ExcessiveLean);
        assert_eq!(outcome.summary.valid_reps, 0);
        assert_eq!(outcome.summary.faulted_reps, 1);
        assert_eq!(outcome.summary.common_issues.len(), 1);
    }

    #[test]
    fn test_dropout_from_landmarks() {
        let trace = SquatTraceBuilder::new().stand(0.5).hold(50.0, 0.5).dropout(10).build();
        let outcome = ScenarioOutcome::run(&beginner(), &trace).unwrap();

        assert_eq!(outcome.skipped(), 10);
        let last_complete = &outcome.reports[outcome.reports.len() - 11];
        for report in &outcome.reports[outcome.reports.len() - 10..] {
            assert_eq!(report.state, last_complete.state);
            assert_eq!(report.valid_reps, last_complete.valid_reps);
            assert_eq!(report.faulted_reps, last_complete.faulted_reps);
        }
        assert_eq!(last_complete.state, PostureState::Transition);
    }

    #[test]
    fn test_facing_camera() {
        let trace = SquatTraceBuilder::new().facing_camera(3.0).build();
        let outcome = ScenarioOutcome::run(&beginner(), &trace).unwrap();

        // Standing square to the camera is a hint, not a fault
        assert!(outcome.raised().is_empty());
        assert!(outcome.feedback().is_empty());
        assert!(outcome.reports.iter().all(|r| r.state == PostureState::Normal));
        assert!(outcome.reports.iter().all(|r| r.hint == Some(FormHint::TurnSideways)));
    }

    #[test]
    fn test_rest_between_sets_keeps_reps() {
        let trace = SquatTraceBuilder::new()
            .stand(0.5)
            .reps(3, 85.0, 2.0)
            .stand(16.0)
            .reps(2, 85.0, 2.0)
            .build();
        let outcome = ScenarioOutcome::run(&beginner(), &trace).unwrap();

        assert_eq!(outcome.raised_count(FaultKind::Inactive), 1);
        assert_eq!(outcome.summary.valid_reps, 5);
        assert_eq!(outcome.summary.faulted_reps, 0);
    }

    #[test]
    fn test_rest_resets_reps_when_configured() {
        let trace = SquatTraceBuilder::new()
            .stand(0.5)
            .reps(3, 85.0, 2.0)
            .stand(16.0)
            .reps(2, 85.0, 2.0)
            .build();
        let config = SessionConfig {
            reset_counts_on_inactivity: true,
            ..beginner()
        };
        let outcome = ScenarioOutcome::run(&config, &trace).unwrap();

        assert_eq!(outcome.summary.valid_reps, 2);
    }

    #[test]
    fn test_inactivity() {
        let trace = SquatTraceBuilder::new().stand(16.0).build();
        let outcome = ScenarioOutcome::run(&beginner(), &trace).unwrap();

        let raised = outcome.raised();
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].1, FaultKind::Inactive);
        assert!(raised[0].0 >= SessionTime::from_secs_f64(14.9));
        assert_eq!(outcome.feedback()[0].kind, FaultKind::Inactive);
    }

    #[test]
    fn test_tier_changes_depth_verdict() {
        let trace = SquatTraceBuilder::new().stand(0.5).rep(75.0, 2.0).stand(0.5).build();

        let beginner = ScenarioOutcome::run(&SessionConfig::for_tier("beginner"), &trace).unwrap();
        assert_eq!(beginner.summary.valid_reps, 1);

        let pro = ScenarioOutcome::run(&SessionConfig::for_tier("pro"), &trace).unwrap();
        assert_eq!(pro.summary.valid_reps, 0);
        assert_eq!(pro.summary.faulted_reps, 1);
        assert_eq!(pro.raised_count(FaultKind::TooShallow), 1);
        assert_eq!(pro.feedback()[0].kind, FaultKind::TooShallow);
        assert!(pro.reports.iter().any(|r| r.rep == Some(RepVerdict::Shallow)));
    }

    #[test]
    fn test_knee_script_with_sink() {
        let mut session = SquatSession::new(SessionId::new(9), &beginner())
            .unwrap()
            .with_sink(CollectingSink::new());
        let script = AngleScript::new(30)
            .hold(10, 10)
            .hold(50, 10)
            .angles(AngleSet::new(80, 30, 40, 20, 10), 60)
            .hold(50, 10)
            .hold(10, 10);

        let reports = run_script(&mut session, &script);
        let raised = reports
            .iter()
            .filter(|r| r.raised.contains(FaultKind::KneeAlignment))
            .count();
        assert_eq!(raised, 1);
        assert_eq!(reports.iter().filter(|r| r.feedback.is_some()).count(), 1);

        let summary = session.finish();
        assert_eq!(summary.valid_reps, 0);
        assert_eq!(summary.faulted_reps, 1);
    }

    #[test]
    fn test_clean_script_matches_clean_angles() {
        let mut session = SquatSession::new(SessionId::new(3), &beginner()).unwrap();
        let script = AngleScript::new(30).clean_rep(10).clean_rep(10);
        run_script(&mut session, &script);

        assert_eq!(session.counters().valid, 2);
        assert_eq!(clean_angles(80).knee_angle, 120);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_light_jitter_keeps_rep_count(seed in any::<u64>(), reps in 1usize..4) {
            let trace = SquatTraceBuilder::new()
                .jitter(0.5, seed)
                .stand(0.5)
                .reps(reps, 85.0, 2.0)
                .stand(0.5)
                .build();
            let outcome = ScenarioOutcome::run(&SessionConfig::default(), &trace).unwrap();

            prop_assert_eq!(outcome.summary.valid_reps as usize, reps);
            prop_assert_eq!(outcome.summary.faulted_reps, 0);
        }

        #[test]
        fn prop_summary_deterministic(seed in any::<u64>()) {
            let trace = SquatTraceBuilder::new()
                .jitter(1.0, seed)
                .lean_ratio(0.7)
                .stand(0.5)
                .reps(2, 85.0, 3.0)
                .build();

            let a = ScenarioOutcome::run(&SessionConfig::default(), &trace).unwrap();
            let b = ScenarioOutcome::run(&SessionConfig::default(), &trace).unwrap();
            prop_assert_eq!(a.summary, b.summary);
        }
    }
}
