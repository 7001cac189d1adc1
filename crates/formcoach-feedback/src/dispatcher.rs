//! Feedback dispatcher - cooldown-throttled coaching messages

use std::collections::VecDeque;
use std::time::Duration;

use formcoach_core::{FaultKind, FaultSet, SessionTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::MessageRotation;

/// Dispatcher configuration
#[derive(Clone, Debug, PartialEq)]
pub struct FeedbackConfig {
    /// Minimum time between two emitted messages
    pub cooldown: Duration,
    /// Feedback events kept in the history window
    pub history_limit: usize,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        FeedbackConfig {
            cooldown: Duration::from_secs(3),
            history_limit: 256,
        }
    }
}

impl FeedbackConfig {
    /// Shortest cooldown a user may pick
    pub const MIN_COOLDOWN: Duration = Duration::from_secs(1);
    /// Longest cooldown a user may pick
    pub const MAX_COOLDOWN: Duration = Duration::from_secs(10);

    /// Configuration from a user-facing feedback frequency, clamped to 1-10 s
    pub fn with_cooldown_secs(secs: f64) -> Self {
        let secs = if secs.is_finite() {
            secs.clamp(
                Self::MIN_COOLDOWN.as_secs_f64(),
                Self::MAX_COOLDOWN.as_secs_f64(),
            )
        } else {
            FeedbackConfig::default().cooldown.as_secs_f64()
        };

        FeedbackConfig {
            cooldown: Duration::from_secs_f64(secs),
            ..FeedbackConfig::default()
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }
}

/// One emitted message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub at: SessionTime,
    pub kind: FaultKind,
    pub message: String,
}

/// How often a message was emitted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCount {
    pub message: String,
    pub count: u32,
}

/// End-of-session feedback summary
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    /// Messages emitted over the whole session
    pub total_feedback: u64,
    /// Up to three most frequent messages, ties in first-seen order
    pub common_issues: Vec<IssueCount>,
    /// Retained history, oldest first
    pub history: Vec<FeedbackEvent>,
}

/// Feedback dispatcher
#[derive(Clone, Debug)]
pub struct FeedbackDispatcher {
    config: FeedbackConfig,
    last_feedback_at: Option<SessionTime>,
    rotation: MessageRotation,
    /// Bounded history window
    history: VecDeque<FeedbackEvent>,
    /// Per-message counts in first-seen order; never trimmed
    tally: Vec<IssueCount>,
    total: u64,
}

impl Default for FeedbackDispatcher {
    fn default() -> Self {
        Self::new(FeedbackConfig::default())
    }
}

impl FeedbackDispatcher {
    pub fn new(config: FeedbackConfig) -> Self {
        FeedbackDispatcher {
            config,
            last_feedback_at: None,
            rotation: MessageRotation::new(),
            history: VecDeque::new(),
            tally: Vec::new(),
            total: 0,
        }
    }

    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }

    pub fn last_feedback_at(&self) -> Option<SessionTime> {
        self.last_feedback_at
    }

    /// Is a message emitted at `now` still blocked by the cooldown?
    pub fn in_cooldown(&self, now: SessionTime) -> bool {
        match self.last_feedback_at {
            Some(last) => now - last < self.config.cooldown,
            None => false,
        }
    }

    /// Turn the currently active faults into at most one message
    ///
    /// Nothing is emitted while the cooldown since the previous message is
    /// running, however many faults are active. Otherwise the
    /// highest-priority fault gets its next cue.
    pub fn analyze_and_notify(
        &mut self,
        faults: FaultSet,
        now: SessionTime,
    ) -> Option<FeedbackEvent> {
        let kind = faults.highest_priority()?;

        if self.in_cooldown(now) {
            debug!(fault = %kind, "feedback suppressed by cooldown");
            return None;
        }

        let event = FeedbackEvent {
            at: now,
            kind,
            message: self.rotation.next_message(kind).to_string(),
        };
        self.record(&event);

        info!(fault = %kind, message = %event.message, "feedback");
        Some(event)
    }

    fn record(&mut self, event: &FeedbackEvent) {
        self.last_feedback_at = Some(event.at);
        self.total += 1;

        match self.tally.iter_mut().find(|i| i.message == event.message) {
            Some(issue) => issue.count += 1,
            None => self.tally.push(IssueCount {
                message: event.message.clone(),
                count: 1,
            }),
        }

        self.history.push_back(event.clone());
        while self.history.len() > self.config.history_limit {
            self.history.pop_front();
        }
    }

    /// Messages emitted so far
    pub fn total_feedback(&self) -> u64 {
        self.total
    }

    /// Retained history, oldest first
    pub fn history(&self) -> impl Iterator<Item = &FeedbackEvent> {
        self.history.iter()
    }

    /// Up to three most frequent messages
    pub fn common_issues(&self) -> Vec<IssueCount> {
        let mut issues = self.tally.clone();
        // Stable: equal counts keep first-seen order
        issues.sort_by(|a, b| b.count.cmp(&a.count));
        issues.truncate(3);
        issues
    }

    /// Summary of the session so far
    pub fn session_summary(&self) -> FeedbackSummary {
        FeedbackSummary {
            total_feedback: self.total,
            common_issues: self.common_issues(),
            history: self.history.iter().cloned().collect(),
        }
    }

    /// Forget everything (new session)
    pub fn reset(&mut self) {
        *self = FeedbackDispatcher::new(self.config.clone());
    }
}
