//! Feedback delivery

use tracing::info;

use crate::FeedbackEvent;

/// Where emitted feedback goes (speech, UI overlay, log...)
pub trait FeedbackSink: Send {
    fn deliver(&mut self, event: &FeedbackEvent);
}

/// Writes every message to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FeedbackSink for TracingSink {
    fn deliver(&mut self, event: &FeedbackEvent) {
        info!(target: "formcoach::feedback", at = ?event.at, fault = %event.kind, "{}", event.message);
    }
}

/// Keeps every delivered message in memory
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub events: Vec<FeedbackEvent>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.message.as_str())
    }
}

impl FeedbackSink for CollectingSink {
    fn deliver(&mut self, event: &FeedbackEvent) {
        self.events.push(event.clone());
    }
}
