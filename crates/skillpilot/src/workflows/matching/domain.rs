use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::ranking::{OpportunityId, StudentId};

/// A student and the opportunity they were matched with.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchPair {
    pub student: StudentId,
    pub opportunity: OpportunityId,
}

impl MatchPair {
    pub fn new(student: impl Into<String>, opportunity: impl Into<String>) -> Self {
        Self {
            student: StudentId(student.into()),
            opportunity: OpportunityId(opportunity.into()),
        }
    }
}

impl fmt::Display for MatchPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.student, self.opportunity)
    }
}

/// Delivery state of a pair's match email within one page session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationState {
    Unsent,
    Sent,
    Failed,
}

impl NotificationState {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationState::Unsent => "unsent",
            NotificationState::Sent => "sent",
            NotificationState::Failed => "failed",
        }
    }
}

/// In-memory record bound to one rendered pair row. Never persisted; a reload rebuilds it
/// from what the server reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationRecord {
    pub pair: MatchPair,
    pub state: NotificationState,
    pub dispatching: bool,
    pub last_message: Option<String>,
    pub attempted_at: Option<DateTime<Utc>>,
}

impl NotificationRecord {
    pub fn new(pair: MatchPair, state: NotificationState) -> Self {
        Self {
            pair,
            state,
            dispatching: false,
            last_message: None,
            attempted_at: None,
        }
    }

    pub(crate) fn settle(&mut self, state: NotificationState, message: String) {
        self.dispatching = false;
        // Sent is terminal for the session.
        if self.state != NotificationState::Sent {
            self.state = state;
        }
        self.last_message = Some(message);
    }
}

/// A pair as reported by the server when the matching page loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPair {
    pub pair: MatchPair,
    #[serde(default)]
    pub already_sent: bool,
}

impl From<MatchPair> for RenderedPair {
    fn from(pair: MatchPair) -> Self {
        Self {
            pair,
            already_sent: false,
        }
    }
}
