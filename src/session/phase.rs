use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle stage of an interview session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    AwaitingResume,
    Ready,
    Active,
    /// Terminal; a new interview needs a new session
    Ended,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        self == SessionPhase::Ended
    }

    /// Whether the state machine allows `self -> next`
    pub fn can_transition_to(self, next: SessionPhase) -> bool {
        use SessionPhase::*;

        matches!(
            (self, next),
            (Idle, AwaitingResume)
                | (AwaitingResume, Ready)
                | (Ready, Active)
                | (Idle | AwaitingResume | Ready | Active, Ended)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::AwaitingResume => "awaiting_resume",
            SessionPhase::Ready => "ready",
            SessionPhase::Active => "active",
            SessionPhase::Ended => "ended",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
