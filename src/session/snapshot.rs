use chrono::{DateTime, Utc};
use serde::Serialize;

use super::captions::CaptionEntry;
use super::gate::ResumeAsset;
use super::phase::SessionPhase;
use crate::media::MediaState;

/// Why a session reached `Ended`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum EndReason {
    /// `end_session` was called
    Requested,
    ChannelLost(String),
    DeviceLost(String),
    /// The session's cancellation token fired
    Cancelled,
    /// The controller was dropped without being ended
    Dropped,
}

/// Read model of a session for the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,

    pub category_id: String,

    /// Address of the interview channel, once started
    pub interview_id: Option<String>,

    pub resume: ResumeAsset,

    pub media: MediaState,

    /// Capture streams currently held
    pub held_streams: usize,

    pub channel_open: bool,

    pub current_question: Option<String>,

    /// Rolling transcript, oldest first
    pub captions: Vec<CaptionEntry>,

    pub started_at: Option<DateTime<Utc>>,

    pub ended_at: Option<DateTime<Utc>>,

    /// Seconds spent in `Active` so far
    pub duration_secs: f64,

    pub end_reason: Option<EndReason>,
}
