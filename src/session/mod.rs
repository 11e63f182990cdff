//! Live interview session
//!
//! This module provides the `SessionController` that owns:
//! - The phase state machine (`Idle → AwaitingResume → Ready → Active → Ended`)
//! - The resume precondition gate
//! - Camera/mic and screen capture through `MediaController`
//! - The real-time interview channel and the rolling caption log
//! - The code runner for technical categories
//!
//! `SessionHandle` runs a controller on its own task for callers that share it.

mod actor;
mod captions;
mod config;
mod controller;
mod gate;
mod phase;
mod snapshot;

pub use actor::SessionHandle;
pub use captions::{CaptionEntry, CaptionLog, Speaker, CAPTION_CAPACITY};
pub use config::SessionConfig;
pub use controller::{Collaborators, EndSignal, SessionController};
pub use gate::{ResumeAsset, ResumeFile, ResumeGate, ResumeLimits, MAX_RESUME_BYTES};
pub use phase::SessionPhase;
pub use snapshot::{EndReason, SessionSnapshot};
