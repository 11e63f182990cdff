use std::time::Duration;

use thiserror::Error;

use crate::media::TrackKind;
use crate::session::SessionPhase;

/// Failure to acquire a local capture stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("permission to capture {0} was denied")]
    PermissionDenied(TrackKind),

    #[error("no {0} device is available")]
    NotFound(TrackKind),

    #[error("{0} device was lost")]
    Lost(TrackKind),

    #[error("capture backend failure: {0}")]
    Backend(String),
}

/// Failure of the real-time interview channel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("gave up after {attempts} connection attempts: {last}")]
    Exhausted { attempts: u32, last: String },

    #[error("channel dropped: {0}")]
    Dropped(String),
}

/// Failure to upload the resume
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// File refused locally; nothing was sent
    #[error("resume rejected: {0}")]
    Rejected(String),

    #[error("resume upload request failed: {0}")]
    Request(String),

    #[error("resume upload failed ({status}): {message}")]
    Server { status: u16, message: String },
}

/// Failure of a code execution request. Surfaced inline as run output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("execution request failed: {0}")]
    Request(String),

    #[error("execution backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("execution request timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("a resume must be uploaded before the interview can start")]
    Precondition,

    #[error("interview start was refused: {0}")]
    Start(String),

    #[error("code is already running")]
    AlreadyRunning,

    #[error("cannot {action} while the session is {phase}")]
    InvalidPhase {
        phase: SessionPhase,
        action: &'static str,
    },

    #[error("the session has ended")]
    Ended,

    #[error("operation cancelled by session teardown")]
    Cancelled,
}

pub type SessionResult<T> = Result<T, SessionError>;

