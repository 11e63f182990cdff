pub mod backend;
pub mod channel;
pub mod config;
pub mod error;
pub mod execution;
pub mod http;
pub mod media;
pub mod session;

pub use backend::{Category, CodeExecutionRequest, HttpBackend, InterviewKind, Language};
pub use channel::{ChannelTransport, SessionChannel, SessionMessage, TransportFactory};
pub use config::Config;
pub use error::{ChannelError, DeviceError, ExecutionError, SessionError, SessionResult, UploadError};
pub use execution::{CodeRunner, RunOutcome};
pub use http::{create_router, AppState};
pub use media::{CaptureDevice, CaptureDeviceFactory, MediaController, MediaState, TrackKind};
pub use session::{
    CaptionLog, Collaborators, ResumeFile, SessionConfig, SessionController, SessionHandle,
    SessionPhase, SessionSnapshot, Speaker,
};
