use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::captions::{CaptionLog, Speaker};
use super::config::SessionConfig;
use super::gate::{ResumeAsset, ResumeFile, ResumeGate};
use super::phase::SessionPhase;
use super::snapshot::{EndReason, SessionSnapshot};
use crate::backend::{
    Category, CodeExecutor, HttpBackend, ResumeUploader, SessionStarter, StartRequest,
};
use crate::channel::{ChannelEvent, ChannelTransport, SessionChannel, SessionMessage};
use crate::error::{DeviceError, SessionError, SessionResult};
use crate::execution::CodeRunner;
use crate::media::{CaptureDevice, MediaController, MediaState};

/// External services a session talks to
#[derive(Clone)]
pub struct Collaborators {
    pub uploader: Arc<dyn ResumeUploader>,
    pub starter: Arc<dyn SessionStarter>,
    pub executor: Arc<dyn CodeExecutor>,
    pub transport: Arc<dyn ChannelTransport>,
    pub device: Arc<dyn CaptureDevice>,
}

impl Collaborators {
    /// Use the REST backend for upload, start and code execution
    pub fn from_backend(
        backend: Arc<HttpBackend>,
        transport: Arc<dyn ChannelTransport>,
        device: Arc<dyn CaptureDevice>,
    ) -> Self {
        Self {
            uploader: backend.clone(),
            starter: backend.clone(),
            executor: backend,
            transport,
            device,
        }
    }
}

/// Ends a session from outside its owner
///
/// Interrupts whatever the owner is awaiting, so a pending device prompt or
/// channel connect is discarded instead of completing first.
#[derive(Clone)]
pub struct EndSignal {
    cancel: CancellationToken,
    requested: Arc<AtomicBool>,
}

impl EndSignal {
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.cancel.cancel();
    }
}

/// Race `fut` against session teardown. `None` means the token fired first
/// and the completion was discarded.
async fn until_cancelled<F: Future>(token: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        output = fut => Some(output),
    }
}

/// One live interview: phase machine, devices, channel, transcript
///
/// A session is single-use. Once `Ended`, every operation fails with
/// [`SessionError::Ended`]; start a new interview with a new controller.
pub struct SessionController {
    category: Category,
    config: SessionConfig,
    phase: SessionPhase,
    history: Vec<SessionPhase>,
    gate: ResumeGate,
    media: MediaController,
    transport: Arc<dyn ChannelTransport>,
    channel: Option<SessionChannel>,
    starter: Arc<dyn SessionStarter>,
    runner: Option<CodeRunner>,
    captions: CaptionLog,
    current_question: Option<String>,
    interview_id: Option<String>,
    cancel: CancellationToken,
    end_requested: Arc<AtomicBool>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    end_reason: Option<EndReason>,
}

impl SessionController {
    pub fn new(category: Category, config: SessionConfig, deps: Collaborators) -> Self {
        info!("Creating interview session for {}", category.id);

        let cancel = CancellationToken::new();
        let runner = category.is_technical().then(|| {
            CodeRunner::new(
                Arc::clone(&deps.executor),
                config.execution_timeout,
                cancel.clone(),
            )
        });

        Self {
            gate: ResumeGate::new(deps.uploader, config.resume_limits.clone()),
            media: MediaController::new(deps.device),
            captions: CaptionLog::with_capacity(config.caption_capacity),
            transport: deps.transport,
            starter: deps.starter,
            category,
            config,
            phase: SessionPhase::Idle,
            history: vec![SessionPhase::Idle],
            channel: None,
            runner,
            current_question: None,
            interview_id: None,
            cancel,
            end_requested: Arc::new(AtomicBool::new(false)),
            started_at: None,
            ended_at: None,
            end_reason: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Every phase entered so far, starting with `Idle`
    pub fn phase_history(&self) -> &[SessionPhase] {
        &self.history
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn captions(&self) -> &CaptionLog {
        &self.captions
    }

    pub fn current_question(&self) -> Option<&str> {
        self.current_question.as_deref()
    }

    pub fn interview_id(&self) -> Option<&str> {
        self.interview_id.as_deref()
    }

    pub fn resume(&self) -> &ResumeAsset {
        self.gate.asset()
    }

    pub fn media_state(&self) -> MediaState {
        self.media.state()
    }

    pub fn held_streams(&self) -> usize {
        self.media.held_streams()
    }

    pub fn channel_open(&self) -> bool {
        self.channel.as_ref().map_or(false, |c| c.is_open())
    }

    pub fn end_reason(&self) -> Option<&EndReason> {
        self.end_reason.as_ref()
    }

    /// Code runner, for technical categories only
    pub fn code_runner(&self) -> Option<CodeRunner> {
        self.runner.clone()
    }

    /// Token that tears the session down when cancelled from elsewhere
    /// (e.g. the view unmounting while a request is outstanding)
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Handle that ends the session with [`EndReason::Requested`], even while
    /// an operation is outstanding
    pub fn end_signal(&self) -> EndSignal {
        EndSignal {
            cancel: self.cancel.clone(),
            requested: Arc::clone(&self.end_requested),
        }
    }

    /// Why the token fired
    fn interrupted_reason(&self) -> EndReason {
        if self.end_requested.load(Ordering::SeqCst) {
            EndReason::Requested
        } else {
            EndReason::Cancelled
        }
    }

    fn transition(&mut self, next: SessionPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal transition {} -> {}",
            self.phase,
            next
        );
        info!("Session {}: {} -> {}", self.category.id, self.phase, next);
        self.phase = next;
        self.history.push(next);
    }

    fn ensure_live(&mut self) -> SessionResult<()> {
        if self.phase.is_terminal() {
            return Err(SessionError::Ended);
        }
        if self.cancel.is_cancelled() {
            self.teardown(self.interrupted_reason());
            return Err(SessionError::Ended);
        }
        Ok(())
    }

    fn cancelled(&mut self) -> SessionError {
        warn!(
            "Session {} torn down while an operation was outstanding",
            self.category.id
        );
        self.teardown(self.interrupted_reason());
        SessionError::Cancelled
    }

    /// The session view is on screen; wait for the resume
    pub fn present(&mut self) -> SessionResult<SessionPhase> {
        self.ensure_live()?;

        if self.phase == SessionPhase::Idle {
            self.transition(SessionPhase::AwaitingResume);
            if self.gate.is_satisfied() {
                self.transition(SessionPhase::Ready);
            }
        }

        Ok(self.phase)
    }

    /// Upload the resume; satisfies the start precondition on success
    pub async fn submit_resume(&mut self, file: ResumeFile) -> SessionResult<()> {
        self.ensure_live()?;

        match self.phase {
            SessionPhase::Idle => {
                self.present()?;
            }
            SessionPhase::AwaitingResume | SessionPhase::Ready => {}
            phase => {
                return Err(SessionError::InvalidPhase {
                    phase,
                    action: "submit a resume",
                })
            }
        }

        let outcome = until_cancelled(&self.cancel, self.gate.submit(file)).await;
        match outcome {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                error!("Resume upload failed: {}", e);
                return Err(e.into());
            }
            None => return Err(self.cancelled()),
        }

        if self.phase == SessionPhase::AwaitingResume {
            self.transition(SessionPhase::Ready);
        }

        Ok(())
    }

    /// Register the interview, acquire camera/mic and open the channel
    ///
    /// Refused with [`SessionError::Precondition`] until a resume is
    /// uploaded. Any failure leaves the session in `Ready` with nothing held.
    pub async fn start_session(&mut self) -> SessionResult<()> {
        self.ensure_live()?;

        if !self.gate.is_satisfied() {
            warn!("Refusing to start {}: no resume uploaded", self.category.id);
            return Err(SessionError::Precondition);
        }

        if self.phase != SessionPhase::Ready {
            return Err(SessionError::InvalidPhase {
                phase: self.phase,
                action: "start the interview",
            });
        }

        let request = StartRequest::from(&self.category);
        let outcome = until_cancelled(&self.cancel, self.starter.start_interview(&request)).await;
        let response = match outcome {
            Some(Ok(response)) => response,
            Some(Err(e)) => {
                error!("Failed to start interview: {}", e);
                return Err(e);
            }
            None => return Err(self.cancelled()),
        };

        let interview_id = response
            .interview_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| self.category.id.clone());

        let outcome = until_cancelled(&self.cancel, self.media.acquire_camera_mic()).await;
        match outcome {
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                error!("Camera/mic unavailable: {}", e);
                return Err(e.into());
            }
            None => return Err(self.cancelled()),
        }

        let connect = SessionChannel::connect(
            self.transport.as_ref(),
            &interview_id,
            &self.config.reconnect,
            &self.cancel,
        );
        let outcome = until_cancelled(&self.cancel, connect).await;
        let channel = match outcome {
            Some(Ok(channel)) => channel,
            Some(Err(e)) => {
                error!("Failed to open interview channel: {}", e);
                self.media.release_camera();
                return Err(e.into());
            }
            None => return Err(self.cancelled()),
        };

        self.interview_id = Some(interview_id);
        self.channel = Some(channel);
        self.started_at = Some(Utc::now());
        self.transition(SessionPhase::Active);

        Ok(())
    }

    /// Wait for the next channel event. `None` when there is no open channel
    /// or the session was torn down.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        let event = {
            let channel = self.channel.as_mut()?;
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                event = channel.next_event() => Some(event),
            }
        };

        match event {
            Some(event) => event,
            None => {
                self.teardown(self.interrupted_reason());
                None
            }
        }
    }

    /// Apply one channel event. Runs to completion before the next is read.
    pub fn handle_event(&mut self, event: ChannelEvent) {
        if self.phase != SessionPhase::Active {
            debug!("Discarding channel event while session is {}", self.phase);
            return;
        }

        match event {
            ChannelEvent::Message(SessionMessage::Question { content }) => {
                self.captions.append(Speaker::Interviewer, content.clone());
                self.current_question = Some(content);
            }
            ChannelEvent::Message(SessionMessage::Transcript { content }) => {
                self.captions.append(Speaker::Candidate, content);
            }
            ChannelEvent::Lost(e) => {
                error!("Interview channel lost: {}", e);
                self.teardown(EndReason::ChannelLost(e.to_string()));
            }
        }
    }

    /// Read and apply one event. Returns `false` once the channel is done.
    pub async fn pump(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Caption locally recognized candidate speech
    pub fn record_local_transcript(&mut self, text: impl Into<String>) -> SessionResult<()> {
        self.ensure_live()?;
        if self.phase != SessionPhase::Active {
            return Err(SessionError::InvalidPhase {
                phase: self.phase,
                action: "record a transcript",
            });
        }

        self.captions.append(Speaker::Candidate, text);
        Ok(())
    }

    pub fn toggle_video(&mut self) -> SessionResult<bool> {
        self.ensure_live()?;
        Ok(self.media.toggle_video())
    }

    pub fn toggle_audio(&mut self) -> SessionResult<bool> {
        self.ensure_live()?;
        Ok(self.media.toggle_audio())
    }

    pub async fn start_screen_share(&mut self) -> SessionResult<()> {
        self.ensure_live()?;

        let outcome = until_cancelled(&self.cancel, self.media.start_screen_share()).await;
        match outcome {
            Some(Ok(_)) => Ok(()),
            Some(Err(e)) => Err(e.into()),
            None => Err(self.cancelled()),
        }
    }

    pub fn stop_screen_share(&mut self) -> SessionResult<()> {
        self.ensure_live()?;
        self.media.stop_screen_share();
        Ok(())
    }

    /// A held device failed (unplugged, revoked). Ends an active session.
    pub fn report_device_failure(&mut self, error: DeviceError) {
        if self.phase == SessionPhase::Active {
            error!("Capture device lost mid-session: {}", error);
            self.teardown(EndReason::DeviceLost(error.to_string()));
        } else {
            warn!("Capture device failure while {}: {}", self.phase, error);
        }
    }

    /// End the interview from any phase. Idempotent.
    pub fn end_session(&mut self) -> SessionSnapshot {
        self.teardown(EndReason::Requested);
        self.snapshot()
    }

    fn teardown(&mut self, reason: EndReason) {
        if self.phase.is_terminal() {
            return;
        }

        info!("Ending session {} ({:?})", self.category.id, reason);

        self.cancel.cancel();
        let released = self.media.release();
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }

        self.ended_at = Some(Utc::now());
        self.end_reason = Some(reason);
        self.transition(SessionPhase::Ended);

        info!(
            "Session {} ended: {} stream(s) released, {} caption(s)",
            self.category.id,
            released,
            self.captions.len()
        );
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let duration_secs = self.started_at.map_or(0.0, |start| {
            let end = self.ended_at.unwrap_or_else(Utc::now);
            end.signed_duration_since(start).num_milliseconds() as f64 / 1000.0
        });

        SessionSnapshot {
            phase: self.phase,
            category_id: self.category.id.clone(),
            interview_id: self.interview_id.clone(),
            resume: self.gate.asset().clone(),
            media: self.media.state(),
            held_streams: self.media.held_streams(),
            channel_open: self.channel_open(),
            current_question: self.current_question.clone(),
            captions: self.captions.snapshot(),
            started_at: self.started_at,
            ended_at: self.ended_at,
            duration_secs,
            end_reason: self.end_reason.clone(),
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.teardown(EndReason::Dropped);
    }
}
