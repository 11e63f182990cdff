use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::controller::{EndSignal, SessionController};
use super::gate::ResumeFile;
use super::snapshot::SessionSnapshot;
use crate::channel::ChannelEvent;
use crate::error::{DeviceError, SessionError, SessionResult};
use crate::execution::CodeRunner;

const COMMAND_BUFFER: usize = 32;

enum SessionCommand {
    SubmitResume(ResumeFile, oneshot::Sender<SessionResult<()>>),
    Start(oneshot::Sender<SessionResult<()>>),
    End(oneshot::Sender<SessionSnapshot>),
    ToggleVideo(oneshot::Sender<SessionResult<bool>>),
    ToggleAudio(oneshot::Sender<SessionResult<bool>>),
    ScreenShare(bool, oneshot::Sender<SessionResult<()>>),
    Transcript(String, oneshot::Sender<SessionResult<()>>),
    DeviceFailure(DeviceError, oneshot::Sender<SessionSnapshot>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

enum Step {
    Command(Option<SessionCommand>),
    Event(ChannelEvent),
}

/// Handle to a session running on its own task
///
/// Commands and inbound channel events are served by one loop, so a command
/// never observes a half-applied message. Dropping every handle tears the
/// session down.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    runner: Option<CodeRunner>,
    cancel: CancellationToken,
    end: EndSignal,
}

impl SessionHandle {
    pub fn spawn(controller: SessionController) -> (Self, JoinHandle<SessionSnapshot>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let handle = Self {
            commands: tx,
            runner: controller.code_runner(),
            cancel: controller.cancellation_token(),
            end: controller.end_signal(),
        };

        let task = tokio::spawn(run(controller, rx));
        (handle, task)
    }

    /// Code runner, for technical categories only. Runs outside the session
    /// loop so channel traffic keeps flowing while code executes.
    pub fn code_runner(&self) -> Option<CodeRunner> {
        self.runner.clone()
    }

    /// Tear the session down from outside the loop
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| SessionError::Ended)?;
        rx.await.map_err(|_| SessionError::Ended)
    }

    pub async fn submit_resume(&self, file: ResumeFile) -> SessionResult<()> {
        self.request(|tx| SessionCommand::SubmitResume(file, tx)).await?
    }

    pub async fn start(&self) -> SessionResult<()> {
        self.request(SessionCommand::Start).await?
    }

    /// End the interview. Interrupts an outstanding upload, start or
    /// screen-share prompt rather than waiting behind it.
    pub async fn end(&self) -> SessionResult<SessionSnapshot> {
        self.end.request();
        self.request(SessionCommand::End).await
    }

    pub async fn toggle_video(&self) -> SessionResult<bool> {
        self.request(SessionCommand::ToggleVideo).await?
    }

    pub async fn toggle_audio(&self) -> SessionResult<bool> {
        self.request(SessionCommand::ToggleAudio).await?
    }

    pub async fn set_screen_share(&self, enabled: bool) -> SessionResult<()> {
        self.request(|tx| SessionCommand::ScreenShare(enabled, tx)).await?
    }

    /// Caption candidate speech recognized on this side of the channel
    pub async fn record_transcript(&self, text: impl Into<String>) -> SessionResult<()> {
        let text = text.into();
        self.request(|tx| SessionCommand::Transcript(text, tx)).await?
    }

    /// A capture backend lost a held device
    pub async fn report_device_failure(
        &self,
        error: DeviceError,
    ) -> SessionResult<SessionSnapshot> {
        self.request(|tx| SessionCommand::DeviceFailure(error, tx)).await
    }

    pub async fn snapshot(&self) -> SessionResult<SessionSnapshot> {
        self.request(SessionCommand::Snapshot).await
    }
}

async fn run(
    mut controller: SessionController,
    mut commands: mpsc::Receiver<SessionCommand>,
) -> SessionSnapshot {
    info!("Session loop started for {}", controller.category().id);

    loop {
        let step = tokio::select! {
            command = commands.recv() => Step::Command(command),
            Some(event) = controller.next_event() => Step::Event(event),
        };

        match step {
            Step::Command(Some(command)) => apply(&mut controller, command).await,
            Step::Command(None) => break,
            Step::Event(event) => controller.handle_event(event),
        }
    }

    let snapshot = controller.end_session();
    info!("Session loop stopped for {}", snapshot.category_id);
    snapshot
}

async fn apply(controller: &mut SessionController, command: SessionCommand) {
    let delivered = match command {
        SessionCommand::SubmitResume(file, reply) => {
            reply.send(controller.submit_resume(file).await).is_ok()
        }
        SessionCommand::Start(reply) => reply.send(controller.start_session().await).is_ok(),
        SessionCommand::End(reply) => reply.send(controller.end_session()).is_ok(),
        SessionCommand::ToggleVideo(reply) => reply.send(controller.toggle_video()).is_ok(),
        SessionCommand::ToggleAudio(reply) => reply.send(controller.toggle_audio()).is_ok(),
        SessionCommand::ScreenShare(enabled, reply) => {
            let result = if enabled {
                controller.start_screen_share().await
            } else {
                controller.stop_screen_share()
            };
            reply.send(result).is_ok()
        }
        SessionCommand::Transcript(text, reply) => {
            reply.send(controller.record_local_transcript(text)).is_ok()
        }
        SessionCommand::DeviceFailure(error, reply) => {
            controller.report_device_failure(error);
            reply.send(controller.snapshot()).is_ok()
        }
        SessionCommand::Snapshot(reply) => reply.send(controller.snapshot()).is_ok(),
    };

    if !delivered {
        warn!("Session command caller went away before the reply");
    }
}
