// Shared fakes for the integration tests
//
// `FakeBackend` stands in for the REST collaborators, `ScriptedTransport`
// hands the test the sending side of each opened channel and
// `spawn_mock_backend` serves the REST endpoints over real HTTP.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use interview_session::backend::{
    builtin_categories, find_category, CodeExecutionRequest, CodeExecutor, ResumeUploader,
    SessionStarter, StartRequest, StartResponse,
};
use interview_session::channel::{ChannelTransport, InboundFrame, ReconnectPolicy};
use interview_session::config::BackendConfig;
use interview_session::error::{ChannelError, ExecutionError, SessionError, UploadError};
use interview_session::media::{SyntheticDevice, SyntheticPolicy};
use interview_session::session::{
    Collaborators, ResumeFile, ResumeLimits, SessionConfig, SessionController, CAPTION_CAPACITY,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const ROLE_BASED: &str = "general-interview";
pub const TECHNICAL: &str = "software-engineer-technical";

/// Session tuning with millisecond backoff so retry tests stay fast
pub fn fast_config() -> SessionConfig {
    SessionConfig {
        reconnect: ReconnectPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        },
        resume_limits: ResumeLimits::default(),
        execution_timeout: Some(Duration::from_secs(5)),
        caption_capacity: CAPTION_CAPACITY,
    }
}

pub fn resume_pdf() -> ResumeFile {
    ResumeFile::new("jane-doe.pdf", b"%PDF-1.4 resume body".to_vec())
}

/// In-memory stand-in for the upload, start and execute endpoints
#[derive(Default)]
pub struct FakeBackend {
    pub uploads: AtomicUsize,
    pub starts: AtomicUsize,
    pub executions: AtomicUsize,
    pub upload_error: Mutex<Option<UploadError>>,
    pub start_error: Mutex<Option<String>>,
    pub interview_id: Mutex<Option<String>>,
    pub start_requests: Mutex<Vec<StartRequest>>,
    pub execute_delay: Mutex<Duration>,
}

impl FakeBackend {
    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }

    pub fn fail_uploads(&self, error: UploadError) {
        *self.upload_error.lock().unwrap() = Some(error);
    }

    pub fn fail_starts(&self, reason: &str) {
        *self.start_error.lock().unwrap() = Some(reason.to_string());
    }

    pub fn assign_interview_id(&self, id: &str) {
        *self.interview_id.lock().unwrap() = Some(id.to_string());
    }

    pub fn slow_execution(&self, delay: Duration) {
        *self.execute_delay.lock().unwrap() = delay;
    }
}

#[async_trait::async_trait]
impl ResumeUploader for FakeBackend {
    async fn upload_resume(&self, _file: &ResumeFile) -> Result<(), UploadError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        match self.upload_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl SessionStarter for FakeBackend {
    async fn start_interview(&self, request: &StartRequest) -> Result<StartResponse, SessionError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.start_requests.lock().unwrap().push(request.clone());

        if let Some(reason) = self.start_error.lock().unwrap().clone() {
            return Err(SessionError::Start(reason));
        }

        Ok(StartResponse {
            status: "success".to_string(),
            message: "Interview started".to_string(),
            interview_id: self.interview_id.lock().unwrap().clone(),
            data: None,
        })
    }
}

#[async_trait::async_trait]
impl CodeExecutor for FakeBackend {
    async fn execute(&self, request: &CodeExecutionRequest) -> Result<String, ExecutionError> {
        self.executions.fetch_add(1, Ordering::SeqCst);

        let delay = *self.execute_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if request.code.contains("throw") {
            return Err(ExecutionError::Backend {
                status: 500,
                body: "runtime error".to_string(),
            });
        }

        Ok(format!("ran {} bytes", request.code.len()))
    }
}

/// Transport whose frames are pushed by the test
#[derive(Default)]
pub struct ScriptedTransport {
    failures_left: AtomicU32,
    opens: AtomicU32,
    opened_ids: Mutex<Vec<String>>,
    senders: Mutex<Vec<mpsc::Sender<InboundFrame>>>,
    tokens: Mutex<Vec<CancellationToken>>,
}

impl ScriptedTransport {
    /// Refuse the first `n` connection attempts
    pub fn failing(n: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(n),
            ..Self::default()
        }
    }

    pub fn opens(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn opened_ids(&self) -> Vec<String> {
        self.opened_ids.lock().unwrap().clone()
    }

    /// Sender for the most recently opened channel
    pub fn sender(&self) -> mpsc::Sender<InboundFrame> {
        self.senders
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no channel opened")
    }

    /// Shutdown token of the most recently opened channel
    pub fn shutdown_token(&self) -> CancellationToken {
        self.tokens
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no channel opened")
    }

    pub async fn push(&self, raw: &str) {
        self.sender()
            .send(InboundFrame::Text(raw.to_string()))
            .await
            .expect("channel receiver dropped");
    }
}

#[async_trait::async_trait]
impl ChannelTransport for ScriptedTransport {
    async fn open(
        &self,
        interview_id: &str,
        shutdown: CancellationToken,
    ) -> Result<mpsc::Receiver<InboundFrame>, ChannelError> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        let refused = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(ChannelError::Connect {
                endpoint: format!("scripted://{}", interview_id),
                reason: "connection refused".to_string(),
            });
        }

        let (tx, rx) = mpsc::channel(16);
        self.opened_ids.lock().unwrap().push(interview_id.to_string());
        self.senders.lock().unwrap().push(tx);
        self.tokens.lock().unwrap().push(shutdown);
        Ok(rx)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Fakes wired together for one session
pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub transport: Arc<ScriptedTransport>,
    pub device: SyntheticDevice,
    pub config: SessionConfig,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(SyntheticPolicy::default(), ScriptedTransport::default())
    }

    pub fn with_policy(policy: SyntheticPolicy) -> Self {
        Self::with(policy, ScriptedTransport::default())
    }

    pub fn with(policy: SyntheticPolicy, transport: ScriptedTransport) -> Self {
        Self {
            backend: Arc::new(FakeBackend::default()),
            transport: Arc::new(transport),
            device: SyntheticDevice::new(policy),
            config: fast_config(),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            uploader: self.backend.clone(),
            starter: self.backend.clone(),
            executor: self.backend.clone(),
            transport: self.transport.clone(),
            device: Arc::new(self.device.clone()),
        }
    }

    pub fn controller(&self, category_id: &str) -> SessionController {
        let categories = builtin_categories();
        let category = find_category(&categories, category_id)
            .expect("unknown built-in category")
            .clone();
        SessionController::new(category, self.config.clone(), self.collaborators())
    }

    /// A controller that has been presented, given a resume and started
    pub async fn active(&self, category_id: &str) -> SessionController {
        let mut controller = self.controller(category_id);
        controller.present().expect("present");
        controller
            .submit_resume(resume_pdf())
            .await
            .expect("resume upload");
        controller.start_session().await.expect("start");
        controller
    }
}

/// Requests seen by the mock REST backend
#[derive(Default)]
pub struct MockBackendState {
    pub executions: AtomicUsize,
    pub catalog_hits: AtomicUsize,
    /// (field name, file name, content type, size) per uploaded part
    pub uploads: Mutex<Vec<(String, String, String, usize)>>,
    pub starts: Mutex<Vec<serde_json::Value>>,
}

impl MockBackendState {
    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

/// Serve a mock interview backend on an ephemeral port
///
/// - `GET /api/interviews/options`: one technical category wrapped in `data`
/// - `GET /api/empty`: an empty bare list
/// - `POST /resume/upload`: multipart; file names containing "reject" get an
///   error envelope with status 200
/// - `POST /interview/start`: returns interview id `iv-900`
/// - `POST /api/code/execute`: code containing "sleep" takes 300ms, "slow"
///   takes 1.5s, "stall" takes 3s, and code containing "fail" gets a 500
pub async fn spawn_mock_backend() -> anyhow::Result<(SocketAddr, Arc<MockBackendState>)> {
    let state = Arc::new(MockBackendState::default());

    let app = Router::new()
        .route("/api/interviews/options", get(mock_catalog))
        .route("/api/empty", get(|| async { Json(serde_json::json!([])) }))
        .route("/resume/upload", post(mock_upload))
        .route("/interview/start", post(mock_start))
        .route("/api/code/execute", post(mock_execute))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok((addr, state))
}

pub fn mock_backend_config(addr: SocketAddr) -> BackendConfig {
    BackendConfig {
        base_url: format!("http://{}", addr),
        request_timeout_secs: 5,
        ..BackendConfig::default()
    }
}

async fn mock_catalog(State(state): State<Arc<MockBackendState>>) -> Json<serde_json::Value> {
    state.catalog_hits.fetch_add(1, Ordering::SeqCst);
    Json(serde_json::json!({
        "data": [{
            "id": "rust-systems",
            "title": "Rust Systems Engineer",
            "description": "Ownership, async and unsafe",
            "type": "technical",
            "icon": "cpu",
            "duration": "60 minutes",
            "skills": ["Rust", "Tokio"]
        }]
    }))
}

async fn mock_upload(
    State(state): State<Arc<MockBackendState>>,
    mut multipart: Multipart,
) -> Json<serde_json::Value> {
    let mut rejected = false;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let size = field.bytes().await.map(|b| b.len()).unwrap_or(0);

        rejected |= file_name.contains("reject");
        state
            .uploads
            .lock()
            .unwrap()
            .push((name, file_name, content_type, size));
    }

    if rejected {
        Json(serde_json::json!({"status": "error", "message": "Unsupported resume"}))
    } else {
        Json(serde_json::json!({"status": "success", "message": "Resume uploaded"}))
    }
}

async fn mock_start(
    State(state): State<Arc<MockBackendState>>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    state.starts.lock().unwrap().push(body);
    Json(serde_json::json!({
        "status": "success",
        "message": "Interview started",
        "interview_id": "iv-900"
    }))
}

async fn mock_execute(
    State(state): State<Arc<MockBackendState>>,
    Json(request): Json<CodeExecutionRequest>,
) -> (StatusCode, String) {
    state.executions.fetch_add(1, Ordering::SeqCst);

    let delay = if request.code.contains("stall") {
        Duration::from_secs(3)
    } else if request.code.contains("slow") {
        Duration::from_millis(1500)
    } else if request.code.contains("sleep") {
        Duration::from_millis(300)
    } else {
        Duration::ZERO
    };
    tokio::time::sleep(delay).await;

    if request.code.contains("fail") {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Compilation failed".to_string(),
        );
    }

    (
        StatusCode::OK,
        format!("{:?} printed {}", request.language, request.code.len()),
    )
}
