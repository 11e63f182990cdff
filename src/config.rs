use anyhow::{Context, Result};
use serde::Deserialize;

use crate::channel::TransportKind;
use crate::media::DeviceBackendKind;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub backend: BackendConfig,
    pub channel: ChannelConfig,
    pub media: MediaConfig,
    pub resume: ResumeConfig,
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "interview-session".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 7800,
        }
    }
}

/// Interview backend REST endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub catalog_path: String,
    pub upload_path: String,
    /// Multipart field carrying the resume document
    pub upload_field: String,
    pub start_path: String,
    pub execute_path: String,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            catalog_path: "/api/interviews/options".to_string(),
            upload_path: "/resume/upload".to_string(),
            upload_field: "resume".to_string(),
            start_path: "/interview/start".to_string(),
            execute_path: "/api/code/execute".to_string(),
            request_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub transport: TransportKind,
    pub ws_url: String,
    /// `{interview_id}` is replaced with the session's interview id
    pub path_template: String,
    pub nats_url: String,
    pub subject_prefix: String,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::WebSocket,
            ws_url: "ws://localhost:8000".to_string(),
            path_template: "/ws/interview/{interview_id}".to_string(),
            nats_url: "nats://localhost:4222".to_string(),
            subject_prefix: "interview".to_string(),
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 4000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub backend: DeviceBackendKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResumeConfig {
    pub enforce_limits: bool,
    pub max_bytes: usize,
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            enforce_limits: true,
            max_bytes: crate::session::MAX_RESUME_BYTES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// 0 disables the timeout
    pub timeout_secs: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl Config {
    /// Load from an optional file (`path` without extension) layered with
    /// `INTERVIEW__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("INTERVIEW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Failed to deserialize config")
    }
}
