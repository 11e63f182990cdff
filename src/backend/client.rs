use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tracing::{error, info};

use super::catalog::CatalogPayload;
use super::types::{Category, CodeExecutionRequest, StartRequest, StartResponse, UploadResponse};
use super::{CategorySource, CodeExecutor, ResumeUploader, SessionStarter};
use crate::config::BackendConfig;
use crate::error::{ExecutionError, SessionError, UploadError};
use crate::session::ResumeFile;

/// REST client for the interview backend
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
    execute_timeout: Option<Duration>,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            config,
            execute_timeout: None,
        })
    }

    /// Bound code execution by the run limit instead of the client-wide
    /// request timeout
    pub fn with_execute_timeout(mut self, limit: Option<Duration>) -> Self {
        self.execute_timeout = limit;
        self
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs.max(1))
    }

    /// Absolute URL for a backend path
    pub fn url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    async fn error_text(response: Response) -> (u16, String) {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        (status, body)
    }
}

#[async_trait::async_trait]
impl CategorySource for HttpBackend {
    async fn categories(&self) -> Result<Vec<Category>> {
        let url = self.url(&self.config.catalog_path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach catalog at {}", url))?;

        if !response.status().is_success() {
            let (status, body) = Self::error_text(response).await;
            bail!("Catalog request failed ({}): {}", status, body);
        }

        let payload: CatalogPayload = response
            .json()
            .await
            .context("Failed to parse interview catalog")?;

        Ok(payload.into_categories())
    }
}

#[async_trait::async_trait]
impl ResumeUploader for HttpBackend {
    async fn upload_resume(&self, file: &ResumeFile) -> Result<(), UploadError> {
        let url = self.url(&self.config.upload_path);
        info!("Uploading resume {} ({} bytes)", file.file_name(), file.len());

        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.file_name().to_string())
            .mime_str(file.content_type())
            .map_err(|e| UploadError::Request(e.to_string()))?;
        let form = Form::new().part(self.config.upload_field.clone(), part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let (status, message) = Self::error_text(response).await;
            error!("Resume upload failed ({}): {}", status, message);
            return Err(UploadError::Server { status, message });
        }

        // The backend reports some failures as 200 with an error envelope
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if let Ok(envelope) = serde_json::from_str::<UploadResponse>(&body) {
            if envelope.status.eq_ignore_ascii_case("error") {
                error!("Resume upload rejected by backend: {}", envelope.message);
                return Err(UploadError::Server {
                    status,
                    message: envelope.message,
                });
            }
        }

        info!("Resume {} uploaded", file.file_name());
        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStarter for HttpBackend {
    async fn start_interview(&self, request: &StartRequest) -> Result<StartResponse, SessionError> {
        let url = self.url(&self.config.start_path);
        info!("Starting interview for category {}", request.category);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| SessionError::Start(e.to_string()))?;

        if !response.status().is_success() {
            let (status, body) = Self::error_text(response).await;
            return Err(SessionError::Start(format!("{}: {}", status, body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SessionError::Start(e.to_string()))?;

        // A plain-text acknowledgement is still a successful start
        Ok(serde_json::from_str(&body).unwrap_or_else(|_| StartResponse {
            status: "success".to_string(),
            message: body,
            ..StartResponse::default()
        }))
    }
}

#[async_trait::async_trait]
impl CodeExecutor for HttpBackend {
    async fn execute(&self, request: &CodeExecutionRequest) -> Result<String, ExecutionError> {
        let url = self.url(&self.config.execute_path);
        let limit = self.execute_timeout.unwrap_or_else(|| self.request_timeout());
        let failed = |e: reqwest::Error| {
            if e.is_timeout() {
                ExecutionError::TimedOut(limit)
            } else {
                ExecutionError::Request(e.to_string())
            }
        };

        let response = self
            .client
            .post(&url)
            .timeout(limit)
            .json(request)
            .send()
            .await
            .map_err(failed)?;

        if !response.status().is_success() {
            let (status, body) = Self::error_text(response).await;
            return Err(ExecutionError::Backend { status, body });
        }

        response.text().await.map_err(failed)
    }
}
