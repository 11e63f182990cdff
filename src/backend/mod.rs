//! Interview backend collaborators
//!
//! Each external service the session depends on is a trait so the session
//! can run against the REST backend (`HttpBackend`) or a stand-in.

pub mod catalog;
pub mod client;
pub mod types;

use crate::error::{ExecutionError, SessionError, UploadError};
use crate::session::ResumeFile;

pub use catalog::{builtin_categories, find_category, load_catalog};
pub use client::HttpBackend;
pub use types::{
    Category, CodeExecutionRequest, InterviewKind, Language, StartRequest, StartResponse,
};

/// Source of interview categories
#[async_trait::async_trait]
pub trait CategorySource: Send + Sync {
    async fn categories(&self) -> anyhow::Result<Vec<Category>>;
}

/// Receives the candidate's resume
#[async_trait::async_trait]
pub trait ResumeUploader: Send + Sync {
    async fn upload_resume(&self, file: &ResumeFile) -> Result<(), UploadError>;
}

/// Registers a new interview with the backend
#[async_trait::async_trait]
pub trait SessionStarter: Send + Sync {
    async fn start_interview(&self, request: &StartRequest) -> Result<StartResponse, SessionError>;
}

/// Runs candidate code; the response body is the combined output
#[async_trait::async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute(&self, request: &CodeExecutionRequest) -> Result<String, ExecutionError>;
}
