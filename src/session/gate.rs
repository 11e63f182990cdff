use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::backend::ResumeUploader;
use crate::error::UploadError;

/// Practical size ceiling for a resume document (5 MiB)
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

const ACCEPTED_TYPES: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
];

/// A resume document picked by the candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    file_name: String,
    bytes: Vec<u8>,
}

impl ResumeFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume".to_string());

        Ok(Self { file_name, bytes })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lowercased extension, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    pub fn content_type(&self) -> &'static str {
        self.extension()
            .and_then(|ext| {
                ACCEPTED_TYPES
                    .iter()
                    .find(|(known, _)| *known == ext)
                    .map(|(_, mime)| *mime)
            })
            .unwrap_or("application/octet-stream")
    }

    /// Check document format and size
    pub fn validate(&self, limits: &ResumeLimits) -> Result<(), UploadError> {
        if self.is_empty() {
            return Err(UploadError::Rejected(format!("{} is empty", self.file_name)));
        }

        let accepted = self
            .extension()
            .map(|ext| ACCEPTED_TYPES.iter().any(|(known, _)| *known == ext))
            .unwrap_or(false);
        if !accepted {
            return Err(UploadError::Rejected(format!(
                "{} is not a PDF, DOC or DOCX document",
                self.file_name
            )));
        }

        if self.len() > limits.max_bytes {
            return Err(UploadError::Rejected(format!(
                "{} is {} bytes, the limit is {} bytes",
                self.file_name,
                self.len(),
                limits.max_bytes
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeLimits {
    /// When false, files go to the uploader unchecked
    pub enforce: bool,
    pub max_bytes: usize,
}

impl Default for ResumeLimits {
    fn default() -> Self {
        Self {
            enforce: true,
            max_bytes: MAX_RESUME_BYTES,
        }
    }
}

/// Uploaded-resume state for one session attempt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResumeAsset {
    pub uploaded: bool,
    pub file_ref: Option<String>,
}

/// Blocks the interview until a resume has been uploaded
pub struct ResumeGate {
    uploader: Arc<dyn ResumeUploader>,
    limits: ResumeLimits,
    asset: ResumeAsset,
}

impl ResumeGate {
    pub fn new(uploader: Arc<dyn ResumeUploader>, limits: ResumeLimits) -> Self {
        Self {
            uploader,
            limits,
            asset: ResumeAsset::default(),
        }
    }

    /// Upload `file`. On failure the gate is left as it was.
    pub async fn submit(&mut self, file: ResumeFile) -> Result<(), UploadError> {
        if self.limits.enforce {
            if let Err(e) = file.validate(&self.limits) {
                warn!("{}", e);
                return Err(e);
            }
        }

        self.uploader.upload_resume(&file).await?;

        info!("Resume gate satisfied by {}", file.file_name());
        self.asset = ResumeAsset {
            uploaded: true,
            file_ref: Some(file.file_name),
        };

        Ok(())
    }

    pub fn is_satisfied(&self) -> bool {
        self.asset.uploaded
    }

    pub fn asset(&self) -> &ResumeAsset {
        &self.asset
    }
}
