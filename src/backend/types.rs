use std::fmt;

use serde::{Deserialize, Serialize};

/// Interview flavor. Technical interviews get a code runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterviewKind {
    #[serde(rename = "technical")]
    Technical,
    #[serde(rename = "role-based")]
    RoleBased,
}

impl InterviewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewKind::Technical => "technical",
            InterviewKind::RoleBased => "role-based",
        }
    }
}

impl fmt::Display for InterviewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Category descriptor from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: InterviewKind,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Category {
    pub fn is_technical(&self) -> bool {
        self.kind == InterviewKind::Technical
    }
}

/// Body of the session-start call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    #[serde(rename = "type")]
    pub kind: InterviewKind,
    pub category: String,
}

impl From<&Category> for StartRequest {
    fn from(category: &Category) -> Self {
        Self {
            kind: category.kind,
            category: category.id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartResponse {
    pub status: String,
    pub message: String,
    pub interview_id: Option<String>,
    pub data: Option<serde_json::Value>,
}

/// Status envelope returned by the upload endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UploadResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Javascript,
    Python,
    Java,
    Cpp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExecutionRequest {
    pub code: String,
    pub language: Language,
}

impl CodeExecutionRequest {
    pub fn new(code: impl Into<String>, language: Language) -> Self {
        Self {
            code: code.into(),
            language,
        }
    }
}
