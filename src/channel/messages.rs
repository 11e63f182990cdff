use serde::{Deserialize, Serialize};
use tracing::debug;

/// Inbound interview message
///
/// Frames are JSON objects with a `type` discriminator and a `content`
/// string. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SessionMessage {
    /// The interviewer asked something
    Question { content: String },
    /// Recognized candidate speech
    Transcript { content: String },
}

impl SessionMessage {
    /// Decode a raw frame. Unknown kinds and malformed JSON yield `None`.
    pub fn decode(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(message) => Some(message),
            Err(e) => {
                debug!("Dropping unrecognized channel frame: {}", e);
                None
            }
        }
    }

    pub fn content(&self) -> &str {
        match self {
            SessionMessage::Question { content } | SessionMessage::Transcript { content } => {
                content
            }
        }
    }
}
