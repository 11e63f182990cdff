use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::nats::NatsTransport;
use super::websocket::WebSocketTransport;
use crate::config::ChannelConfig;
use crate::error::ChannelError;

/// Raw frame forwarded by a transport's reader task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    /// The remote side closed or the connection failed
    Closed(Option<String>),
}

/// Persistent connection carrying interview frames
#[async_trait::async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Open the channel for `interview_id`
    ///
    /// The transport spawns a reader task that forwards frames in arrival
    /// order and stops when `shutdown` is cancelled.
    async fn open(
        &self,
        interview_id: &str,
        shutdown: CancellationToken,
    ) -> Result<mpsc::Receiver<InboundFrame>, ChannelError>;

    /// Transport name for logging
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    #[serde(alias = "ws")]
    WebSocket,
    Nats,
}

pub struct TransportFactory;

impl TransportFactory {
    pub fn create(config: &ChannelConfig) -> Arc<dyn ChannelTransport> {
        match config.transport {
            TransportKind::WebSocket => Arc::new(WebSocketTransport::new(
                config.ws_url.clone(),
                config.path_template.clone(),
            )),
            TransportKind::Nats => Arc::new(NatsTransport::new(
                config.nats_url.clone(),
                config.subject_prefix.clone(),
            )),
        }
    }
}
