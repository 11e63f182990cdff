use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::transport::{ChannelTransport, InboundFrame};
use crate::error::ChannelError;

const FRAME_BUFFER: usize = 100;

/// WebSocket channel to the interview backend
pub struct WebSocketTransport {
    base_url: String,
    path_template: String,
}

impl WebSocketTransport {
    pub fn new(base_url: impl Into<String>, path_template: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path_template: path_template.into(),
        }
    }

    /// Full endpoint for an interview
    pub fn endpoint(&self, interview_id: &str) -> String {
        let path = self.path_template.replace("{interview_id}", interview_id);
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait::async_trait]
impl ChannelTransport for WebSocketTransport {
    async fn open(
        &self,
        interview_id: &str,
        shutdown: CancellationToken,
    ) -> Result<mpsc::Receiver<InboundFrame>, ChannelError> {
        let endpoint = self.endpoint(interview_id);
        info!("Connecting to interview channel at {}", endpoint);

        let (stream, _response) = tokio_tungstenite::connect_async(endpoint.as_str())
            .await
            .map_err(|e| ChannelError::Connect {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        info!("Interview channel connected: {}", endpoint);

        let (mut sink, mut source) = stream.split();
        let (tx, rx) = mpsc::channel(FRAME_BUFFER);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        if let Err(e) = sink.send(Message::Close(None)).await {
                            warn!("Failed to send close frame: {}", e);
                        }
                        break;
                    }
                    frame = source.next() => {
                        let forwarded = match frame {
                            Some(Ok(Message::Text(text))) => InboundFrame::Text(text),
                            Some(Ok(Message::Close(close))) => {
                                InboundFrame::Closed(close.map(|c| c.reason.to_string()))
                            }
                            Some(Ok(_)) => continue,
                            Some(Err(e)) => InboundFrame::Closed(Some(e.to_string())),
                            None => InboundFrame::Closed(None),
                        };

                        let closing = matches!(forwarded, InboundFrame::Closed(_));
                        if tx.send(forwarded).await.is_err() || closing {
                            break;
                        }
                    }
                }
            }

            info!("Interview channel reader stopped: {}", endpoint);
        });

        Ok(rx)
    }

    fn name(&self) -> &str {
        "websocket"
    }
}
