use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::transport::{ChannelTransport, InboundFrame};
use crate::error::ChannelError;

const FRAME_BUFFER: usize = 100;

/// Interview channel over NATS
///
/// Frames for an interview are published on `<prefix>.<interview_id>`.
pub struct NatsTransport {
    url: String,
    subject_prefix: String,
}

impl NatsTransport {
    pub fn new(url: impl Into<String>, subject_prefix: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            subject_prefix: subject_prefix.into(),
        }
    }

    pub fn subject(&self, interview_id: &str) -> String {
        format!("{}.{}", self.subject_prefix, interview_id)
    }
}

#[async_trait::async_trait]
impl ChannelTransport for NatsTransport {
    async fn open(
        &self,
        interview_id: &str,
        shutdown: CancellationToken,
    ) -> Result<mpsc::Receiver<InboundFrame>, ChannelError> {
        info!("Connecting to NATS at {}", self.url);

        let client = async_nats::connect(self.url.as_str())
            .await
            .map_err(|e| ChannelError::Connect {
                endpoint: self.url.clone(),
                reason: e.to_string(),
            })?;

        let subject = self.subject(interview_id);
        let mut subscriber = client
            .subscribe(subject.clone())
            .await
            .map_err(|e| ChannelError::Connect {
                endpoint: subject.clone(),
                reason: e.to_string(),
            })?;

        info!("Subscribed to {}", subject);

        let (tx, rx) = mpsc::channel(FRAME_BUFFER);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        if let Err(e) = subscriber.unsubscribe().await {
                            warn!("Failed to unsubscribe from {}: {}", subject, e);
                        }
                        break;
                    }
                    message = subscriber.next() => {
                        let forwarded = match message {
                            Some(message) => {
                                InboundFrame::Text(String::from_utf8_lossy(&message.payload).into_owned())
                            }
                            None => InboundFrame::Closed(None),
                        };

                        let closing = matches!(forwarded, InboundFrame::Closed(_));
                        if tx.send(forwarded).await.is_err() || closing {
                            break;
                        }
                    }
                }
            }

            // async-nats handles connection cleanup on drop
            drop(client);
            info!("NATS subscription to {} stopped", subject);
        });

        Ok(rx)
    }

    fn name(&self) -> &str {
        "nats"
    }
}
