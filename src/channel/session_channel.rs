use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::messages::SessionMessage;
use super::transport::{ChannelTransport, InboundFrame};
use crate::error::ChannelError;

/// Bounded exponential backoff for opening the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Total attempts, including the first (at least 1)
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retry number `retry` (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Event delivered to the session controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Message(SessionMessage),
    /// The channel went away without being closed locally
    Lost(ChannelError),
}

/// Real-time channel for one interview
///
/// Frames are decoded in arrival order; anything that is not a known
/// message kind is counted and dropped.
pub struct SessionChannel {
    interview_id: String,
    frames: Option<mpsc::Receiver<InboundFrame>>,
    shutdown: CancellationToken,
    closed: bool,
    received: u64,
    dropped: u64,
}

impl SessionChannel {
    /// Open the channel, retrying with exponential backoff
    pub async fn connect(
        transport: &dyn ChannelTransport,
        interview_id: &str,
        policy: &ReconnectPolicy,
        parent: &CancellationToken,
    ) -> Result<Self, ChannelError> {
        let attempts = policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = policy.delay_for(attempt - 1);
                info!(
                    "Retrying {} channel for {} in {:?} (attempt {}/{})",
                    transport.name(),
                    interview_id,
                    delay,
                    attempt + 1,
                    attempts
                );
                tokio::time::sleep(delay).await;
            }

            let shutdown = parent.child_token();
            match transport.open(interview_id, shutdown.clone()).await {
                Ok(frames) => {
                    info!("Interview channel open for {}", interview_id);
                    return Ok(Self {
                        interview_id: interview_id.to_string(),
                        frames: Some(frames),
                        shutdown,
                        closed: false,
                        received: 0,
                        dropped: 0,
                    });
                }
                Err(e) => {
                    warn!("Channel connect attempt {} failed: {}", attempt + 1, e);
                    last_error = Some(e);
                }
            }
        }

        let last = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt made".to_string());

        Err(ChannelError::Exhausted { attempts, last })
    }

    pub fn interview_id(&self) -> &str {
        &self.interview_id
    }

    pub fn is_open(&self) -> bool {
        !self.closed && self.frames.is_some()
    }

    /// Frames decoded into messages so far
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Frames discarded as unknown or malformed
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Wait for the next event. Returns `None` once the channel is closed
    /// or has already reported its loss.
    ///
    /// Cancel-safe: no frame is consumed unless an event is returned or the
    /// frame was dropped as unrecognized.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        loop {
            let frames = self.frames.as_mut()?;

            match frames.recv().await {
                Some(InboundFrame::Text(raw)) => match SessionMessage::decode(&raw) {
                    Some(message) => {
                        self.received += 1;
                        return Some(ChannelEvent::Message(message));
                    }
                    None => {
                        self.dropped += 1;
                    }
                },
                Some(InboundFrame::Closed(reason)) => {
                    self.frames = None;
                    let reason = reason
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "connection closed by server".to_string());
                    return Some(ChannelEvent::Lost(ChannelError::Dropped(reason)));
                }
                None => {
                    self.frames = None;
                    if self.closed {
                        return None;
                    }
                    return Some(ChannelEvent::Lost(ChannelError::Dropped(
                        "transport stopped".to_string(),
                    )));
                }
            }
        }
    }

    /// Close the channel. Returns `false` if it was already closed.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }

        self.closed = true;
        self.shutdown.cancel();
        self.frames = None;

        info!(
            "Interview channel closed for {} ({} messages, {} dropped frames)",
            self.interview_id, self.received, self.dropped
        );

        true
    }
}

impl Drop for SessionChannel {
    fn drop(&mut self) {
        self.close();
    }
}
