use std::time::Duration;

use crate::channel::ReconnectPolicy;
use crate::config::Config;

use super::captions::CAPTION_CAPACITY;
use super::gate::ResumeLimits;

/// Per-session tuning
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backoff for opening the interview channel
    pub reconnect: ReconnectPolicy,

    /// Resume format/size checks applied by the gate
    pub resume_limits: ResumeLimits,

    /// Upper bound for a code run; `None` waits indefinitely
    pub execution_timeout: Option<Duration>,

    /// Captions kept in the rolling transcript
    pub caption_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect: ReconnectPolicy::default(),
            resume_limits: ResumeLimits::default(),
            execution_timeout: Some(Duration::from_secs(30)),
            caption_capacity: CAPTION_CAPACITY,
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(config: &Config) -> Self {
        let channel = &config.channel;
        Self {
            reconnect: ReconnectPolicy {
                max_attempts: channel.max_attempts.max(1),
                initial_delay: Duration::from_millis(channel.initial_backoff_ms),
                max_delay: Duration::from_millis(channel.max_backoff_ms),
            },
            resume_limits: ResumeLimits {
                enforce: config.resume.enforce_limits,
                max_bytes: config.resume.max_bytes,
            },
            execution_timeout: match config.execution.timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            caption_capacity: CAPTION_CAPACITY,
        }
    }
}
