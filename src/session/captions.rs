use std::collections::VecDeque;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Number of captions kept on screen
pub const CAPTION_CAPACITY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    Interviewer,
    Candidate,
}

/// One spoken turn. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptionEntry {
    speaker: Speaker,
    content: String,
    /// Milliseconds since the log was created, strictly increasing
    timestamp: u64,
}

impl CaptionEntry {
    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Rolling transcript holding the most recent captions in arrival order
#[derive(Debug, Clone)]
pub struct CaptionLog {
    entries: VecDeque<CaptionEntry>,
    capacity: usize,
    origin: Instant,
    last_timestamp: Option<u64>,
}

impl Default for CaptionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptionLog {
    pub fn new() -> Self {
        Self::with_capacity(CAPTION_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            origin: Instant::now(),
            last_timestamp: None,
        }
    }

    /// Append a caption, evicting the oldest once over capacity
    pub fn append(&mut self, speaker: Speaker, content: impl Into<String>) -> &CaptionEntry {
        let elapsed = self.origin.elapsed().as_millis() as u64;
        let timestamp = match self.last_timestamp {
            Some(last) if elapsed <= last => last + 1,
            _ => elapsed,
        };
        self.last_timestamp = Some(timestamp);

        self.entries.push_back(CaptionEntry {
            speaker,
            content: content.into(),
            timestamp,
        });

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }

        // Non-empty: we just pushed
        &self.entries[self.entries.len() - 1]
    }

    /// Current captions, oldest first
    pub fn snapshot(&self) -> Vec<CaptionEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CaptionEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&CaptionEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
