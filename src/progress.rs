//! Progress reporting
//!
//! Progress messages are free-form, human-readable notifications. Sinks must
//! tolerate concurrent writers; ordering between writers is not guaranteed.

use std::sync::{Mutex, PoisonError};

/// Write-only destination for status text
pub trait ProgressSink: Send + Sync {
    fn report(&self, message: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message)
    }
}

/// Discards every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&self, _message: &str) {}
}

/// Forwards messages to the `log` facade at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, message: &str) {
        for line in message.lines() {
            log::info!("{}", line);
        }
    }
}

/// Keeps only the most recent message, like a status bar
#[derive(Debug, Default)]
pub struct LatestMessage {
    message: Mutex<String>,
}

impl LatestMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> String {
        self.message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressSink for LatestMessage {
    fn report(&self, message: &str) {
        let mut current = self
            .message
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        current.clear();
        current.push_str(message);
    }
}

/// Keeps every message, mostly useful in tests
#[derive(Debug, Default)]
pub struct CollectProgress {
    messages: Mutex<Vec<String>>,
}

impl CollectProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressSink for CollectProgress {
    fn report(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
