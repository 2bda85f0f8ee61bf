//! User-visible messages raised by commands.
//!
//! Commands never propagate errors to their caller; they report them here.
//! The host drains the log and shows the messages however it likes. Every
//! message is also emitted as a `tracing` event.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A reported message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
}

/// Queue of messages waiting for the host.
#[derive(Debug, Default)]
pub struct MessageLog {
    pending: VecDeque<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a message to the user.
    pub fn report(&mut self, severity: Severity, text: impl Into<String>) {
        let text = text.into();
        match severity {
            Severity::Info => tracing::info!("{text}"),
            Severity::Warning => tracing::warn!("{text}"),
            Severity::Error => tracing::error!("{text}"),
        }
        self.pending.push_back(Message { severity, text });
    }

    /// Messages not yet taken by the host.
    pub fn pending(&self) -> impl Iterator<Item = &Message> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take all pending messages, oldest first.
    pub fn drain(&mut self) -> Vec<Message> {
        self.pending.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_report_and_drain() {
        let mut log = MessageLog::new();
        assert!(log.is_empty());

        log.report(Severity::Warning, "first");
        log.report(Severity::Info, String::from("second"));
        assert_eq!(log.len(), 2);

        let drained = log.drain();
        assert_eq!(drained[0].text, "first");
        assert_eq!(drained[0].severity, Severity::Warning);
        assert_eq!(drained[1].severity, Severity::Info);
        assert!(log.is_empty());
    }

    #[traced_test]
    #[test]
    fn test_report_emits_tracing_event() {
        let mut log = MessageLog::new();
        log.report(Severity::Warning, "Cannot crop because the current selection is empty.");
        assert!(logs_contain("selection is empty"));
    }
}
