//! Error notification channel.
//!
//! # Responsibility
//! - Carry human-readable failure messages to whoever shows them to users.
//!
//! # Invariants
//! - Notifying never fails and never interrupts the caller's control flow.

use crate::logging::truncate_single_line;
use log::error;
use std::sync::{Mutex, PoisonError};

const MAX_MESSAGE_CHARS: usize = 500;

/// Sink for user-facing error messages.
pub trait ErrorNotifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Writes messages to the core log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl ErrorNotifier for LogNotifier {
    fn notify(&self, message: &str) {
        error!(
            "event=user_message module=notify status=error message={}",
            single_line(message)
        );
    }
}

/// Keeps messages in memory, for callers that display them later.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    messages: Mutex<Vec<String>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every message received so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns every message received so far.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl ErrorNotifier for MemoryNotifier {
    fn notify(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

fn single_line(message: &str) -> String {
    truncate_single_line(message, MAX_MESSAGE_CHARS)
}

#[cfg(test)]
mod tests {
    use super::{single_line, ErrorNotifier, MemoryNotifier, MAX_MESSAGE_CHARS};

    #[test]
    fn memory_notifier_collects_and_drains() {
        let notifier = MemoryNotifier::new();
        notifier.notify("first");
        notifier.notify("second");
        assert_eq!(notifier.messages(), vec!["first", "second"]);
        assert_eq!(notifier.drain().len(), 2);
        assert!(notifier.messages().is_empty());
    }

    #[test]
    fn log_messages_are_single_line_and_bounded() {
        assert_eq!(single_line("a\nb\rc"), "a b c");
        let long = "x".repeat(MAX_MESSAGE_CHARS + 10);
        assert!(single_line(&long).ends_with("..."));
    }
}
