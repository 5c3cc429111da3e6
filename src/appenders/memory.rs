//! In-memory appender
//!
//! Captures `(context, message)` pairs instead of writing them anywhere,
//! for tests and for environments where programs need to examine their own
//! log output. Clones share one buffer, so a handle kept by the test keeps
//! observing what the logger writes.

use crate::core::{Appender, LogContext, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// An appender that records every accepted event in memory.
///
/// # Example
///
/// ```
/// use annolog::appenders::MemoryAppender;
/// use annolog::core::Logger;
///
/// let captured = MemoryAppender::new();
/// let logger = Logger::new(Box::new(captured.clone()));
///
/// logger.info("hello");
/// assert_eq!(captured.messages(), vec!["hello".to_string()]);
/// ```
#[derive(Clone, Default)]
pub struct MemoryAppender {
    lines: Arc<Mutex<Vec<(LogContext, String)>>>,
}

impl MemoryAppender {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured `(context, message)` pairs, in append order.
    pub fn lines(&self) -> Vec<(LogContext, String)> {
        self.lines.lock().clone()
    }

    /// Just the captured messages, in append order.
    pub fn messages(&self) -> Vec<String> {
        self.lines.lock().iter().map(|(_, m)| m.clone()).collect()
    }

    /// Discard everything captured so far.
    pub fn reset(&self) {
        self.lines.lock().clear();
    }
}

impl Appender for MemoryAppender {
    fn append(&mut self, context: &LogContext, message: &str) -> Result<()> {
        self.lines.lock().push((context.clone(), message.to_string()));
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogContext;

    #[test]
    fn test_clones_share_the_buffer() {
        let captured = MemoryAppender::new();
        let mut handle = captured.clone();

        handle.append(&LogContext::empty(), "one").unwrap();
        handle.append(&LogContext::empty(), "two").unwrap();

        assert_eq!(captured.messages(), vec!["one".to_string(), "two".to_string()]);

        captured.reset();
        assert!(handle.lines().is_empty());
    }
}
