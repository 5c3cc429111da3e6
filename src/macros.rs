//! Logging macros for ergonomic log message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`.
//!
//! # Examples
//!
//! ```
//! use annolog::appenders::MemoryAppender;
//! use annolog::core::Logger;
//! use annolog::info;
//!
//! let logger = Logger::new(Box::new(MemoryAppender::new()));
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a message at an explicit level with automatic formatting.
///
/// # Examples
///
/// ```
/// # use annolog::appenders::MemoryAppender;
/// # use annolog::core::{Logger, LogLevel};
/// # let logger = Logger::new(Box::new(MemoryAppender::new()));
/// use annolog::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_with_level($level, format!($($arg)+))
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Fatal, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::appenders::MemoryAppender;
    use crate::core::{LogAnnotation, Logger, LogLevel};

    #[test]
    fn test_macros_format_and_level() {
        let captured = MemoryAppender::new();
        let logger = Logger::new(Box::new(captured.clone()));

        crate::info!(logger, "count = {}", 42);
        crate::error!(logger, "failed: {}", "boom");

        let lines = captured.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].1, "count = 42");
        assert_eq!(lines[0].0.get(&LogAnnotation::level()), LogLevel::Info);
        assert_eq!(lines[1].1, "failed: boom");
        assert_eq!(lines[1].0.get(&LogAnnotation::level()), LogLevel::Error);
    }
}
