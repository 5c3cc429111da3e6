//! Console appender implementation

use crate::core::{Appender, ColoredFormat, LogAnnotation, LogContext, LogFormat, LogLevel, Result};

/// Writes formatted lines to the terminal, routing `Error` and `Fatal`
/// events to stderr and everything else to stdout.
pub struct ConsoleAppender {
    format: Box<dyn LogFormat>,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self {
            format: Box::new(ColoredFormat),
        }
    }

    /// Use a custom format instead of the default colored one
    ///
    /// # Example
    ///
    /// ```
    /// use annolog::appenders::ConsoleAppender;
    /// use annolog::core::SimpleFormat;
    ///
    /// let appender = ConsoleAppender::new().with_format(SimpleFormat);
    /// ```
    #[must_use]
    pub fn with_format(mut self, format: impl LogFormat + 'static) -> Self {
        self.format = Box::new(format);
        self
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, context: &LogContext, message: &str) -> Result<()> {
        let output = self.format.format(context, message);

        match context.get(&LogAnnotation::level()) {
            LogLevel::Error | LogLevel::Fatal => eprintln!("{}", output),
            _ => println!("{}", output),
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        use std::io::Write;
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
