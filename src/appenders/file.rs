//! File appender implementation

use crate::core::{Appender, LogContext, LogFormat, Result, SimpleFormat};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Writes formatted lines to a file, UTF-8 encoded, one event per line.
///
/// Write failures never reach the caller: the first failure emits one
/// diagnostic naming the destination together with a warning that further
/// errors will be suppressed, and every later failure for this instance is
/// swallowed silently. Failed writes are not retried.
pub struct FileAppender {
    path: PathBuf,
    writer: BufWriter<File>,
    format: Box<dyn LogFormat>,
    has_warned: bool,
}

impl FileAppender {
    /// Open `path` for appending, creating it when missing.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            format: Box::new(SimpleFormat),
            has_warned: false,
        })
    }

    /// Use a custom format instead of the default plain one
    ///
    /// # Example
    ///
    /// ```no_run
    /// use annolog::appenders::FileAppender;
    /// use annolog::core::{AssembledFormat, Fragment};
    ///
    /// let appender = FileAppender::new("/var/log/app.log")
    ///     .unwrap()
    ///     .with_format(AssembledFormat::new(
    ///         Fragment::level_upper().bracketed().spaced(Fragment::line()),
    ///     ));
    /// ```
    #[must_use]
    pub fn with_format(mut self, format: impl LogFormat + 'static) -> Self {
        self.format = Box::new(format);
        self
    }

    fn report_failure(&mut self, error: &std::io::Error) {
        if !self.has_warned {
            self.has_warned = true;
            eprintln!(
                "[LOGGER ERROR] Logging to file '{}' failed: {}. \
                 Further errors will be suppressed in order to avoid log spam.",
                self.path.display(),
                error
            );
        }
    }
}

impl Appender for FileAppender {
    fn append(&mut self, context: &LogContext, message: &str) -> Result<()> {
        let mut output = self.format.format(context, message);
        output.push('\n');

        if let Err(e) = self.writer.write_all(output.as_bytes()) {
            self.report_failure(&e);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileAppender {
    fn drop(&mut self) {
        // Ensure all buffered data reaches the file
        let _ = self.flush();
    }
}
