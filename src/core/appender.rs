//! Appender trait and decorators
//!
//! An [`Appender`] is a write endpoint for `(context, message)` pairs.
//! Decorators wrap other appenders behind the same trait: [`FilterAppender`]
//! gates writes on a predicate, [`AsyncAppender`] decouples the caller from
//! the sink through a bounded queue drained by a single worker thread.

use super::context::LogContext;
use super::error::{LoggerError, Result};
use crossbeam_channel::{bounded, Sender};
use std::thread;
use std::time::Duration;

/// Default shutdown timeout for queue draining (5 seconds)
///
/// Used when an [`AsyncAppender`] is dropped without an explicit shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A write endpoint for log events.
///
/// `append` completes once the event is accepted by the sink, which for
/// decorated appenders is not necessarily once it is durably stored.
pub trait Appender: Send {
    fn append(&mut self, context: &LogContext, message: &str) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    /// Release the appender, draining buffered work where applicable.
    ///
    /// Returns `true` when the appender finished cleanly within `timeout`.
    fn shutdown(&mut self, _timeout: Duration) -> bool {
        self.flush().is_ok()
    }

    fn name(&self) -> &str;
}

/// Predicate result for [`FilterAppender`]; fallible to admit effectful
/// predicates alongside pure ones.
type FilterFn = Box<dyn Fn(&LogContext, &str) -> Result<bool> + Send>;

/// Decorator gating `append` on a predicate.
///
/// # Example
///
/// ```
/// use annolog::appenders::MemoryAppender;
/// use annolog::core::{filter_by, FilterAppender, LogLevel};
///
/// let admitted = filter_by(LogLevel::Info, [("noisy", LogLevel::Error)]);
/// let appender = FilterAppender::new(admitted, Box::new(MemoryAppender::new()));
/// ```
pub struct FilterAppender {
    predicate: FilterFn,
    inner: Box<dyn Appender>,
}

impl FilterAppender {
    /// Wrap `inner` with a pure predicate.
    pub fn new(
        predicate: impl Fn(&LogContext, &str) -> bool + Send + 'static,
        inner: Box<dyn Appender>,
    ) -> Self {
        Self {
            predicate: Box::new(move |ctx, msg| Ok(predicate(ctx, msg))),
            inner,
        }
    }

    /// Wrap `inner` with a fallible predicate. A predicate error is
    /// returned from `append`; the event is not forwarded.
    pub fn with_fallible(
        predicate: impl Fn(&LogContext, &str) -> Result<bool> + Send + 'static,
        inner: Box<dyn Appender>,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            inner,
        }
    }
}

impl Appender for FilterAppender {
    fn append(&mut self, context: &LogContext, message: &str) -> Result<()> {
        if (self.predicate)(context, message)? {
            self.inner.append(context, message)
        } else {
            Ok(())
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    fn shutdown(&mut self, timeout: Duration) -> bool {
        self.inner.shutdown(timeout)
    }

    fn name(&self) -> &str {
        "filter"
    }
}

enum Command {
    Write(LogContext, String),
    Flush,
}

/// Decorator forwarding events to the wrapped appender through a bounded
/// queue drained by exactly one worker thread.
///
/// `append` enqueues and returns; when the queue is full it blocks until
/// space frees up, so no event is silently dropped and memory stays bounded.
/// Forwarding order is the enqueue order. Errors from the wrapped appender
/// are reported to stderr by the worker and never reach the caller.
///
/// Shutdown (explicit or on drop) closes the queue and waits for the worker
/// to drain it, up to a timeout; an in-flight forward at timeout expiry is
/// not guaranteed to complete.
pub struct AsyncAppender {
    sender: Option<Sender<Command>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl AsyncAppender {
    /// Spawn the worker for `inner` behind a queue of `capacity` entries.
    ///
    /// `capacity` must be positive; it bounds memory and sets the
    /// backpressure threshold.
    pub fn new(capacity: usize, mut inner: Box<dyn Appender>) -> Result<Self> {
        if capacity == 0 {
            return Err(LoggerError::config(
                "AsyncAppender",
                "queue capacity must be positive",
            ));
        }

        let (sender, receiver) = bounded(capacity);
        let handle = thread::spawn(move || {
            while let Ok(command) = receiver.recv() {
                match command {
                    Command::Write(ctx, msg) => {
                        if let Err(e) = inner.append(&ctx, &msg) {
                            eprintln!(
                                "[LOGGER ERROR] Appender '{}' failed: {}",
                                inner.name(),
                                e
                            );
                        }
                    }
                    Command::Flush => {
                        if let Err(e) = inner.flush() {
                            eprintln!(
                                "[LOGGER ERROR] Appender '{}' flush failed: {}",
                                inner.name(),
                                e
                            );
                        }
                    }
                }
            }
            // Channel closed: a final flush before the worker exits.
            let _ = inner.flush();
        });

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    fn join_worker(&mut self, timeout: Duration) -> bool {
        // Close the channel so the worker drains the queue and exits.
        drop(self.sender.take());

        let Some(handle) = self.handle.take() else {
            return true;
        };

        let start = std::time::Instant::now();
        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    eprintln!(
                        "[LOGGER ERROR] Async worker thread panicked during shutdown: {:?}",
                        e
                    );
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                eprintln!(
                    "[LOGGER WARNING] Async worker thread did not finish within {:?}. \
                     Some logs may be lost.",
                    timeout
                );
                return false;
            }

            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Appender for AsyncAppender {
    fn append(&mut self, context: &LogContext, message: &str) -> Result<()> {
        match &self.sender {
            Some(sender) => sender
                .send(Command::Write(context.clone(), message.to_string()))
                .map_err(|_| LoggerError::ChannelSendError),
            None => Err(LoggerError::ChannelSendError),
        }
    }

    fn flush(&mut self) -> Result<()> {
        match &self.sender {
            Some(sender) => sender
                .send(Command::Flush)
                .map_err(|_| LoggerError::ChannelSendError),
            None => Err(LoggerError::ChannelSendError),
        }
    }

    fn shutdown(&mut self, timeout: Duration) -> bool {
        self.join_worker(timeout)
    }

    fn name(&self) -> &str {
        "async"
    }
}

impl Drop for AsyncAppender {
    fn drop(&mut self) {
        self.join_worker(DEFAULT_SHUTDOWN_TIMEOUT);
    }
}

/// An appender that discards everything; useful as a stand-in sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreAppender;

impl Appender for IgnoreAppender {
    fn append(&mut self, _context: &LogContext, _message: &str) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "ignore"
    }
}
