//! Logger and context propagation
//!
//! A [`Logger`] couples a scope-local context cell to one appender. The
//! cell keeps one context slot per thread, so concurrent scopes never
//! observe each other's [`Logger::locally`] windows. Derived loggers share
//! the cell and apply their decoration at emission time.

use super::annotation::{DynError, LogAnnotation};
use super::appender::{Appender, AsyncAppender, FilterAppender};
use super::context::LogContext;
use super::error::Result;
use super::filter::{filter_by_tree, CachedFilter, LogFilterNode};
use super::log_level::LogLevel;
use crate::appenders::ConsoleAppender;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

/// Scope-local storage: one context slot per thread inside a shared cell.
///
/// A slot exists only while some `locally` window on that thread is open;
/// outside any window the thread reads the empty context.
#[derive(Default)]
struct ContextCell {
    slots: RwLock<HashMap<ThreadId, LogContext>>,
}

impl ContextCell {
    fn current(&self) -> LogContext {
        self.slots
            .read()
            .get(&thread::current().id())
            .cloned()
            .unwrap_or_default()
    }

    fn replace(&self, context: LogContext) -> Option<LogContext> {
        self.slots.write().insert(thread::current().id(), context)
    }

    fn restore(&self, previous: Option<LogContext>) {
        let mut slots = self.slots.write();
        match previous {
            Some(context) => {
                slots.insert(thread::current().id(), context);
            }
            None => {
                slots.remove(&thread::current().id());
            }
        }
    }
}

/// Restores the enclosing scope's context when dropped, so a `locally`
/// window closes even when its body panics.
struct RestoreGuard<'a> {
    cell: &'a ContextCell,
    previous: Option<Option<LogContext>>,
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.cell.restore(previous);
        }
    }
}

type Decoration = Arc<dyn Fn(LogContext) -> LogContext + Send + Sync>;

/// A logger: a scope-local context cell plus one appender.
///
/// # Example
///
/// ```
/// use annolog::appenders::MemoryAppender;
/// use annolog::core::{LogAnnotation, Logger};
///
/// let captured = MemoryAppender::new();
/// let logger = Logger::new(Box::new(captured.clone()));
///
/// let request = logger.named("request");
/// request.info("accepted");
///
/// let lines = captured.lines();
/// assert_eq!(lines[0].1, "accepted");
/// assert_eq!(lines[0].0.render(&LogAnnotation::logger_name()), "request");
/// ```
#[derive(Clone)]
pub struct Logger {
    cell: Arc<ContextCell>,
    appender: Arc<Mutex<Box<dyn Appender>>>,
    decorations: Vec<Decoration>,
}

impl Logger {
    /// Create a logger writing to `appender` with an empty context.
    pub fn new(appender: Box<dyn Appender>) -> Self {
        Self {
            cell: Arc::new(ContextCell::default()),
            appender: Arc::new(Mutex::new(appender)),
            decorations: Vec::new(),
        }
    }

    /// Create a builder for a fully wired logger.
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Snapshot of the current scope's context (decorations not applied).
    pub fn context(&self) -> LogContext {
        self.cell.current()
    }

    /// Run `body` with the scope context replaced by `f(current)`.
    ///
    /// The transform is visible to `body` and to everything it calls on the
    /// same thread through this logger (or one derived from it); the
    /// enclosing scope's context is restored afterwards, also on panic.
    pub fn locally<R>(
        &self,
        f: impl FnOnce(LogContext) -> LogContext,
        body: impl FnOnce() -> R,
    ) -> R {
        let transformed = f(self.cell.current());
        let previous = self.cell.replace(transformed);
        let _guard = RestoreGuard {
            cell: &self.cell,
            previous: Some(previous),
        };
        body()
    }

    /// Like [`Logger::locally`] with a fallible transform. The transform
    /// runs to completion before `body` begins; on `Err` the body never
    /// runs and the error is returned.
    pub fn locally_m<R, E>(
        &self,
        f: impl FnOnce(LogContext) -> std::result::Result<LogContext, E>,
        body: impl FnOnce() -> R,
    ) -> std::result::Result<R, E> {
        let next = f(self.cell.current())?;
        Ok(self.locally(move |_| next, body))
    }

    /// Run an acquire/use/release scope in which `acquire` and `release`
    /// both observe `f(current)`.
    ///
    /// `body` itself runs outside the transformed window; `release` runs
    /// under the transform even when `body` panics, so acquire/release
    /// logging stays consistently labeled.
    pub fn locally_managed<T, R>(
        &self,
        f: impl Fn(LogContext) -> LogContext,
        acquire: impl FnOnce() -> T,
        release: impl FnOnce(T),
        body: impl FnOnce(&mut T) -> R,
    ) -> R {
        struct ReleaseGuard<'a, T, F, G>
        where
            F: Fn(LogContext) -> LogContext,
            G: FnOnce(T),
        {
            logger: &'a Logger,
            transform: &'a F,
            release: Option<G>,
            resource: Option<T>,
        }

        impl<T, F, G> Drop for ReleaseGuard<'_, T, F, G>
        where
            F: Fn(LogContext) -> LogContext,
            G: FnOnce(T),
        {
            fn drop(&mut self) {
                if let (Some(release), Some(resource)) =
                    (self.release.take(), self.resource.take())
                {
                    self.logger
                        .locally(|ctx| (self.transform)(ctx), || release(resource));
                }
            }
        }

        let resource = self.locally(&f, acquire);
        let mut guard = ReleaseGuard {
            logger: self,
            transform: &f,
            release: Some(release),
            resource: Some(resource),
        };
        let result = body(guard.resource.as_mut().expect("resource taken before release"));
        drop(guard);
        result
    }

    /// Wrap an iterator so that every pull (`next` call) runs under
    /// `f(current)` at the moment the element is produced, not once at
    /// wrapping time.
    pub fn locally_stream<I, F>(&self, f: F, stream: I) -> LocallyStream<'_, I, F>
    where
        I: Iterator,
        F: Fn(LogContext) -> LogContext,
    {
        LocallyStream {
            logger: self,
            transform: f,
            inner: stream,
        }
    }

    /// A new logger over the same cell and appender whose every emission
    /// first merges `f(empty)` into the emission-time context. Derived
    /// values combine with, rather than overwrite, emission-time
    /// annotations.
    pub fn derive(&self, f: impl Fn(LogContext) -> LogContext + Send + Sync + 'static) -> Logger {
        let mut decorations = self.decorations.clone();
        decorations.push(Arc::new(f));
        Logger {
            cell: Arc::clone(&self.cell),
            appender: Arc::clone(&self.appender),
            decorations,
        }
    }

    /// A derived logger decorated with one logger-name segment.
    pub fn named(&self, segment: impl Into<String>) -> Logger {
        let segment = segment.into();
        self.derive(move |ctx| {
            ctx.annotate(&LogAnnotation::logger_name(), vec![segment.clone()])
        })
    }

    /// A derived logger stamping the current time on every emission.
    pub fn with_timestamp(&self) -> Logger {
        self.derive(|ctx| ctx.annotate(&LogAnnotation::timestamp(), Some(Utc::now())))
    }

    /// A derived logger merging a fixed context into every emission.
    pub fn with_context(&self, context: LogContext) -> Logger {
        self.derive(move |_| context.clone())
    }

    /// Emit a line at the level inherited from the current context.
    pub fn log(&self, line: impl AsRef<str>) {
        self.emit(line.as_ref());
    }

    /// Emit a line at an explicit level. The level annotation is visible
    /// for this one emission only and never leaks to sibling calls.
    pub fn log_with_level(&self, level: LogLevel, line: impl AsRef<str>) {
        let line = line.as_ref();
        self.locally(
            |ctx| ctx.annotate(&LogAnnotation::level(), level),
            || self.emit(line),
        );
    }

    #[inline]
    pub fn trace(&self, line: impl AsRef<str>) {
        self.log_with_level(LogLevel::Trace, line);
    }

    #[inline]
    pub fn debug(&self, line: impl AsRef<str>) {
        self.log_with_level(LogLevel::Debug, line);
    }

    #[inline]
    pub fn info(&self, line: impl AsRef<str>) {
        self.log_with_level(LogLevel::Info, line);
    }

    #[inline]
    pub fn warn(&self, line: impl AsRef<str>) {
        self.log_with_level(LogLevel::Warn, line);
    }

    #[inline]
    pub fn error(&self, line: impl AsRef<str>) {
        self.log_with_level(LogLevel::Error, line);
    }

    #[inline]
    pub fn fatal(&self, line: impl AsRef<str>) {
        self.log_with_level(LogLevel::Fatal, line);
    }

    /// Emit at `Error` with the cause annotation attached for this one
    /// emission.
    pub fn error_cause(&self, line: impl AsRef<str>, cause: DynError) {
        let line = line.as_ref();
        self.locally(
            move |ctx| ctx.annotate(&LogAnnotation::cause(), Some(cause)),
            || self.log_with_level(LogLevel::Error, line),
        );
    }

    /// Emit at `Warn` with the cause annotation attached for this one
    /// emission.
    pub fn warn_cause(&self, line: impl AsRef<str>, cause: DynError) {
        let line = line.as_ref();
        self.locally(
            move |ctx| ctx.annotate(&LogAnnotation::cause(), Some(cause)),
            || self.log_with_level(LogLevel::Warn, line),
        );
    }

    /// Flush the underlying appender.
    pub fn flush(&self) -> Result<()> {
        self.appender.lock().flush()
    }

    /// Shut the appender down, draining queued work where applicable.
    ///
    /// Returns `true` when the appender finished cleanly within `timeout`.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.appender.lock().shutdown(timeout)
    }

    fn emission_context(&self) -> LogContext {
        let mut ctx = self.cell.current();
        // Innermost derivation first, so outer decorations combine onto it.
        for decoration in self.decorations.iter().rev() {
            ctx = decoration(LogContext::empty()).merge(&ctx);
        }
        ctx
    }

    fn emit(&self, line: &str) {
        let ctx = self.emission_context();
        if let Err(e) = self.appender.lock().append(&ctx, line) {
            // Logging must never abort the caller; report once to stderr.
            eprintln!("[LOGGER ERROR] Appender failed: {}", e);
        }
    }
}

/// Iterator adapter produced by [`Logger::locally_stream`].
pub struct LocallyStream<'a, I, F> {
    logger: &'a Logger,
    transform: F,
    inner: I,
}

impl<I, F> Iterator for LocallyStream<'_, I, F>
where
    I: Iterator,
    F: Fn(LogContext) -> LogContext,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let logger = self.logger;
        let transform = &self.transform;
        let inner = &mut self.inner;
        logger.locally(|ctx| transform(ctx), || inner.next())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Builder for constructing a wired [`Logger`] with a fluent API
///
/// # Example
///
/// ```no_run
/// use annolog::appenders::FileAppender;
/// use annolog::core::{Logger, LogLevel};
///
/// let logger = Logger::builder()
///     .min_level(LogLevel::Debug)
///     .level_override("noisy.subsystem", LogLevel::Warn)
///     .appender(FileAppender::new("/var/log/app.log").unwrap())
///     .async_mode(1000)
///     .root_name("app")
///     .build()
///     .unwrap();
/// logger.info("started");
/// ```
pub struct LoggerBuilder {
    min_level: LogLevel,
    overrides: Vec<(String, LogLevel)>,
    appender: Option<Box<dyn Appender>>,
    async_capacity: Option<usize>,
    root_name: Option<String>,
    timestamps: bool,
    filter_cache_capacity: usize,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            overrides: Vec::new(),
            appender: None,
            async_capacity: None,
            root_name: None,
            timestamps: true,
            filter_cache_capacity: CachedFilter::DEFAULT_CAPACITY,
        }
    }

    /// Minimum admitted level at the root of the filter tree.
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Override the minimum level for a dotted logger-name prefix.
    #[must_use = "builder methods return a new value"]
    pub fn level_override(mut self, path: impl Into<String>, level: LogLevel) -> Self {
        self.overrides.push((path.into(), level));
        self
    }

    /// The sink to write to; defaults to a [`ConsoleAppender`].
    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appender = Some(Box::new(appender));
        self
    }

    /// Decouple emission from the sink through a bounded queue of
    /// `capacity` entries drained by one worker thread.
    #[must_use = "builder methods return a new value"]
    pub fn async_mode(mut self, capacity: usize) -> Self {
        self.async_capacity = Some(capacity);
        self
    }

    /// Seed the logger-name annotation with a root component name.
    #[must_use = "builder methods return a new value"]
    pub fn root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = Some(name.into());
        self
    }

    /// Stamp the current time on every emission (on by default).
    #[must_use = "builder methods return a new value"]
    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    /// Bound on the filter decision cache; 0 disables caching and resolves
    /// the tree on every emission.
    #[must_use = "builder methods return a new value"]
    pub fn filter_cache_capacity(mut self, capacity: usize) -> Self {
        self.filter_cache_capacity = capacity;
        self
    }

    /// Build the logger: `filter(async(sink))`, so rejected events are
    /// never enqueued.
    pub fn build(self) -> Result<Logger> {
        let sink = self
            .appender
            .unwrap_or_else(|| Box::new(ConsoleAppender::new()));

        let sink: Box<dyn Appender> = match self.async_capacity {
            Some(capacity) => Box::new(AsyncAppender::new(capacity, sink)?),
            None => sink,
        };

        let tree = LogFilterNode::build(self.min_level, self.overrides);
        let filtered: Box<dyn Appender> = if self.filter_cache_capacity == 0 {
            Box::new(FilterAppender::new(filter_by_tree(tree), sink))
        } else {
            let cached = CachedFilter::new(tree, self.filter_cache_capacity);
            Box::new(FilterAppender::new(
                move |ctx: &LogContext, message: &str| cached.admit(ctx, message),
                sink,
            ))
        };

        let mut logger = Logger::new(filtered);
        if self.timestamps {
            logger = logger.with_timestamp();
        }
        if let Some(name) = self.root_name {
            logger = logger.named(name);
        }
        Ok(logger)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
