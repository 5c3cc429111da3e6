//! # Annolog
//!
//! A structured-logging core built around typed, combinable annotations.
//!
//! ## Features
//!
//! - **Typed annotations**: named, combinable fields attached to an
//!   immutable, freely shareable [`LogContext`](core::LogContext)
//! - **Scoped propagation**: `locally` windows, derived loggers, managed
//!   acquire/release scopes and per-pull stream decoration
//! - **Hierarchical filtering**: dot-separated logger names resolved
//!   against a severity tree, with a bounded concurrent decision cache
//! - **Pluggable appenders**: console, file and in-memory sinks behind one
//!   trait, composed with filtering and bounded-queue async decorators

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, FileAppender, MemoryAppender};
    pub use crate::core::{
        filter_by, filter_by_tree, from_fn, Appender, AssembledFormat, AsyncAppender, CachedFilter,
        ColoredFormat, DynError, FilterAppender, FnFormat, Fragment, IgnoreAppender,
        LocallyStream, LogAnnotation, LogContext, LogFilterNode, LogFormat, LogLevel, Logger,
        LoggerBuilder, LoggerError, Result, SimpleFormat, TimestampFormat,
        DEFAULT_SHUTDOWN_TIMEOUT,
    };
}

pub use appenders::{ConsoleAppender, FileAppender, MemoryAppender};
pub use core::{
    filter_by, filter_by_tree, from_fn, Appender, AssembledFormat, AsyncAppender, CachedFilter,
    ColoredFormat, DynError, FilterAppender, FnFormat, Fragment, IgnoreAppender, LocallyStream,
    LogAnnotation, LogContext, LogFilterNode, LogFormat, LogLevel, Logger, LoggerBuilder,
    LoggerError, Result, SimpleFormat, TimestampFormat, DEFAULT_SHUTDOWN_TIMEOUT,
};
