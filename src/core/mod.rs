//! Core logging types and algorithms

pub mod annotation;
pub mod appender;
pub mod context;
pub mod error;
pub mod filter;
pub mod format;
pub mod log_level;
pub mod logger;
pub mod timestamp;

pub use annotation::{DynError, LogAnnotation};
pub use appender::{
    Appender, AsyncAppender, FilterAppender, IgnoreAppender, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use context::LogContext;
pub use error::{LoggerError, Result};
pub use filter::{filter_by, filter_by_tree, CachedFilter, LogFilterNode};
pub use format::{
    from_fn, AssembledFormat, ColoredFormat, FnFormat, Fragment, LogFormat, SimpleFormat,
};
pub use log_level::LogLevel;
pub use logger::{LocallyStream, Logger, LoggerBuilder};
pub use timestamp::TimestampFormat;
