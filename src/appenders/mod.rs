//! Appender implementations

pub mod console;
pub mod file;
pub mod memory;

pub use console::ConsoleAppender;
pub use file::FileAppender;
pub use memory::MemoryAppender;

// Re-export the trait and decorators for convenience
pub use crate::core::{Appender, AsyncAppender, FilterAppender};
