//! Typed, combinable log annotations
//!
//! A [`LogAnnotation`] describes one named, typed field that can be attached
//! to a [`LogContext`](super::context::LogContext): a display name, an
//! initial value, a `combine` function applied whenever a new value meets an
//! existing one, and a `render` function producing the textual form.
//!
//! Annotation identity is the descriptor instance, not the name. Two
//! annotations constructed separately are distinct context keys even when
//! their names collide; clones of one descriptor share its identity.

use super::log_level::LogLevel;
use super::timestamp::TimestampFormat;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

/// Type-erased annotation value as stored inside a context.
pub(crate) type ErasedValue = Arc<dyn Any + Send + Sync>;

/// Boxed error as carried by the [`LogAnnotation::cause`] annotation.
pub type DynError = Arc<dyn std::error::Error + Send + Sync + 'static>;

static NEXT_ANNOTATION_ID: AtomicU64 = AtomicU64::new(0);

/// The type-erased descriptor shared by all clones of one annotation.
pub(crate) struct ErasedAnnotation {
    pub(crate) id: u64,
    pub(crate) name: String,
    pub(crate) initial: ErasedValue,
    pub(crate) combine: Box<dyn Fn(&ErasedValue, &ErasedValue) -> ErasedValue + Send + Sync>,
    pub(crate) render: Box<dyn Fn(&ErasedValue) -> String + Send + Sync>,
}

pub(crate) fn downcast_value<V: 'static>(value: &ErasedValue) -> &V {
    value
        .downcast_ref::<V>()
        .expect("log annotation value type mismatch; annotation identity violated")
}

/// A named, typed, combinable field attachable to a log context.
pub struct LogAnnotation<V> {
    inner: Arc<ErasedAnnotation>,
    _marker: PhantomData<fn(V) -> V>,
}

impl<V> Clone for LogAnnotation<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _marker: PhantomData,
        }
    }
}

impl<V> PartialEq for LogAnnotation<V> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<V> Eq for LogAnnotation<V> {}

impl<V> fmt::Debug for LogAnnotation<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogAnnotation")
            .field("name", &self.inner.name)
            .field("id", &self.inner.id)
            .finish()
    }
}

impl<V: Clone + Send + Sync + 'static> LogAnnotation<V> {
    /// Create a new annotation descriptor.
    ///
    /// `combine` and `render` must be pure and total over `V`.
    ///
    /// # Example
    ///
    /// ```
    /// use annolog::core::LogAnnotation;
    ///
    /// let counter = LogAnnotation::new("counter", 0i64, |x, y| x + y, |v| v.to_string());
    /// assert_eq!(counter.combine(&10, &20), 30);
    /// assert_eq!(counter.render(&30), "30");
    /// ```
    pub fn new(
        name: impl Into<String>,
        initial: V,
        combine: impl Fn(&V, &V) -> V + Send + Sync + 'static,
        render: impl Fn(&V) -> String + Send + Sync + 'static,
    ) -> Self {
        let inner = Arc::new(ErasedAnnotation {
            id: NEXT_ANNOTATION_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            initial: Arc::new(initial),
            combine: Box::new(move |x, y| {
                Arc::new(combine(downcast_value::<V>(x), downcast_value::<V>(y)))
            }),
            render: Box::new(move |v| render(downcast_value::<V>(v))),
        });
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Create an `Option`-valued annotation, initialized with `None`.
    ///
    /// A newer value replaces an older one; an absent value renders as the
    /// empty string.
    pub fn optional(
        name: impl Into<String>,
        render: impl Fn(&V) -> String + Send + Sync + 'static,
    ) -> LogAnnotation<Option<V>> {
        LogAnnotation::new(
            name,
            None,
            |_, y| y.clone(),
            move |v| v.as_ref().map(&render).unwrap_or_default(),
        )
    }

    /// The annotation's display name, used as the key in rendered output.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The value a context reports when this annotation is absent.
    pub fn initial(&self) -> V {
        downcast_value::<V>(&self.inner.initial).clone()
    }

    /// Combine an existing value with a newer one.
    pub fn combine(&self, old: &V, new: &V) -> V {
        let old: ErasedValue = Arc::new(old.clone());
        let new: ErasedValue = Arc::new(new.clone());
        downcast_value::<V>(&(self.inner.combine)(&old, &new)).clone()
    }

    /// Render a value of this annotation to text.
    pub fn render(&self, value: &V) -> String {
        let value: ErasedValue = Arc::new(value.clone());
        (self.inner.render)(&value)
    }

    pub(crate) fn id(&self) -> u64 {
        self.inner.id
    }

    pub(crate) fn erased(&self) -> &Arc<ErasedAnnotation> {
        &self.inner
    }
}

static LEVEL: LazyLock<LogAnnotation<LogLevel>> = LazyLock::new(|| {
    LogAnnotation::new("level", LogLevel::Info, |_, y| *y, |l| {
        l.to_str().to_lowercase()
    })
});

static NAME: LazyLock<LogAnnotation<Vec<String>>> = LazyLock::new(|| {
    LogAnnotation::new(
        "name",
        Vec::new(),
        |x: &Vec<String>, y: &Vec<String>| {
            let mut joined = x.clone();
            joined.extend(y.iter().cloned());
            joined
        },
        |segments| segments.join("."),
    )
});

static TIMESTAMP: LazyLock<LogAnnotation<Option<DateTime<Utc>>>> = LazyLock::new(|| {
    LogAnnotation::new("timestamp", None, |_, y| *y, |t| {
        t.map(|t| TimestampFormat::Iso8601.format(&t))
            .unwrap_or_default()
    })
});

static CORRELATION_ID: LazyLock<LogAnnotation<Option<String>>> = LazyLock::new(|| {
    LogAnnotation::new("correlation-id", None, |_, y| y.clone(), |id| {
        id.clone()
            .unwrap_or_else(|| "unknown-correlation-id".to_string())
    })
});

static CAUSE: LazyLock<LogAnnotation<Option<DynError>>> = LazyLock::new(|| {
    LogAnnotation::new("cause", None, |_, y| y.clone(), |err| {
        err.as_ref()
            .map(|e| render_error_chain(e.as_ref()))
            .unwrap_or_default()
    })
});

impl LogAnnotation<LogLevel> {
    /// The severity of the current log event; initial value is `Info`.
    pub fn level() -> Self {
        LEVEL.clone()
    }
}

impl LogAnnotation<Vec<String>> {
    /// The dot-separated logger name; nested names concatenate.
    pub fn logger_name() -> Self {
        NAME.clone()
    }
}

impl LogAnnotation<Option<DateTime<Utc>>> {
    /// The event timestamp, rendered as ISO 8601.
    pub fn timestamp() -> Self {
        TIMESTAMP.clone()
    }
}

impl LogAnnotation<Option<String>> {
    /// A correlation identifier carried across one logical operation.
    pub fn correlation_id() -> Self {
        CORRELATION_ID.clone()
    }
}

impl LogAnnotation<Option<DynError>> {
    /// The error that caused the event, rendered with its source chain.
    pub fn cause() -> Self {
        CAUSE.clone()
    }
}

/// Render an error together with its `source()` chain.
fn render_error_chain(err: &(dyn std::error::Error)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        out.push_str(": caused by: ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_the_descriptor() {
        let a = LogAnnotation::new("counter", 0i64, |x, y| x + y, |v| v.to_string());
        let b = LogAnnotation::new("counter", 0i64, |x, y| x + y, |v| v.to_string());

        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_combine_and_render() {
        let counter = LogAnnotation::new("counter", 0i64, |x, y| x + y, |v| v.to_string());
        assert_eq!(counter.initial(), 0);
        assert_eq!(counter.combine(&10, &20), 30);
        assert_eq!(counter.render(&42), "42");
    }

    #[test]
    fn test_optional_annotation() {
        let request = LogAnnotation::<String>::optional("request-id", |id| id.clone());
        assert_eq!(request.initial(), None);
        assert_eq!(
            request.combine(&Some("old".into()), &Some("new".into())),
            Some("new".to_string())
        );
        assert_eq!(request.render(&None), "");
        assert_eq!(request.render(&Some("abc".into())), "abc");
    }

    #[test]
    fn test_builtin_logger_name_concatenates() {
        let name = LogAnnotation::logger_name();
        let combined = name.combine(
            &vec!["first".to_string()],
            &vec!["second".to_string()],
        );
        assert_eq!(combined, vec!["first".to_string(), "second".to_string()]);
        assert_eq!(name.render(&combined), "first.second");
    }

    #[test]
    fn test_builtin_level_renders_lowercase() {
        let level = LogAnnotation::level();
        assert_eq!(level.initial(), LogLevel::Info);
        assert_eq!(level.render(&LogLevel::Warn), "warn");
    }

    #[test]
    fn test_cause_renders_source_chain() {
        #[derive(Debug, thiserror::Error)]
        #[error("outer failed")]
        struct Outer(#[source] Inner);

        #[derive(Debug, thiserror::Error)]
        #[error("inner failed")]
        struct Inner;

        let cause = LogAnnotation::cause();
        let rendered = cause.render(&Some(Arc::new(Outer(Inner)) as DynError));
        assert_eq!(rendered, "outer failed: caused by: inner failed");
    }
}
