//! Immutable logging context
//!
//! A [`LogContext`] maps annotation identities to their current values for
//! one logical logging scope. Contexts are persistent values: `annotate` and
//! `merge` return a new context and never mutate their inputs, so a context
//! can be shared freely across threads without locking.

use super::annotation::{downcast_value, ErasedAnnotation, ErasedValue, LogAnnotation};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
struct ContextEntry {
    annotation: Arc<ErasedAnnotation>,
    value: ErasedValue,
}

/// Immutable map from annotation identity to current value.
///
/// A key is either absent (the annotation's `initial` value is reported) or
/// present exactly once.
///
/// # Example
///
/// ```
/// use annolog::core::{LogAnnotation, LogContext, LogLevel};
///
/// let ctx = LogContext::empty().annotate(&LogAnnotation::level(), LogLevel::Debug);
/// assert_eq!(ctx.get(&LogAnnotation::level()), LogLevel::Debug);
/// ```
#[derive(Clone, Default)]
pub struct LogContext {
    entries: HashMap<u64, ContextEntry>,
}

impl LogContext {
    /// Create an empty context.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether no annotation is present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the given annotation is present (not merely defaulted).
    pub fn contains<V: Clone + Send + Sync + 'static>(
        &self,
        annotation: &LogAnnotation<V>,
    ) -> bool {
        self.entries.contains_key(&annotation.id())
    }

    /// The stored value for `annotation`, or its `initial` when absent.
    pub fn get<V: Clone + Send + Sync + 'static>(&self, annotation: &LogAnnotation<V>) -> V {
        match self.entries.get(&annotation.id()) {
            Some(entry) => downcast_value::<V>(&entry.value).clone(),
            None => annotation.initial(),
        }
    }

    /// Return a new context in which `annotation` is set to
    /// `combine(current, value)`, where `current` is the stored value or the
    /// annotation's `initial`. The receiver is left untouched.
    pub fn annotate<V: Clone + Send + Sync + 'static>(
        &self,
        annotation: &LogAnnotation<V>,
        value: V,
    ) -> LogContext {
        let erased = annotation.erased();
        let new: ErasedValue = Arc::new(value);
        let combined = match self.entries.get(&annotation.id()) {
            Some(entry) => (erased.combine)(&entry.value, &new),
            None => (erased.combine)(&erased.initial, &new),
        };

        let mut entries = self.entries.clone();
        entries.insert(
            annotation.id(),
            ContextEntry {
                annotation: Arc::clone(erased),
                value: combined,
            },
        );
        LogContext { entries }
    }

    /// Render the current value of `annotation`.
    pub fn render<V: Clone + Send + Sync + 'static>(
        &self,
        annotation: &LogAnnotation<V>,
    ) -> String {
        annotation.render(&self.get(annotation))
    }

    /// Render every annotation actually present, keyed by annotation name.
    ///
    /// Absent annotations are not rendered.
    pub fn render_all(&self) -> HashMap<String, String> {
        self.entries
            .values()
            .map(|entry| {
                (
                    entry.annotation.name.clone(),
                    (entry.annotation.render)(&entry.value),
                )
            })
            .collect()
    }

    /// Merge this context with `other`.
    ///
    /// For each annotation present in both, the result holds
    /// `combine(self_value, other_value)`. An annotation present in only one
    /// side keeps that side's stored value unmodified; it is not re-combined
    /// with the annotation's `initial`.
    pub fn merge(&self, other: &LogContext) -> LogContext {
        let mut entries = HashMap::with_capacity(self.entries.len() + other.entries.len());

        for (&id, entry) in self.entries.iter().chain(other.entries.iter()) {
            if entries.contains_key(&id) {
                continue;
            }
            let value = match (self.entries.get(&id), other.entries.get(&id)) {
                (Some(a), Some(b)) => (entry.annotation.combine)(&a.value, &b.value),
                (Some(a), None) => Arc::clone(&a.value),
                (None, Some(b)) => Arc::clone(&b.value),
                (None, None) => unreachable!("annotation key present in neither merge side"),
            };
            entries.insert(
                id,
                ContextEntry {
                    annotation: Arc::clone(&entry.annotation),
                    value,
                },
            );
        }

        LogContext { entries }
    }
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.render_all()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::LogLevel;

    fn counter() -> LogAnnotation<i64> {
        LogAnnotation::new("counter", 0, |x, y| x + y, |v| v.to_string())
    }

    #[test]
    fn test_get_defaults_to_initial() {
        let ctx = LogContext::empty();
        assert_eq!(ctx.get(&counter()), 0);
        assert_eq!(ctx.get(&LogAnnotation::level()), LogLevel::Info);
        assert!(!ctx.contains(&LogAnnotation::level()));
    }

    #[test]
    fn test_annotate_combines_with_stored_value() {
        let ann = counter();
        let ctx = LogContext::empty().annotate(&ann, 10).annotate(&ann, 20);
        assert_eq!(ctx.get(&ann), 30);
    }

    #[test]
    fn test_annotate_combines_with_initial_on_first_set() {
        let appending = LogAnnotation::new(
            "trail",
            "start".to_string(),
            |x: &String, y: &String| format!("{} {}", x, y),
            |v| v.clone(),
        );
        let ctx = LogContext::empty().annotate(&appending, "next".to_string());
        assert_eq!(ctx.get(&appending), "start next");
    }

    #[test]
    fn test_annotate_never_mutates_input() {
        let ann = counter();
        let original = LogContext::empty().annotate(&ann, 5);
        let _derived = original.annotate(&ann, 7);
        assert_eq!(original.get(&ann), 5);
    }

    #[test]
    fn test_same_name_distinct_descriptors_are_distinct_keys() {
        let a = counter();
        let b = counter();
        let ctx = LogContext::empty().annotate(&a, 1).annotate(&b, 2);
        assert_eq!(ctx.get(&a), 1);
        assert_eq!(ctx.get(&b), 2);
    }

    #[test]
    fn test_merge_combines_keys_present_in_both() {
        let ann = counter();
        let a = LogContext::empty().annotate(&ann, 10);
        let b = LogContext::empty().annotate(&ann, 20);
        assert_eq!(a.merge(&b).get(&ann), 30);
    }

    #[test]
    fn test_merge_keeps_one_sided_values_unmodified() {
        // With combine = sum and a non-zero stored value, re-combining with
        // the initial would be observable; the stored value must survive as-is.
        let appending = LogAnnotation::new(
            "trail",
            "init".to_string(),
            |x: &String, y: &String| format!("{}+{}", x, y),
            |v| v.clone(),
        );
        let only_left = LogContext::empty().annotate(&appending, "left".to_string());
        let merged = only_left.merge(&LogContext::empty());
        assert_eq!(merged.get(&appending), "init+left");

        let merged = LogContext::empty().merge(&only_left);
        assert_eq!(merged.get(&appending), "init+left");
    }

    #[test]
    fn test_render_all_skips_absent_keys() {
        let correlation = LogAnnotation::correlation_id();
        let ctx = LogContext::empty()
            .annotate(
                &LogAnnotation::logger_name(),
                vec!["logger_name".to_string(), "second_level".to_string()],
            )
            .annotate(&correlation, Some("4a5b".to_string()));

        let rendered = ctx.render_all();
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered["name"], "logger_name.second_level");
        assert_eq!(rendered["correlation-id"], "4a5b");
    }

    #[test]
    fn test_render_uses_annotation_render() {
        let ctx = LogContext::empty().annotate(&LogAnnotation::level(), LogLevel::Error);
        assert_eq!(ctx.render(&LogAnnotation::level()), "error");
        // Absent: rendered from the initial value.
        assert_eq!(LogContext::empty().render(&LogAnnotation::level()), "info");
    }
}
