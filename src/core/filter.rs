//! Hierarchical severity filtering
//!
//! A [`LogFilterNode`] tree maps dot-separated logger-name prefixes to
//! minimum severities. Resolution walks the tree along the event's name
//! segments and stops at the first miss, so the longest matched prefix wins.
//! [`CachedFilter`] adds a bounded concurrent decision cache in front of the
//! tree for hot emission paths.

use super::annotation::LogAnnotation;
use super::context::LogContext;
use super::log_level::LogLevel;
use parking_lot::RwLock;
use std::collections::HashMap;

/// One node of the severity tree.
///
/// A node's level is the override for name paths terminating there and is
/// inherited by descendants without a closer override.
#[derive(Debug, Clone)]
pub struct LogFilterNode {
    level: LogLevel,
    children: HashMap<String, LogFilterNode>,
}

impl LogFilterNode {
    /// Build a tree from a root level and a list of `(dotted.path, level)`
    /// overrides. The last mapping wins for an exact path; intermediate
    /// nodes created on the way inherit their parent's level.
    ///
    /// # Example
    ///
    /// ```
    /// use annolog::core::{LogFilterNode, LogLevel};
    ///
    /// let tree = LogFilterNode::build(
    ///     LogLevel::Debug,
    ///     [("a", LogLevel::Info), ("a.b.c", LogLevel::Warn)],
    /// );
    /// assert_eq!(tree.resolve(&["a".into(), "b".into()]), LogLevel::Info);
    /// ```
    pub fn build<P, M>(root_level: LogLevel, mappings: M) -> Self
    where
        P: AsRef<str>,
        M: IntoIterator<Item = (P, LogLevel)>,
    {
        let mut root = LogFilterNode {
            level: root_level,
            children: HashMap::new(),
        };
        for (path, level) in mappings {
            let segments: Vec<&str> = path.as_ref().split('.').collect();
            root.add(&segments, level);
        }
        root
    }

    fn add(&mut self, segments: &[&str], level: LogLevel) {
        match segments.split_first() {
            None => self.level = level,
            Some((next, remaining)) => {
                let inherited = self.level;
                self.children
                    .entry((*next).to_string())
                    .or_insert_with(|| LogFilterNode {
                        level: inherited,
                        children: HashMap::new(),
                    })
                    .add(remaining, level);
            }
        }
    }

    /// The minimum severity for the given name path: the level of the
    /// deepest node reached by matching segments exactly from the root.
    /// Unmatched trailing segments are ignored.
    pub fn resolve(&self, names: &[String]) -> LogLevel {
        let mut node = self;
        for segment in names {
            match node.children.get(segment) {
                Some(child) => node = child,
                None => break,
            }
        }
        node.level
    }

    /// Whether an event carrying `ctx` is admitted by this tree.
    pub fn admit(&self, ctx: &LogContext) -> bool {
        let names = ctx.get(&LogAnnotation::logger_name());
        ctx.get(&LogAnnotation::level()) >= self.resolve(&names)
    }
}

/// Build an admission predicate from a root level and path overrides.
///
/// Suitable for [`FilterAppender`](super::appender::FilterAppender).
pub fn filter_by<P, M>(
    root_level: LogLevel,
    mappings: M,
) -> impl Fn(&LogContext, &str) -> bool + Send + Sync
where
    P: AsRef<str>,
    M: IntoIterator<Item = (P, LogLevel)>,
{
    filter_by_tree(LogFilterNode::build(root_level, mappings))
}

/// Build an admission predicate from an existing tree.
pub fn filter_by_tree(
    root: LogFilterNode,
) -> impl Fn(&LogContext, &str) -> bool + Send + Sync {
    move |ctx, _| root.admit(ctx)
}

/// A severity tree fronted by a concurrent decision cache.
///
/// Decisions are keyed by `(name-path, requested-level)`. A cache miss
/// resolves the tree once and stores the boolean; concurrent misses on the
/// same key may each recompute (the answers are identical) but inserts are
/// serialized, so the map never holds a corrupt entry. The cache holds at
/// most `capacity` distinct keys; once full, further decisions are computed
/// from the tree without being cached.
pub struct CachedFilter {
    root: LogFilterNode,
    cache: RwLock<HashMap<(Vec<String>, LogLevel), bool>>,
    capacity: usize,
}

impl CachedFilter {
    /// Default bound on distinct cached `(name-path, level)` keys.
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new(root: LogFilterNode, capacity: usize) -> Self {
        Self {
            root,
            cache: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Whether an event carrying `ctx` is admitted, consulting the cache
    /// first.
    pub fn admit(&self, ctx: &LogContext, _message: &str) -> bool {
        let key = (
            ctx.get(&LogAnnotation::logger_name()),
            ctx.get(&LogAnnotation::level()),
        );

        if let Some(&decision) = self.cache.read().get(&key) {
            return decision;
        }

        let decision = key.1 >= self.root.resolve(&key.0);

        let mut cache = self.cache.write();
        if cache.len() < self.capacity || cache.contains_key(&key) {
            cache.insert(key, decision);
        }
        decision
    }

    /// Number of decisions currently cached.
    pub fn cached_decisions(&self) -> usize {
        self.cache.read().len()
    }
}
