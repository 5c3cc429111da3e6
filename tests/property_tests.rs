//! Property-based tests for annolog using proptest

use annolog::core::{filter_by_tree, CachedFilter, LogAnnotation, LogContext, LogFilterNode, LogLevel};
use proptest::prelude::*;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Off),
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
    ]
}

/// A small fixed segment alphabet keeps generated paths overlapping, so
/// prefix relationships actually occur.
fn any_segment() -> impl Strategy<Value = String> {
    prop_oneof![Just("a"), Just("b"), Just("c"), Just("d")].prop_map(String::from)
}

fn any_path() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(any_segment(), 0..5)
}

fn counter_pool() -> Vec<LogAnnotation<i64>> {
    (0..4)
        .map(|i| LogAnnotation::new(format!("k{}", i), 0i64, |x, y| x + y, |v| v.to_string()))
        .collect()
}

fn build_context(pool: &[LogAnnotation<i64>], values: &[(usize, i64)]) -> LogContext {
    values.iter().fold(LogContext::empty(), |ctx, (idx, value)| {
        ctx.annotate(&pool[idx % pool.len()], *value)
    })
}

proptest! {
    // ========================================================================
    // LogLevel
    // ========================================================================

    /// String conversions roundtrip for every level
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let as_str = level.to_str();
        let parsed: LogLevel = as_str.parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Ordering matches the numeric rank
    #[test]
    fn test_log_level_ordering(level1 in any_level(), level2 in any_level()) {
        let val1 = level1 as u8;
        let val2 = level2 as u8;

        prop_assert_eq!(level1 <= level2, val1 <= val2);
        prop_assert_eq!(level1 < level2, val1 < val2);
        prop_assert_eq!(level1 >= level2, val1 >= val2);
    }

    // ========================================================================
    // LogContext merge laws
    // ========================================================================

    /// For keys present in both sides, merge combines; for keys present in
    /// one side, merge keeps that side's stored value.
    #[test]
    fn test_merge_laws(
        left in prop::collection::vec((0usize..4, -100i64..100), 0..6),
        right in prop::collection::vec((0usize..4, -100i64..100), 0..6),
    ) {
        let pool = counter_pool();
        let a = build_context(&pool, &left);
        let b = build_context(&pool, &right);
        let merged = a.merge(&b);

        for ann in &pool {
            let expected = match (a.contains(ann), b.contains(ann)) {
                (true, true) => ann.combine(&a.get(ann), &b.get(ann)),
                (true, false) => a.get(ann),
                (false, true) => b.get(ann),
                (false, false) => {
                    prop_assert!(!merged.contains(ann));
                    continue;
                }
            };
            prop_assert_eq!(merged.get(ann), expected);
        }
    }

    /// Neither annotate nor merge mutates its inputs
    #[test]
    fn test_context_operations_are_persistent(
        initial in prop::collection::vec((0usize..4, -100i64..100), 0..6),
        extra in (0usize..4, -100i64..100),
    ) {
        let pool = counter_pool();
        let original = build_context(&pool, &initial);
        let snapshot: Vec<i64> = pool.iter().map(|ann| original.get(ann)).collect();

        let _annotated = original.annotate(&pool[extra.0], extra.1);
        let _merged = original.merge(&original);

        for (ann, expected) in pool.iter().zip(snapshot) {
            prop_assert_eq!(original.get(ann), expected);
        }
    }

    // ========================================================================
    // Filter tree
    // ========================================================================

    /// With no overrides, every name resolves to the root level
    #[test]
    fn test_resolve_without_overrides_is_root(
        root in any_level(),
        names in any_path(),
    ) {
        let tree = LogFilterNode::build(root, Vec::<(String, LogLevel)>::new());
        prop_assert_eq!(tree.resolve(&names), root);
    }

    /// The last mapping for an exact path wins
    #[test]
    fn test_exact_path_override_wins(
        root in any_level(),
        mappings in prop::collection::vec((any_path(), any_level()), 0..5),
        path in prop::collection::vec(any_segment(), 1..4),
        level in any_level(),
    ) {
        let mut all: Vec<(String, LogLevel)> = mappings
            .into_iter()
            .filter(|(p, _)| !p.is_empty())
            .map(|(p, l)| (p.join("."), l))
            .collect();
        all.push((path.join("."), level));

        let tree = LogFilterNode::build(root, all);
        prop_assert_eq!(tree.resolve(&path), level);
    }

    /// Trailing segments that match nothing never change the resolution
    #[test]
    fn test_unmatched_trailing_segments_ignored(
        root in any_level(),
        mappings in prop::collection::vec((prop::collection::vec(any_segment(), 1..4), any_level()), 0..5),
        names in any_path(),
    ) {
        let tree = LogFilterNode::build(
            root,
            mappings.iter().map(|(p, l)| (p.join("."), *l)),
        );

        // "zzz" is outside the segment alphabet, so it can never descend.
        let mut extended = names.clone();
        extended.push("zzz".to_string());
        prop_assert_eq!(tree.resolve(&extended), tree.resolve(&names));
    }

    /// The cached filter always agrees with the uncached predicate
    #[test]
    fn test_cached_filter_agrees_with_predicate(
        root in any_level(),
        mappings in prop::collection::vec((prop::collection::vec(any_segment(), 1..4), any_level()), 0..5),
        queries in prop::collection::vec((any_path(), any_level()), 1..20),
        capacity in 0usize..8,
    ) {
        let mappings: Vec<(String, LogLevel)> = mappings
            .into_iter()
            .map(|(p, l)| (p.join("."), l))
            .collect();

        let cached = CachedFilter::new(
            LogFilterNode::build(root, mappings.clone()),
            capacity,
        );
        let plain = filter_by_tree(LogFilterNode::build(root, mappings));

        for (names, level) in queries {
            let ctx = LogContext::empty()
                .annotate(&LogAnnotation::logger_name(), names)
                .annotate(&LogAnnotation::level(), level);
            prop_assert_eq!(cached.admit(&ctx, ""), plain(&ctx, ""));
        }
    }
}
