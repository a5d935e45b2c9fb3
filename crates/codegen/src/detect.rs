//! Recognizing the iteration strategy already present in source text.

use loopforge_strategies::StrategyKind;
use regex::Regex;
use std::sync::OnceLock;

fn parallel_query_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.AsParallel\s*\(").expect("pattern compiles"))
}

fn cached_count_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:int|var)\s+\w+\s*=\s*\w+\s*\.\s*(?:Count|Length)\s*;")
            .expect("pattern compiles")
    })
}

fn query_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\.(?:Where|Select|ToList|ForEach)\s*\(").expect("pattern compiles")
    })
}

fn foreach_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bforeach\s*\(").expect("pattern compiles"))
}

fn for_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bfor\s*\(").expect("pattern compiles"))
}

/// Best-effort classification of the loop shape in `source`. Precedence
/// runs from the most specific marker to the most generic one, so a
/// parallel query with an embedded filter still reads as parallel. `None`
/// means no known shape; callers degrade gracefully.
pub fn detect_strategy(source: &str) -> Option<StrategyKind> {
    if parallel_query_re().is_match(source) {
        return Some(StrategyKind::ParallelLinq);
    }
    if cached_count_re().is_match(source) && for_re().is_match(source) {
        return Some(StrategyKind::UnityOptimized);
    }
    if query_re().is_match(source) {
        return Some(StrategyKind::LinqQuery);
    }
    if foreach_re().is_match(source) {
        return Some(StrategyKind::ForeachLoop);
    }
    if for_re().is_match(source) {
        return Some(StrategyKind::ForLoop);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::CodeShape;
    use crate::templates;

    #[test]
    fn generated_skeletons_detect_as_their_own_strategy() {
        let shape = CodeShape::default().normalized();
        for strategy in StrategyKind::ALL {
            let source = templates::generate(strategy, &shape);
            assert_eq!(
                detect_strategy(&source),
                Some(strategy),
                "{} skeleton misclassified",
                strategy.id()
            );
        }
    }

    #[test]
    fn parallel_beats_embedded_query_stages() {
        let shape = CodeShape::default().with_filter("item.IsActive").normalized();
        let source = templates::generate(StrategyKind::ParallelLinq, &shape);
        assert_eq!(detect_strategy(&source), Some(StrategyKind::ParallelLinq));
    }

    #[test]
    fn foreach_is_not_mistaken_for_a_for_loop() {
        assert_eq!(
            detect_strategy("foreach (var row in rows) { Use(row); }"),
            Some(StrategyKind::ForeachLoop)
        );
    }

    #[test]
    fn hand_written_cached_count_reads_as_unity_style() {
        let source = "var n = list.Count;\nfor (int i = 0; i < n; i++) { Use(list[i]); }";
        assert_eq!(detect_strategy(source), Some(StrategyKind::UnityOptimized));
    }

    #[test]
    fn unrelated_source_detects_nothing() {
        assert_eq!(detect_strategy("int x = Compute();\nreturn x;"), None);
        assert_eq!(detect_strategy(""), None);
    }

    #[test]
    fn plain_indexed_loop_detects_as_for() {
        let source = "for (int i = 0; i < xs.Count; i++) { Use(xs[i]); }";
        assert_eq!(detect_strategy(source), Some(StrategyKind::ForLoop));
    }
}
