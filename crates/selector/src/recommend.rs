//! Static per-platform recommendation catalog.

use loopforge_strategies::{StrategyKind, TargetPlatform};
use serde::{Deserialize, Serialize};

/// Advisory row: curated guidance, not a live selection. Computed from the
/// catalog alone, without an estimator or a caller context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyRecommendation {
    pub scenario: String,
    pub platform: TargetPlatform,
    pub strategy: StrategyKind,
    pub reasoning: String,
    /// Inclusive item-count range this guidance applies to; `u64::MAX`
    /// means unbounded above.
    pub data_size_range: (u64, u64),
    pub performance_characteristics: String,
}

fn entry(
    scenario: &str,
    platform: TargetPlatform,
    strategy: StrategyKind,
    reasoning: &str,
    data_size_range: (u64, u64),
    performance_characteristics: &str,
) -> StrategyRecommendation {
    StrategyRecommendation {
        scenario: scenario.to_string(),
        platform,
        strategy,
        reasoning: reasoning.to_string(),
        data_size_range,
        performance_characteristics: performance_characteristics.to_string(),
    }
}

/// The full curated catalog, grouped by platform, ascending ranges.
pub fn catalog() -> Vec<StrategyRecommendation> {
    vec![
        entry(
            "small in-memory batches",
            TargetPlatform::DotNet,
            StrategyKind::ForLoop,
            "indexed access beats iterator setup below a thousand items",
            (0, 1_000),
            "no per-item allocations, predictable branch behavior",
        ),
        entry(
            "mid-size transforms",
            TargetPlatform::DotNet,
            StrategyKind::LinqQuery,
            "declarative chains stay readable and the materialization cost is amortized",
            (1_001, 100_000),
            "one result buffer, per-stage delegate overhead",
        ),
        entry(
            "bulk processing",
            TargetPlatform::DotNet,
            StrategyKind::ParallelLinq,
            "partitioning pays for itself once batches reach the hundred-thousands",
            (100_001, u64::MAX),
            "scales with cores, fixed fork/join overhead",
        ),
        entry(
            "per-frame entity updates",
            TargetPlatform::Unity,
            StrategyKind::UnityOptimized,
            "cached-count loops avoid enumerator garbage inside the frame budget",
            (0, 10_000),
            "allocation-free, steady frame times",
        ),
        entry(
            "large scene rebuilds",
            TargetPlatform::Unity,
            StrategyKind::UnityOptimized,
            "stay allocation-free even off the hot path; the GC spike costs more than the loop",
            (10_001, u64::MAX),
            "allocation-free, linear scan",
        ),
        entry(
            "interactive page updates",
            TargetPlatform::Web,
            StrategyKind::ForeachLoop,
            "single-threaded runtimes favor simple enumeration over query machinery",
            (0, 50_000),
            "modest enumerator overhead, no extra buffers",
        ),
        entry(
            "client-side aggregation",
            TargetPlatform::Web,
            StrategyKind::LinqQuery,
            "declarative chains keep large single-threaded transforms maintainable",
            (50_001, u64::MAX),
            "one result buffer, no parallel fan-out available",
        ),
        entry(
            "battery-sensitive list handling",
            TargetPlatform::Mobile,
            StrategyKind::ForLoop,
            "tight loops finish sooner and let the radio and CPU sleep",
            (0, 10_000),
            "lowest instruction count per item",
        ),
        entry(
            "large offline sync batches",
            TargetPlatform::Mobile,
            StrategyKind::ForeachLoop,
            "enumeration stays cache-friendly without parallel coordination on constrained cores",
            (10_001, u64::MAX),
            "no partition buffers, bounded memory",
        ),
        entry(
            "request-scoped collections",
            TargetPlatform::Server,
            StrategyKind::ForLoop,
            "per-request batches are small; latency beats throughput here",
            (0, 10_000),
            "minimal overhead, no thread-pool pressure",
        ),
        entry(
            "analytics over bulk data",
            TargetPlatform::Server,
            StrategyKind::ParallelLinq,
            "server cores are plentiful and batches are large enough to amortize the fork",
            (10_001, u64::MAX),
            "near-linear scaling until memory bandwidth saturates",
        ),
    ]
}

/// Guidance rows for one platform, ordered by ascending range start.
pub fn recommendations_for(platform: TargetPlatform) -> Vec<StrategyRecommendation> {
    let mut rows: Vec<StrategyRecommendation> = catalog()
        .into_iter()
        .filter(|row| row.platform == platform)
        .collect();
    rows.sort_by_key(|row| row.data_size_range.0);
    rows
}
