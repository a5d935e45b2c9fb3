//! The closed catalog of iteration strategies.

use crate::context::TargetPlatform;
use crate::profile::{EfficiencyTier, PerformanceProfile};
use serde::{Deserialize, Serialize};

/// Every strategy the engine can select, generate, or benchmark. A closed
/// enum rather than trait objects: platform bonuses, code templates, and
/// runners all match on it exhaustively, so adding a variant is a compile
/// error until every consumer handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    ForLoop,
    ForeachLoop,
    LinqQuery,
    ParallelLinq,
    UnityOptimized,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::ForLoop,
        StrategyKind::ForeachLoop,
        StrategyKind::LinqQuery,
        StrategyKind::ParallelLinq,
        StrategyKind::UnityOptimized,
    ];

    /// Stable identifier, used in reports, lookups, and tie-breaks.
    pub fn id(&self) -> &'static str {
        match self {
            StrategyKind::ForLoop => "ForLoop",
            StrategyKind::ForeachLoop => "ForeachLoop",
            StrategyKind::LinqQuery => "LinqQuery",
            StrategyKind::ParallelLinq => "ParallelLinq",
            StrategyKind::UnityOptimized => "UnityOptimized",
        }
    }

    pub fn from_id(id: &str) -> Option<StrategyKind> {
        StrategyKind::ALL
            .into_iter()
            .find(|strategy| strategy.id() == id)
    }

    pub fn profile(&self) -> PerformanceProfile {
        match self {
            StrategyKind::ForLoop => PerformanceProfile {
                cpu_efficiency: EfficiencyTier::High,
                memory_efficiency: EfficiencyTier::High,
                supports_parallelization: false,
                suitable_for_real_time: true,
            },
            StrategyKind::ForeachLoop => PerformanceProfile {
                cpu_efficiency: EfficiencyTier::Medium,
                memory_efficiency: EfficiencyTier::High,
                supports_parallelization: false,
                suitable_for_real_time: true,
            },
            StrategyKind::LinqQuery => PerformanceProfile {
                cpu_efficiency: EfficiencyTier::Medium,
                memory_efficiency: EfficiencyTier::Medium,
                supports_parallelization: false,
                suitable_for_real_time: false,
            },
            StrategyKind::ParallelLinq => PerformanceProfile {
                cpu_efficiency: EfficiencyTier::Medium,
                memory_efficiency: EfficiencyTier::Medium,
                supports_parallelization: true,
                suitable_for_real_time: false,
            },
            StrategyKind::UnityOptimized => PerformanceProfile {
                cpu_efficiency: EfficiencyTier::High,
                memory_efficiency: EfficiencyTier::High,
                supports_parallelization: false,
                suitable_for_real_time: true,
            },
        }
    }

    /// Platform this strategy is specialized for, if any. Specialization
    /// only ever grants a bonus on the matching platform; it never
    /// penalizes elsewhere.
    pub fn specialized_platform(&self) -> Option<TargetPlatform> {
        match self {
            StrategyKind::UnityOptimized => Some(TargetPlatform::Unity),
            _ => None,
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            StrategyKind::ForLoop => "plain indexed loop with no iterator overhead",
            StrategyKind::ForeachLoop => "enumerator loop, readable with modest overhead",
            StrategyKind::LinqQuery => "declarative query chain that materializes results",
            StrategyKind::ParallelLinq => "partitioned parallel query for multi-core hosts",
            StrategyKind::UnityOptimized => "allocation-free cached-count loop for frame budgets",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for strategy in StrategyKind::ALL {
            assert_eq!(StrategyKind::from_id(strategy.id()), Some(strategy));
        }
        assert_eq!(StrategyKind::from_id("WhileLoop"), None);
    }

    #[test]
    fn only_parallel_linq_parallelizes() {
        for strategy in StrategyKind::ALL {
            let parallel = strategy.profile().supports_parallelization;
            assert_eq!(parallel, strategy == StrategyKind::ParallelLinq);
        }
    }

    #[test]
    fn unity_variant_is_the_only_specialist() {
        for strategy in StrategyKind::ALL {
            match strategy {
                StrategyKind::UnityOptimized => assert_eq!(
                    strategy.specialized_platform(),
                    Some(TargetPlatform::Unity)
                ),
                _ => assert_eq!(strategy.specialized_platform(), None),
            }
        }
    }

    #[test]
    fn real_time_strategies_avoid_deferred_execution() {
        assert!(StrategyKind::ForLoop.profile().suitable_for_real_time);
        assert!(!StrategyKind::LinqQuery.profile().suitable_for_real_time);
        assert!(!StrategyKind::ParallelLinq.profile().suitable_for_real_time);
    }
}
