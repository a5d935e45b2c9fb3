//! Ranking selector over the registered strategy catalog.

use crate::estimator::PerformanceEstimator;
use loopforge_strategies::{
    EfficiencyTier, IterationContext, PerformanceEstimate, StrategyKind, StrategyRegistry,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Scoring weights. Bonuses and penalties are additive on top of the
/// weighted model score; the platform bonus is only ever positive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorWeights {
    pub performance_weight: f64,
    pub meets_requirements_bonus: f64,
    pub platform_match_bonus: f64,
    pub parallel_mismatch_penalty: f64,
    pub realtime_mismatch_penalty: f64,
    pub memory_pressure_penalty: f64,
}

impl Default for SelectorWeights {
    fn default() -> Self {
        Self {
            performance_weight: 0.6,
            meets_requirements_bonus: 15.0,
            platform_match_bonus: 20.0,
            parallel_mismatch_penalty: 10.0,
            realtime_mismatch_penalty: 10.0,
            memory_pressure_penalty: 10.0,
        }
    }
}

/// One row of a ranked comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub strategy: StrategyKind,
    pub estimate: PerformanceEstimate,
    pub suitability_score: f64,
    pub reasoning: String,
    pub is_recommended: bool,
}

/// Ranks every registered strategy for a context. Total over all inputs:
/// malformed contexts are normalized first and an empty registry falls
/// back to the indexed loop.
pub struct StrategySelector {
    registry: StrategyRegistry,
    estimator: PerformanceEstimator,
    weights: SelectorWeights,
}

impl StrategySelector {
    pub fn new(registry: StrategyRegistry) -> Self {
        Self {
            registry,
            estimator: PerformanceEstimator::new(),
            weights: SelectorWeights::default(),
        }
    }

    pub fn with_estimator(mut self, estimator: PerformanceEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_weights(mut self, weights: SelectorWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn estimator(&self) -> &PerformanceEstimator {
        &self.estimator
    }

    /// Every registered strategy in ranked order for the context, best
    /// first; the same sequence `compare_strategies` scores.
    pub fn available_strategies(&self, context: &IterationContext) -> Vec<StrategyKind> {
        self.compare_strategies(context)
            .into_iter()
            .map(|comparison| comparison.strategy)
            .collect()
    }

    /// Full ranked comparison, best first. Ties resolve by id so equal
    /// scores still order deterministically; exactly one row is marked
    /// recommended whenever the registry is non-empty.
    pub fn compare_strategies(&self, context: &IterationContext) -> Vec<StrategyComparison> {
        let context = context.clone().normalized();
        let mut comparisons: Vec<StrategyComparison> = self
            .registry
            .all()
            .iter()
            .map(|&strategy| self.score(strategy, &context))
            .collect();

        comparisons.sort_by(|a, b| {
            b.suitability_score
                .partial_cmp(&a.suitability_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.strategy.id().cmp(b.strategy.id()))
        });

        if let Some(best) = comparisons.first_mut() {
            best.is_recommended = true;
            tracing::debug!(
                strategy = best.strategy.id(),
                suitability = best.suitability_score,
                data_size = context.data_size,
                platform = context.target_platform.label(),
                "ranked strategies"
            );
        }
        comparisons
    }

    pub fn select_strategy(&self, context: &IterationContext) -> StrategyKind {
        self.compare_strategies(context)
            .first()
            .map(|comparison| comparison.strategy)
            .unwrap_or(StrategyKind::ForLoop)
    }

    /// Presentation text for the current choice. Never parsed by the
    /// engine; callers display it verbatim.
    pub fn selection_reasoning(&self, context: &IterationContext) -> String {
        match self.compare_strategies(context).into_iter().next() {
            Some(best) => format!(
                "selected {} (suitability {:.1}): {}",
                best.strategy.id(),
                best.suitability_score,
                best.reasoning
            ),
            None => "no strategies registered; defaulting to ForLoop".to_string(),
        }
    }

    fn score(&self, strategy: StrategyKind, context: &IterationContext) -> StrategyComparison {
        let profile = strategy.profile();
        let estimate = self.estimator.estimate(strategy, context);
        let weights = &self.weights;

        let mut suitability = weights.performance_weight * estimate.performance_score;
        let mut notes = vec![format!(
            "{}; predicted {:.3} ms, {:.3} MB (score {:.1}, confidence {:.0}%)",
            strategy.summary(),
            estimate.estimated_execution_time_ms,
            estimate.estimated_memory_usage_mb,
            estimate.performance_score,
            estimate.confidence * 100.0
        )];

        if estimate.meets_requirements {
            suitability += weights.meets_requirements_bonus;
        } else {
            notes.push("exceeds a stated cap".to_string());
        }

        if strategy.specialized_platform() == Some(context.target_platform) {
            suitability += weights.platform_match_bonus;
            notes.push(format!(
                "specialized for {}",
                context.target_platform.label()
            ));
        }

        if context.requirements.prefer_parallel && !profile.supports_parallelization {
            suitability -= weights.parallel_mismatch_penalty;
            notes.push("cannot honor the parallel preference".to_string());
        }

        if context.requirements.requires_real_time && !profile.suitable_for_real_time {
            suitability -= weights.realtime_mismatch_penalty;
            notes.push("deferred execution unfit for real-time".to_string());
        }

        if context.requirements.memory_critical
            && matches!(profile.memory_efficiency, EfficiencyTier::Low)
        {
            suitability -= weights.memory_pressure_penalty;
            notes.push("memory-heavy under a tight budget".to_string());
        }

        StrategyComparison {
            strategy,
            estimate,
            suitability_score: suitability.clamp(0.0, 100.0),
            reasoning: notes.join("; "),
            is_recommended: false,
        }
    }
}
