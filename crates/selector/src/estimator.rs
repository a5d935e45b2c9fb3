//! Cost model turning a strategy profile plus a context into an estimate.

use loopforge_strategies::{
    performance_score, IterationContext, PerformanceEstimate, PerformanceProfile, StrategyKind,
    TargetPlatform,
};
use serde::{Deserialize, Serialize};

/// Calibration constants for the cost model. Defaults were fitted against
/// the synthetic benchmark workloads; changing them re-tunes predictions
/// without touching the model itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Per-item cost of the High CPU tier, in nanoseconds.
    pub base_cost_ns_per_item: f64,
    /// Working-set bytes per item for the High memory tier.
    pub bytes_per_item: f64,
    /// Fixed fork/join coordination cost for parallel strategies.
    pub parallel_overhead_ms: f64,
    /// Fraction of an extra core that converts into speedup.
    pub parallel_efficiency: f64,
    /// Fixed partition-buffer footprint for parallel strategies.
    pub parallel_buffer_mb: f64,
    /// Time multiplier on constrained or mobile hosts.
    pub constrained_penalty: f64,
    /// Largest data size the constants were calibrated against.
    pub calibrated_max_items: u64,
    pub base_confidence: f64,
    /// Core count from which parallel estimates earn extra confidence.
    pub many_core_threshold: u32,
    pub many_core_confidence_bonus: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            base_cost_ns_per_item: 1.2,
            bytes_per_item: 8.0,
            parallel_overhead_ms: 0.5,
            parallel_efficiency: 0.75,
            parallel_buffer_mb: 2.0,
            constrained_penalty: 1.5,
            calibrated_max_items: 1_000_000,
            base_confidence: 0.9,
            many_core_threshold: 8,
            many_core_confidence_bonus: 0.05,
        }
    }
}

/// Pure cost model: same strategy and context always produce the same
/// estimate. Requirement mismatches are scored by the selector, not here;
/// the only requirement input used is the pair of hard caps.
#[derive(Debug, Clone, Default)]
pub struct PerformanceEstimator {
    config: EstimatorConfig,
}

impl PerformanceEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn estimate(
        &self,
        strategy: StrategyKind,
        context: &IterationContext,
    ) -> PerformanceEstimate {
        let profile = strategy.profile();
        let items = context.data_size as f64;
        let cores = context.environment.cpu_cores.max(1);

        let mut time_ms =
            items * self.config.base_cost_ns_per_item * profile.cpu_efficiency.cost_multiplier()
                / 1.0e6;
        if context.environment.is_constrained || context.environment.is_mobile {
            time_ms *= self.config.constrained_penalty;
        }
        if profile.supports_parallelization {
            // The fixed overhead is what sinks parallel strategies on small
            // workloads; there is no separate small-size penalty.
            let speedup = self.effective_speedup(context, cores);
            time_ms = self.config.parallel_overhead_ms + time_ms / speedup;
        }

        let mut memory_mb =
            items * self.config.bytes_per_item * profile.memory_efficiency.memory_multiplier()
                / 1.0e6;
        if profile.supports_parallelization {
            memory_mb += self.config.parallel_buffer_mb;
        }

        let confidence = self.confidence(&profile, context, cores);
        let meets_requirements = meets_cap(time_ms, context.requirements.max_execution_time_ms)
            && meets_cap(memory_mb, context.requirements.max_memory_usage_mb);

        PerformanceEstimate {
            estimated_execution_time_ms: time_ms,
            estimated_memory_usage_mb: memory_mb,
            confidence,
            performance_score: performance_score(time_ms, memory_mb),
            meets_requirements,
        }
    }

    /// Amdahl-flavored fan-out. Web targets run single-threaded.
    fn effective_speedup(&self, context: &IterationContext, cores: u32) -> f64 {
        if context.target_platform == TargetPlatform::Web || context.environment.is_web {
            return 1.0;
        }
        1.0 + f64::from(cores - 1) * self.config.parallel_efficiency
    }

    fn confidence(
        &self,
        profile: &PerformanceProfile,
        context: &IterationContext,
        cores: u32,
    ) -> f64 {
        let mut confidence = self.config.base_confidence;
        if context.data_size > self.config.calibrated_max_items {
            // Past the calibrated range the model extrapolates; decay
            // slowly rather than cliff.
            let ratio = self.config.calibrated_max_items as f64 / context.data_size as f64;
            confidence *= ratio.sqrt();
        }
        if profile.supports_parallelization && cores >= self.config.many_core_threshold {
            confidence += self.config.many_core_confidence_bonus;
        }
        confidence.clamp(0.05, 1.0)
    }
}

fn meets_cap(value: f64, cap: Option<f64>) -> bool {
    match cap {
        Some(cap) => value <= cap,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use loopforge_strategies::{EnvironmentProfile, PerformanceRequirements};

    fn context(data_size: u64) -> IterationContext {
        IterationContext::new(data_size)
    }

    #[test]
    fn partial_config_overrides_keep_the_other_defaults() {
        let config: EstimatorConfig =
            serde_json::from_str(r#"{"base_cost_ns_per_item": 2.4}"#).expect("config parses");
        assert_abs_diff_eq!(config.base_cost_ns_per_item, 2.4, epsilon = 0.0);
        assert_abs_diff_eq!(config.parallel_overhead_ms, 0.5, epsilon = 0.0);
        assert_eq!(config.calibrated_max_items, 1_000_000);
    }

    #[test]
    fn estimates_are_deterministic() {
        let estimator = PerformanceEstimator::new();
        let ctx = context(50_000);
        let a = estimator.estimate(StrategyKind::LinqQuery, &ctx);
        let b = estimator.estimate(StrategyKind::LinqQuery, &ctx);
        assert_abs_diff_eq!(
            a.estimated_execution_time_ms,
            b.estimated_execution_time_ms,
            epsilon = 0.0
        );
        assert_abs_diff_eq!(a.performance_score, b.performance_score, epsilon = 0.0);
    }

    #[test]
    fn time_is_monotone_in_data_size() {
        let estimator = PerformanceEstimator::new();
        for strategy in StrategyKind::ALL {
            let mut previous = f64::NEG_INFINITY;
            for size in [0u64, 1, 1_000, 100_000, 10_000_000] {
                let estimate = estimator.estimate(strategy, &context(size));
                assert!(
                    estimate.estimated_execution_time_ms >= previous,
                    "{} time shrank between sizes",
                    strategy.id()
                );
                previous = estimate.estimated_execution_time_ms;
            }
        }
    }

    #[test]
    fn estimates_respect_bounds() {
        let estimator = PerformanceEstimator::new();
        for strategy in StrategyKind::ALL {
            for size in [0u64, 10, 1_000_000, u64::MAX / 1_000_000] {
                let estimate = estimator.estimate(strategy, &context(size));
                assert!(estimate.estimated_execution_time_ms >= 0.0);
                assert!(estimate.estimated_memory_usage_mb >= 0.0);
                assert!((0.0..=1.0).contains(&estimate.confidence));
                assert!((0.0..=100.0).contains(&estimate.performance_score));
            }
        }
    }

    #[test]
    fn parallel_overhead_dominates_small_workloads() {
        let estimator = PerformanceEstimator::new();
        let ctx = context(1_000);
        let serial = estimator.estimate(StrategyKind::ForLoop, &ctx);
        let parallel = estimator.estimate(StrategyKind::ParallelLinq, &ctx);
        assert!(
            parallel.estimated_execution_time_ms > serial.estimated_execution_time_ms,
            "fixed fork/join cost should dominate at 1k items"
        );
    }

    #[test]
    fn many_cores_shrink_parallel_time() {
        let estimator = PerformanceEstimator::new();
        let few = context(1_000_000)
            .with_environment(EnvironmentProfile::default().with_cpu_cores(2));
        let many = context(1_000_000)
            .with_environment(EnvironmentProfile::default().with_cpu_cores(16));
        let on_few = estimator.estimate(StrategyKind::ParallelLinq, &few);
        let on_many = estimator.estimate(StrategyKind::ParallelLinq, &many);
        assert!(on_many.estimated_execution_time_ms < on_few.estimated_execution_time_ms);
    }

    #[test]
    fn web_targets_get_no_parallel_speedup() {
        let estimator = PerformanceEstimator::new();
        let web = context(1_000_000)
            .with_platform(TargetPlatform::Web)
            .with_environment(EnvironmentProfile::default().with_cpu_cores(16));
        let native = context(1_000_000)
            .with_environment(EnvironmentProfile::default().with_cpu_cores(16));
        let on_web = estimator.estimate(StrategyKind::ParallelLinq, &web);
        let on_native = estimator.estimate(StrategyKind::ParallelLinq, &native);
        assert!(on_web.estimated_execution_time_ms > on_native.estimated_execution_time_ms);
    }

    #[test]
    fn constrained_hosts_pay_a_penalty() {
        let estimator = PerformanceEstimator::new();
        let plain = context(100_000);
        let constrained =
            context(100_000).with_environment(EnvironmentProfile::default().with_constrained(true));
        let fast = estimator.estimate(StrategyKind::ForLoop, &plain);
        let slow = estimator.estimate(StrategyKind::ForLoop, &constrained);
        assert_abs_diff_eq!(
            slow.estimated_execution_time_ms,
            fast.estimated_execution_time_ms * 1.5,
            epsilon = 1e-9
        );
    }

    #[test]
    fn confidence_decays_past_calibrated_range() {
        let estimator = PerformanceEstimator::new();
        let inside = estimator.estimate(StrategyKind::ForLoop, &context(1_000_000));
        let outside = estimator.estimate(StrategyKind::ForLoop, &context(4_000_000));
        assert_abs_diff_eq!(inside.confidence, 0.9, epsilon = 1e-9);
        assert_abs_diff_eq!(outside.confidence, 0.45, epsilon = 1e-9);
    }

    #[test]
    fn caps_gate_meets_requirements() {
        let estimator = PerformanceEstimator::new();
        let strict = context(1_000_000).with_requirements(
            PerformanceRequirements::default()
                .with_max_execution_time_ms(0.001)
                .normalized(),
        );
        let roomy = context(1_000_000).with_requirements(
            PerformanceRequirements::default()
                .with_max_execution_time_ms(10_000.0)
                .normalized(),
        );
        assert!(!estimator.estimate(StrategyKind::ForLoop, &strict).meets_requirements);
        assert!(estimator.estimate(StrategyKind::ForLoop, &roomy).meets_requirements);
    }

    #[test]
    fn uncapped_requirements_always_met() {
        let estimator = PerformanceEstimator::new();
        for strategy in StrategyKind::ALL {
            assert!(estimator.estimate(strategy, &context(u64::MAX / 1_000)).meets_requirements);
        }
    }
}
