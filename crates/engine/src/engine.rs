//! Facade wiring the selector, benchmarker, and code optimizer.

use loopforge_bench::{BenchmarkResult, BenchmarkRunner, CancelFlag};
use loopforge_codegen::{
    CodeOptimizer, GenerateRequest, GeneratedCode, OptimizationOutcome, OptimizeRequest,
};
use loopforge_selector::{
    recommendations_for, StrategyComparison, StrategyRecommendation, StrategySelector,
};
use loopforge_strategies::{IterationContext, StrategyKind, StrategyRegistry, TargetPlatform};

/// One object per embedding application. The selector owns the registry;
/// the benchmarker borrows it per batch, so registration stays a
/// startup-only concern.
pub struct Engine {
    selector: StrategySelector,
    runner: BenchmarkRunner,
    optimizer: CodeOptimizer,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_parts(
            StrategySelector::new(StrategyRegistry::with_default_strategies()),
            BenchmarkRunner::new(),
            CodeOptimizer::new(),
        )
    }

    pub fn with_parts(
        selector: StrategySelector,
        runner: BenchmarkRunner,
        optimizer: CodeOptimizer,
    ) -> Self {
        Self {
            selector,
            runner,
            optimizer,
        }
    }

    pub fn with_runner(mut self, runner: BenchmarkRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_optimizer(mut self, optimizer: CodeOptimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn selector(&self) -> &StrategySelector {
        &self.selector
    }

    pub fn available_strategies(&self, context: &IterationContext) -> Vec<StrategyKind> {
        self.selector.available_strategies(context)
    }

    pub fn select_strategy(&self, context: &IterationContext) -> StrategyKind {
        self.selector.select_strategy(context)
    }

    pub fn compare_strategies(&self, context: &IterationContext) -> Vec<StrategyComparison> {
        self.selector.compare_strategies(context)
    }

    pub fn selection_reasoning(&self, context: &IterationContext) -> String {
        self.selector.selection_reasoning(context)
    }

    pub fn recommendations(&self, platform: TargetPlatform) -> Vec<StrategyRecommendation> {
        recommendations_for(platform)
    }

    /// Empirical check of the model's ranking: measures every registered
    /// strategy against a fresh synthetic workload.
    pub fn benchmark_all(&self, data_size: u64, platform: TargetPlatform) -> Vec<BenchmarkResult> {
        self.runner
            .benchmark_all(self.selector.registry(), data_size, platform.label())
    }

    /// Cancellation handle for the benchmark runner.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.runner.cancel_flag()
    }

    pub fn has_enhancer(&self) -> bool {
        self.optimizer.has_enhancer()
    }

    pub fn generate_code(&self, request: &GenerateRequest) -> GeneratedCode {
        self.optimizer.generate(&self.selector, request)
    }

    pub fn optimize_code(&self, request: &OptimizeRequest) -> OptimizationOutcome {
        self.optimizer.optimize(&self.selector, request)
    }
}
