//! Timed benchmark executor with failure isolation and cancellation.

use crate::runners::{default_runners, DynStrategyRunner, StrategyRunner, TrialOutcome};
use crate::workload::Workload;
use anyhow::{anyhow, ensure, Result};
use loopforge_strategies::{performance_score, StrategyKind, StrategyRegistry};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering as CmpOrdering;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_WORKLOAD_SEED: u64 = 12345;

/// Tolerance for checksum verification against the reference reduction.
/// Parallel and unrolled runners reassociate float additions, so exact
/// equality is the wrong bar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChecksumTolerance {
    /// Maximum absolute error allowed.
    pub max_abs_error: f64,
    /// Maximum relative error allowed (for references > 1e-6).
    pub max_rel_error: f64,
}

impl Default for ChecksumTolerance {
    fn default() -> Self {
        Self {
            max_abs_error: 1e-3,
            max_rel_error: 1e-9,
        }
    }
}

impl ChecksumTolerance {
    pub fn strict() -> Self {
        Self {
            max_abs_error: 1e-6,
            max_rel_error: 1e-12,
        }
    }

    pub fn verify(&self, reference: f64, candidate: f64) -> Result<()> {
        ensure!(candidate.is_finite(), "checksum is not finite");
        let abs_error = (reference - candidate).abs();
        ensure!(
            abs_error <= self.max_abs_error,
            "checksum {candidate} deviates from reference {reference} by {abs_error:.3e} (abs tolerance {:.3e})",
            self.max_abs_error
        );
        if reference.abs() > 1e-6 {
            let rel_error = abs_error / reference.abs();
            ensure!(
                rel_error <= self.max_rel_error,
                "checksum {candidate} deviates from reference {reference} by {rel_error:.3e} relative (tolerance {:.3e})",
                self.max_rel_error
            );
        }
        Ok(())
    }
}

/// Cooperative cancellation handle shared between the caller and a
/// running batch. Checked only at trial boundaries; a trial in flight
/// always finishes. The latch holds across batches until `reset` is
/// called explicitly.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Measured (or sentinel) outcome for one strategy in one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub strategy: StrategyKind,
    pub execution_time_ms: f64,
    pub memory_usage_mb: f64,
    pub performance_score: f64,
    pub items_per_sec: f64,
    pub platform: String,
    pub repetitions: usize,
    pub is_recommended: bool,
    pub failure: Option<String>,
}

impl BenchmarkResult {
    fn measured(
        strategy: StrategyKind,
        platform: &str,
        average_time_ms: f64,
        memory_usage_mb: f64,
        items: u64,
        repetitions: usize,
    ) -> Self {
        let items_per_sec = if average_time_ms > 0.0 {
            items as f64 * 1000.0 / average_time_ms
        } else {
            0.0
        };
        Self {
            strategy,
            execution_time_ms: average_time_ms,
            memory_usage_mb,
            performance_score: performance_score(average_time_ms, memory_usage_mb),
            items_per_sec,
            platform: platform.to_string(),
            repetitions,
            is_recommended: false,
            failure: None,
        }
    }

    fn failed(strategy: StrategyKind, platform: &str, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            execution_time_ms: 0.0,
            memory_usage_mb: 0.0,
            performance_score: 0.0,
            items_per_sec: 0.0,
            platform: platform.to_string(),
            repetitions: 0,
            is_recommended: false,
            failure: Some(reason.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Runs every registered strategy against the same synthetic workload,
/// one at a time so strategies never contend with each other. Failures
/// and panics stay confined to their own result row.
pub struct BenchmarkRunner {
    runners: Vec<DynStrategyRunner>,
    warmup_runs: usize,
    runs: usize,
    seed: u64,
    tolerance: ChecksumTolerance,
    cancel: CancelFlag,
}

impl Default for BenchmarkRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl BenchmarkRunner {
    pub fn new() -> Self {
        Self {
            runners: default_runners(),
            warmup_runs: 1,
            runs: 5,
            seed: DEFAULT_WORKLOAD_SEED,
            tolerance: ChecksumTolerance::default(),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_runs(mut self, warmup_runs: usize, runs: usize) -> Self {
        self.warmup_runs = warmup_runs;
        self.runs = runs.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_tolerance(mut self, tolerance: ChecksumTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Handle callers keep to stop a batch from another thread.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Later registrations shadow earlier ones for the same strategy.
    pub fn register_runner<R>(&mut self, runner: R)
    where
        R: StrategyRunner + 'static,
    {
        self.runners.push(Arc::new(runner));
    }

    fn runner_for(&self, strategy: StrategyKind) -> Option<&DynStrategyRunner> {
        self.runners
            .iter()
            .rev()
            .find(|runner| runner.kind() == strategy)
    }

    /// Benchmarks every registered strategy and returns exactly one row
    /// per strategy, in registry order. Infallible: anything that goes
    /// wrong lands in that strategy's `failure` field.
    pub fn benchmark_all(
        &self,
        registry: &StrategyRegistry,
        data_size: u64,
        platform: &str,
    ) -> Vec<BenchmarkResult> {
        let size = usize::try_from(data_size).unwrap_or(usize::MAX);
        let workload = Workload::synthetic(size, self.seed);
        tracing::info!(
            data_size,
            platform,
            strategies = registry.len(),
            runs = self.runs,
            "starting benchmark batch"
        );

        let mut results: Vec<BenchmarkResult> = Vec::with_capacity(registry.len());
        for &strategy in registry.all() {
            if self.cancel.is_cancelled() {
                results.push(BenchmarkResult::failed(strategy, platform, "cancelled"));
                continue;
            }
            let result = match self.runner_for(strategy) {
                Some(runner) => {
                    self.benchmark_one(runner.as_ref(), &workload, data_size, platform)
                }
                None => BenchmarkResult::failed(strategy, platform, "no runner registered"),
            };
            if let Some(reason) = &result.failure {
                tracing::warn!(strategy = strategy.id(), reason, "strategy not measured");
            }
            results.push(result);
        }

        mark_single_winner(&mut results);
        results
    }

    fn benchmark_one(
        &self,
        runner: &dyn StrategyRunner,
        workload: &Workload,
        data_size: u64,
        platform: &str,
    ) -> BenchmarkResult {
        let strategy = runner.kind();

        // Warmup runs to avoid cold-start noise.
        for _ in 0..self.warmup_runs {
            if self.cancel.is_cancelled() {
                return BenchmarkResult::failed(strategy, platform, "cancelled");
            }
            if let Err(error) = self.run_trial(runner, workload) {
                return BenchmarkResult::failed(strategy, platform, format!("{error:#}"));
            }
        }

        let mut total = Duration::default();
        let mut total_bytes = 0u64;
        let mut completed = 0usize;
        for _ in 0..self.runs {
            if self.cancel.is_cancelled() {
                // Keep the partial average when at least one repetition
                // finished; a shorter average is still a valid sample.
                break;
            }
            let (elapsed, outcome) = match self.run_trial(runner, workload) {
                Ok(trial) => trial,
                Err(error) => {
                    return BenchmarkResult::failed(strategy, platform, format!("{error:#}"))
                }
            };
            if let Err(error) = self
                .tolerance
                .verify(workload.reference_checksum, outcome.checksum)
            {
                return BenchmarkResult::failed(strategy, platform, format!("{error:#}"));
            }
            total += elapsed;
            total_bytes += outcome.bytes_allocated;
            completed += 1;
        }

        if completed == 0 {
            return BenchmarkResult::failed(strategy, platform, "cancelled");
        }

        let average_time_ms = total.as_secs_f64() * 1000.0 / completed as f64;
        let memory_usage_mb = total_bytes as f64 / completed as f64 / (1024.0 * 1024.0);
        tracing::debug!(
            strategy = strategy.id(),
            average_time_ms,
            memory_usage_mb,
            repetitions = completed,
            "measured strategy"
        );
        BenchmarkResult::measured(
            strategy,
            platform,
            average_time_ms,
            memory_usage_mb,
            data_size,
            completed,
        )
    }

    /// Times exactly the runner execution. A panic inside the runner is
    /// converted into an error so it cannot take the batch down.
    fn run_trial(
        &self,
        runner: &dyn StrategyRunner,
        workload: &Workload,
    ) -> Result<(Duration, TrialOutcome)> {
        let trial = panic::catch_unwind(AssertUnwindSafe(|| {
            let start = Instant::now();
            let outcome = runner.execute(workload);
            (start.elapsed(), outcome)
        }));
        match trial {
            Ok((elapsed, Ok(outcome))) => Ok((elapsed, outcome)),
            Ok((_, Err(error))) => {
                Err(error.context(format!("{} runner failed", runner.kind().id())))
            }
            Err(payload) => Err(anyhow!(
                "{} runner panicked: {}",
                runner.kind().id(),
                panic_message(payload.as_ref())
            )),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

/// Marks the best measured row, best score first, ties to the lexically
/// smaller id. All-failed batches keep zero recommendations.
fn mark_single_winner(results: &mut [BenchmarkResult]) {
    let winner = results
        .iter()
        .enumerate()
        .filter(|(_, result)| !result.is_failed())
        .max_by(|(_, a), (_, b)| {
            a.performance_score
                .partial_cmp(&b.performance_score)
                .unwrap_or(CmpOrdering::Equal)
                .then_with(|| b.strategy.id().cmp(a.strategy.id()))
        })
        .map(|(index, _)| index);
    if let Some(index) = winner {
        results[index].is_recommended = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingRunner;

    impl StrategyRunner for FailingRunner {
        fn kind(&self) -> StrategyKind {
            StrategyKind::LinqQuery
        }

        fn execute(&self, _workload: &Workload) -> Result<TrialOutcome> {
            Err(anyhow!("injected failure"))
        }
    }

    struct PanickingRunner;

    impl StrategyRunner for PanickingRunner {
        fn kind(&self) -> StrategyKind {
            StrategyKind::ForeachLoop
        }

        fn execute(&self, _workload: &Workload) -> Result<TrialOutcome> {
            panic!("boom");
        }
    }

    struct CheatingRunner;

    impl StrategyRunner for CheatingRunner {
        fn kind(&self) -> StrategyKind {
            StrategyKind::ForLoop
        }

        fn execute(&self, _workload: &Workload) -> Result<TrialOutcome> {
            Ok(TrialOutcome {
                checksum: -1.0,
                bytes_allocated: 0,
            })
        }
    }

    fn runner() -> BenchmarkRunner {
        BenchmarkRunner::new().with_runs(0, 2)
    }

    fn registry() -> StrategyRegistry {
        StrategyRegistry::with_default_strategies()
    }

    #[test]
    fn batch_measures_every_strategy() {
        let results = runner().benchmark_all(&registry(), 2_000, "dotnet");
        assert_eq!(results.len(), StrategyKind::ALL.len());
        let order: Vec<StrategyKind> = results.iter().map(|result| result.strategy).collect();
        assert_eq!(order, StrategyKind::ALL.to_vec());
        for result in &results {
            assert!(result.failure.is_none(), "{:?}", result.failure);
            assert_eq!(result.repetitions, 2);
            assert!(result.execution_time_ms >= 0.0);
            assert!(result.items_per_sec > 0.0);
            assert_eq!(result.platform, "dotnet");
        }
        assert_eq!(results.iter().filter(|r| r.is_recommended).count(), 1);
    }

    #[test]
    fn one_failing_strategy_does_not_poison_the_batch() {
        let mut bench = runner();
        bench.register_runner(FailingRunner);
        let results = bench.benchmark_all(&registry(), 1_000, "server");
        assert_eq!(results.len(), StrategyKind::ALL.len());

        let failed = results
            .iter()
            .find(|result| result.strategy == StrategyKind::LinqQuery)
            .expect("row present");
        let reason = failed.failure.as_deref().expect("failure recorded");
        assert!(reason.contains("injected failure"));
        assert_eq!(failed.performance_score, 0.0);
        assert!(!failed.is_recommended);

        let measured = results.iter().filter(|result| !result.is_failed()).count();
        assert_eq!(measured, StrategyKind::ALL.len() - 1);
        assert_eq!(results.iter().filter(|r| r.is_recommended).count(), 1);
    }

    #[test]
    fn a_panicking_runner_is_contained() {
        let mut bench = runner();
        bench.register_runner(PanickingRunner);
        let results = bench.benchmark_all(&registry(), 1_000, "dotnet");
        let failed = results
            .iter()
            .find(|result| result.strategy == StrategyKind::ForeachLoop)
            .expect("row present");
        let reason = failed.failure.as_deref().expect("failure recorded");
        assert!(reason.contains("panicked"));
        assert!(reason.contains("boom"));
        assert_eq!(results.iter().filter(|r| r.is_recommended).count(), 1);
    }

    #[test]
    fn checksum_drift_fails_verification() {
        let mut bench = runner();
        bench.register_runner(CheatingRunner);
        let results = bench.benchmark_all(&registry(), 1_000, "dotnet");
        let failed = results
            .iter()
            .find(|result| result.strategy == StrategyKind::ForLoop)
            .expect("row present");
        let reason = failed.failure.as_deref().expect("failure recorded");
        assert!(reason.contains("deviates from reference"));
    }

    #[test]
    fn later_registration_shadows_the_builtin() {
        let mut bench = runner();
        bench.register_runner(FailingRunner);
        let shadowed = bench
            .runner_for(StrategyKind::LinqQuery)
            .expect("runner present");
        assert!(shadowed
            .execute(&Workload::synthetic(8, 1))
            .is_err());
    }

    #[test]
    fn cancelled_batch_reports_every_row_failed() {
        let bench = runner();
        bench.cancel_flag().cancel();
        let results = bench.benchmark_all(&registry(), 1_000, "dotnet");
        assert_eq!(results.len(), StrategyKind::ALL.len());
        for result in &results {
            assert_eq!(result.failure.as_deref(), Some("cancelled"));
        }
        assert_eq!(results.iter().filter(|r| r.is_recommended).count(), 0);
    }

    #[test]
    fn reset_clears_a_latched_cancellation() {
        let bench = runner();
        bench.cancel_flag().cancel();
        let cancelled = bench.benchmark_all(&registry(), 512, "dotnet");
        assert!(cancelled.iter().all(|result| result.is_failed()));

        bench.cancel_flag().reset();
        let results = bench.benchmark_all(&registry(), 512, "dotnet");
        assert!(results.iter().all(|result| !result.is_failed()));
        assert_eq!(results.iter().filter(|r| r.is_recommended).count(), 1);
    }

    #[test]
    fn tolerance_accepts_reassociation_noise() {
        let tolerance = ChecksumTolerance::default();
        tolerance
            .verify(1_000.0, 1_000.0 + 5e-7)
            .expect("tiny drift passes");
        assert!(tolerance.verify(1_000.0, 1_001.0).is_err());
        assert!(tolerance.verify(1_000.0, f64::NAN).is_err());
    }

    #[test]
    fn winner_tie_breaks_to_the_smaller_id() {
        let mut results = vec![
            BenchmarkResult::measured(StrategyKind::UnityOptimized, "unity", 1.0, 0.0, 100, 1),
            BenchmarkResult::measured(StrategyKind::ForLoop, "unity", 1.0, 0.0, 100, 1),
        ];
        mark_single_winner(&mut results);
        assert!(!results[0].is_recommended);
        assert!(results[1].is_recommended);
    }
}
