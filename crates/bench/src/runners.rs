//! Executable counterparts of each catalog strategy.

use crate::workload::{heat, Workload};
use anyhow::Result;
use loopforge_strategies::StrategyKind;
use rayon::prelude::*;
use std::sync::Arc;

/// What one trial produced: the checksum to verify against the reference
/// and the buffer bytes the strategy materialized along the way. Runners
/// that stream without intermediate buffers report zero bytes.
#[derive(Debug, Clone, Copy)]
pub struct TrialOutcome {
    pub checksum: f64,
    pub bytes_allocated: u64,
}

/// Executable form of a strategy. Implementations must reproduce the
/// workload's reference checksum; how they iterate is the thing under
/// measurement.
pub trait StrategyRunner: Send + Sync {
    fn kind(&self) -> StrategyKind;
    fn execute(&self, workload: &Workload) -> Result<TrialOutcome>;
}

pub type DynStrategyRunner = Arc<dyn StrategyRunner>;

fn accumulate(acc: &mut f64, x: f32) {
    let heated = heat(x);
    if heated > 0.0 {
        *acc += f64::from(heated);
    }
}

/// Plain indexed loop; the reference iteration shape.
#[derive(Default)]
pub struct IndexedRunner;

impl IndexedRunner {
    pub fn new() -> Self {
        Self
    }
}

impl StrategyRunner for IndexedRunner {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ForLoop
    }

    #[allow(clippy::needless_range_loop)]
    fn execute(&self, workload: &Workload) -> Result<TrialOutcome> {
        let data = &workload.data;
        let mut checksum = 0.0f64;
        for i in 0..data.len() {
            accumulate(&mut checksum, data[i]);
        }
        Ok(TrialOutcome {
            checksum,
            bytes_allocated: 0,
        })
    }
}

/// Iterator-driven loop, the `foreach` shape.
#[derive(Default)]
pub struct EnumeratorRunner;

impl EnumeratorRunner {
    pub fn new() -> Self {
        Self
    }
}

impl StrategyRunner for EnumeratorRunner {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ForeachLoop
    }

    fn execute(&self, workload: &Workload) -> Result<TrialOutcome> {
        let mut checksum = 0.0f64;
        for &x in workload.data.iter() {
            accumulate(&mut checksum, x);
        }
        Ok(TrialOutcome {
            checksum,
            bytes_allocated: 0,
        })
    }
}

/// Declarative chain that materializes the projected values before
/// reducing, the way a query's `ToList` does.
#[derive(Default)]
pub struct QueryRunner;

impl QueryRunner {
    pub fn new() -> Self {
        Self
    }
}

impl StrategyRunner for QueryRunner {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LinqQuery
    }

    fn execute(&self, workload: &Workload) -> Result<TrialOutcome> {
        let selected: Vec<f32> = workload
            .data
            .iter()
            .map(|&x| heat(x))
            .filter(|&heated| heated > 0.0)
            .collect();
        let bytes_allocated = (selected.capacity() * std::mem::size_of::<f32>()) as u64;
        let checksum: f64 = selected.iter().copied().map(f64::from).sum();
        Ok(TrialOutcome {
            checksum,
            bytes_allocated,
        })
    }
}

/// Partitioned parallel reduction over the worker pool.
#[derive(Default)]
pub struct ParallelQueryRunner;

impl ParallelQueryRunner {
    pub fn new() -> Self {
        Self
    }
}

impl StrategyRunner for ParallelQueryRunner {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ParallelLinq
    }

    fn execute(&self, workload: &Workload) -> Result<TrialOutcome> {
        let checksum: f64 = workload
            .data
            .par_iter()
            .map(|&x| heat(x))
            .filter(|&heated| heated > 0.0)
            .map(f64::from)
            .sum();
        Ok(TrialOutcome {
            checksum,
            bytes_allocated: 0,
        })
    }
}

/// Cached-count loop unrolled four wide, the frame-budget shape.
#[derive(Default)]
pub struct UnityOptimizedRunner;

impl UnityOptimizedRunner {
    pub fn new() -> Self {
        Self
    }
}

impl StrategyRunner for UnityOptimizedRunner {
    fn kind(&self) -> StrategyKind {
        StrategyKind::UnityOptimized
    }

    fn execute(&self, workload: &Workload) -> Result<TrialOutcome> {
        let mut lanes = [0.0f64; 4];
        let mut chunks = workload.data.chunks_exact(4);
        for chunk in &mut chunks {
            accumulate(&mut lanes[0], chunk[0]);
            accumulate(&mut lanes[1], chunk[1]);
            accumulate(&mut lanes[2], chunk[2]);
            accumulate(&mut lanes[3], chunk[3]);
        }
        let mut checksum = (lanes[0] + lanes[1]) + (lanes[2] + lanes[3]);
        for &x in chunks.remainder() {
            accumulate(&mut checksum, x);
        }
        Ok(TrialOutcome {
            checksum,
            bytes_allocated: 0,
        })
    }
}

/// One builtin runner per catalog strategy, in catalog order.
pub fn default_runners() -> Vec<DynStrategyRunner> {
    vec![
        Arc::new(IndexedRunner::new()),
        Arc::new(EnumeratorRunner::new()),
        Arc::new(QueryRunner::new()),
        Arc::new(ParallelQueryRunner::new()),
        Arc::new(UnityOptimizedRunner::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn every_runner_reproduces_the_reference_checksum() {
        let workload = Workload::synthetic(10_000, 42);
        for runner in default_runners() {
            let outcome = runner
                .execute(&workload)
                .unwrap_or_else(|_| panic!("{} runner failed", runner.kind().id()));
            assert_abs_diff_eq!(
                outcome.checksum,
                workload.reference_checksum,
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn runners_cover_the_catalog_exactly_once() {
        let kinds: Vec<StrategyKind> = default_runners().iter().map(|r| r.kind()).collect();
        assert_eq!(kinds, StrategyKind::ALL.to_vec());
    }

    #[test]
    fn only_the_materializing_query_reports_allocation() {
        let workload = Workload::synthetic(5_000, 3);
        for runner in default_runners() {
            let outcome = runner.execute(&workload).expect("runner succeeds");
            if runner.kind() == StrategyKind::LinqQuery {
                assert!(outcome.bytes_allocated > 0);
            } else {
                assert_eq!(outcome.bytes_allocated, 0);
            }
        }
    }

    #[test]
    fn runners_handle_short_and_empty_inputs() {
        for size in [0usize, 1, 2, 3, 5] {
            let workload = Workload::synthetic(size, 11);
            for runner in default_runners() {
                let outcome = runner.execute(&workload).expect("runner succeeds");
                assert_abs_diff_eq!(
                    outcome.checksum,
                    workload.reference_checksum,
                    epsilon = 1e-9
                );
            }
        }
    }
}
