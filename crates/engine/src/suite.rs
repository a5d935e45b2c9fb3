//! Curated benchmark suites with reproducible JSON reports.
//!
//! A suite runs a ladder of representative batch sizes through the
//! benchmarker and records, per case, every strategy's measurements plus
//! the winner. Reports serialize to pretty JSON so runs can be archived
//! and diffed against a baseline.

use crate::engine::Engine;
use anyhow::{Context, Result};
use loopforge_bench::BenchmarkResult;
use loopforge_strategies::TargetPlatform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchCase {
    pub name: String,
    pub data_size: u64,
}

impl BenchCase {
    pub fn new(name: impl Into<String>, data_size: u64) -> Self {
        Self {
            name: name.into(),
            data_size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub case: String,
    pub data_size: u64,
    /// Winner's strategy id, or "none" when every strategy failed.
    pub winner: String,
    pub winner_time_ms: f64,
    pub winner_score: f64,
    pub results: Vec<BenchmarkResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub platform: String,
    pub generated_at_unix_ms: u128,
    pub cases: Vec<CaseResult>,
}

impl SuiteReport {
    pub fn as_map(&self) -> BTreeMap<&str, &CaseResult> {
        self.cases
            .iter()
            .map(|case| (case.case.as_str(), case))
            .collect()
    }

    pub fn diff<'a>(&'a self, baseline: &'a SuiteReport) -> BTreeMap<&'a str, SuiteDelta<'a>> {
        let mut deltas = BTreeMap::new();
        let current = self.as_map();
        let previous = baseline.as_map();

        for (case, result) in current {
            if let Some(&baseline_result) = previous.get(case) {
                deltas.insert(
                    case,
                    SuiteDelta {
                        current: result,
                        baseline: baseline_result,
                        time_ms_delta: result.winner_time_ms - baseline_result.winner_time_ms,
                        score_delta: result.winner_score - baseline_result.winner_score,
                    },
                );
            }
        }

        deltas
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let blob = fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        Ok(serde_json::from_str(&blob)?)
    }
}

#[derive(Debug)]
pub struct SuiteDelta<'a> {
    pub current: &'a CaseResult,
    pub baseline: &'a CaseResult,
    pub time_ms_delta: f64,
    pub score_delta: f64,
}

pub struct BenchSuite {
    cases: Vec<BenchCase>,
}

impl BenchSuite {
    pub fn new(cases: Vec<BenchCase>) -> Self {
        Self { cases }
    }

    /// Default ladder: one case per order of magnitude the selector's
    /// guidance boundaries care about.
    pub fn size_ladder() -> Self {
        Self::new(vec![
            BenchCase::new("small_batch", 1_000),
            BenchCase::new("mid_batch", 100_000),
            BenchCase::new("bulk_batch", 1_000_000),
        ])
    }

    pub fn cases(&self) -> &[BenchCase] {
        &self.cases
    }

    pub fn run(&self, engine: &Engine, platform: TargetPlatform) -> SuiteReport {
        let mut cases = Vec::with_capacity(self.cases.len());
        for case in &self.cases {
            let results = engine.benchmark_all(case.data_size, platform);
            let winner = results.iter().find(|result| result.is_recommended);
            cases.push(CaseResult {
                case: case.name.clone(),
                data_size: case.data_size,
                winner: winner
                    .map(|result| result.strategy.id().to_string())
                    .unwrap_or_else(|| "none".to_string()),
                winner_time_ms: winner.map(|result| result.execution_time_ms).unwrap_or(0.0),
                winner_score: winner.map(|result| result.performance_score).unwrap_or(0.0),
                results,
            });
        }

        let generated_at_unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| Duration::from_secs(0))
            .as_millis();

        SuiteReport {
            platform: platform.label().to_string(),
            generated_at_unix_ms,
            cases,
        }
    }
}
