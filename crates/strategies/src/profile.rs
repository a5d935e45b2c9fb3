//! Performance profiles, estimates, and the shared scoring scale.

use serde::{Deserialize, Serialize};

/// Time at which the time component of the score halves.
pub const TIME_HALF_LIFE_MS: f64 = 10.0;
/// Memory at which the memory component of the score halves.
pub const MEMORY_HALF_LIFE_MB: f64 = 100.0;
/// Weight of the time component; memory gets the remainder.
pub const TIME_WEIGHT: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EfficiencyTier {
    Low,
    Medium,
    High,
}

impl EfficiencyTier {
    /// Relative per-item CPU cost against the High tier.
    pub fn cost_multiplier(&self) -> f64 {
        match self {
            EfficiencyTier::Low => 5.0,
            EfficiencyTier::Medium => 2.5,
            EfficiencyTier::High => 1.0,
        }
    }

    /// Relative per-item memory footprint against the High tier.
    pub fn memory_multiplier(&self) -> f64 {
        match self {
            EfficiencyTier::Low => 3.5,
            EfficiencyTier::Medium => 2.0,
            EfficiencyTier::High => 1.0,
        }
    }
}

/// Static traits of a strategy, declared once per catalog entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PerformanceProfile {
    pub cpu_efficiency: EfficiencyTier,
    pub memory_efficiency: EfficiencyTier,
    pub supports_parallelization: bool,
    pub suitable_for_real_time: bool,
}

/// Model prediction for one strategy in one context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PerformanceEstimate {
    pub estimated_execution_time_ms: f64,
    pub estimated_memory_usage_mb: f64,
    pub confidence: f64,
    pub performance_score: f64,
    pub meets_requirements: bool,
}

/// Blends time and memory into a 0..=100 score. Hyperbolic in both inputs
/// so the scale never saturates and stays comparable between the model's
/// estimates and measured benchmark runs.
pub fn performance_score(execution_time_ms: f64, memory_usage_mb: f64) -> f64 {
    let time_ms = execution_time_ms.max(0.0);
    let memory_mb = memory_usage_mb.max(0.0);
    let time_score = 100.0 * TIME_HALF_LIFE_MS / (TIME_HALF_LIFE_MS + time_ms);
    let memory_score = 100.0 * MEMORY_HALF_LIFE_MB / (MEMORY_HALF_LIFE_MB + memory_mb);
    TIME_WEIGHT * time_score + (1.0 - TIME_WEIGHT) * memory_score
}
