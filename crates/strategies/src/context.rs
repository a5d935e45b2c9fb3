//! Iteration context: workload, requirements, environment, platform.

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_CPU_CORES: u32 = 4;
pub const DEFAULT_MEMORY_MB: u64 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TargetPlatform {
    #[default]
    DotNet,
    Unity,
    Web,
    Mobile,
    Server,
}

impl TargetPlatform {
    pub fn label(&self) -> &'static str {
        match self {
            TargetPlatform::DotNet => "dotnet",
            TargetPlatform::Unity => "unity",
            TargetPlatform::Web => "web",
            TargetPlatform::Mobile => "mobile",
            TargetPlatform::Server => "server",
        }
    }
}

/// Snapshot of the machine the generated loop will run on. Produced by a
/// detector (or [`EnvironmentProfile::host`]) and consumed read-only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentProfile {
    pub cpu_cores: u32,
    pub available_memory_mb: u64,
    pub is_constrained: bool,
    pub is_mobile: bool,
    pub is_web: bool,
}

impl Default for EnvironmentProfile {
    fn default() -> Self {
        Self {
            cpu_cores: DEFAULT_CPU_CORES,
            available_memory_mb: DEFAULT_MEMORY_MB,
            is_constrained: false,
            is_mobile: false,
            is_web: false,
        }
    }
}

impl EnvironmentProfile {
    /// Best-effort profile of the local machine.
    pub fn host() -> Self {
        let cpu_cores = num_cpus::get().max(1) as u32;
        Self {
            cpu_cores,
            available_memory_mb: DEFAULT_MEMORY_MB,
            is_constrained: cpu_cores <= 2,
            is_mobile: false,
            is_web: false,
        }
    }

    pub fn with_cpu_cores(mut self, cpu_cores: u32) -> Self {
        self.cpu_cores = cpu_cores;
        self
    }

    pub fn with_available_memory_mb(mut self, available_memory_mb: u64) -> Self {
        self.available_memory_mb = available_memory_mb;
        self
    }

    pub fn with_constrained(mut self, is_constrained: bool) -> Self {
        self.is_constrained = is_constrained;
        self
    }

    /// Zero cores or zero memory are detector glitches; fall back to defaults.
    pub fn normalized(mut self) -> Self {
        if self.cpu_cores == 0 {
            self.cpu_cores = 1;
        }
        if self.available_memory_mb == 0 {
            self.available_memory_mb = DEFAULT_MEMORY_MB;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PerformanceRequirements {
    pub prefer_parallel: bool,
    pub requires_real_time: bool,
    pub memory_critical: bool,
    pub max_execution_time_ms: Option<f64>,
    pub max_memory_usage_mb: Option<f64>,
}

impl PerformanceRequirements {
    pub fn with_prefer_parallel(mut self, prefer_parallel: bool) -> Self {
        self.prefer_parallel = prefer_parallel;
        self
    }

    pub fn with_requires_real_time(mut self, requires_real_time: bool) -> Self {
        self.requires_real_time = requires_real_time;
        self
    }

    pub fn with_memory_critical(mut self, memory_critical: bool) -> Self {
        self.memory_critical = memory_critical;
        self
    }

    pub fn with_max_execution_time_ms(mut self, cap: f64) -> Self {
        self.max_execution_time_ms = Some(cap);
        self
    }

    pub fn with_max_memory_usage_mb(mut self, cap: f64) -> Self {
        self.max_memory_usage_mb = Some(cap);
        self
    }

    /// Non-finite or non-positive caps mean "no cap".
    pub fn normalized(mut self) -> Self {
        self.max_execution_time_ms = sanitize_cap(self.max_execution_time_ms);
        self.max_memory_usage_mb = sanitize_cap(self.max_memory_usage_mb);
        self
    }
}

fn sanitize_cap(cap: Option<f64>) -> Option<f64> {
    cap.filter(|value| value.is_finite() && *value > 0.0)
}

/// The selection query: how much data, under what constraints, where.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IterationContext {
    #[serde(deserialize_with = "deserialize_data_size")]
    pub data_size: u64,
    pub requirements: PerformanceRequirements,
    pub environment: EnvironmentProfile,
    pub target_platform: TargetPlatform,
}

impl IterationContext {
    pub fn new(data_size: u64) -> Self {
        Self {
            data_size,
            ..Self::default()
        }
    }

    pub fn with_platform(mut self, target_platform: TargetPlatform) -> Self {
        self.target_platform = target_platform;
        self
    }

    pub fn with_requirements(mut self, requirements: PerformanceRequirements) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_environment(mut self, environment: EnvironmentProfile) -> Self {
        self.environment = environment;
        self
    }

    pub fn normalized(mut self) -> Self {
        self.requirements = self.requirements.normalized();
        self.environment = self.environment.normalized();
        self
    }
}

fn deserialize_data_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    // Callers sometimes hand over counts from signed APIs; clamp instead of
    // rejecting the whole context.
    let raw = i128::deserialize(deserializer)?;
    Ok(raw.clamp(0, u64::MAX as i128) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_data_size_clamps_to_zero() {
        let context: IterationContext =
            serde_json::from_str(r#"{"data_size": -500}"#).expect("context parses");
        assert_eq!(context.data_size, 0);
    }

    #[test]
    fn partial_context_fills_defaults() {
        let context: IterationContext =
            serde_json::from_str(r#"{"data_size": 1000, "target_platform": "Unity"}"#)
                .expect("context parses");
        assert_eq!(context.data_size, 1000);
        assert_eq!(context.target_platform, TargetPlatform::Unity);
        assert_eq!(context.environment.cpu_cores, DEFAULT_CPU_CORES);
        assert!(!context.requirements.prefer_parallel);
    }

    #[test]
    fn normalization_drops_bogus_caps() {
        let requirements = PerformanceRequirements {
            max_execution_time_ms: Some(-5.0),
            max_memory_usage_mb: Some(f64::NAN),
            ..PerformanceRequirements::default()
        }
        .normalized();
        assert!(requirements.max_execution_time_ms.is_none());
        assert!(requirements.max_memory_usage_mb.is_none());
    }

    #[test]
    fn normalization_repairs_empty_environment() {
        let environment = EnvironmentProfile {
            cpu_cores: 0,
            available_memory_mb: 0,
            ..EnvironmentProfile::default()
        }
        .normalized();
        assert_eq!(environment.cpu_cores, 1);
        assert_eq!(environment.available_memory_mb, DEFAULT_MEMORY_MB);
    }

    #[test]
    fn host_profile_has_at_least_one_core() {
        let host = EnvironmentProfile::host();
        assert!(host.cpu_cores >= 1);
        assert!(host.available_memory_mb > 0);
    }
}
