//! Generation and rewrite flows built on the selector's choice.

use crate::detect::detect_strategy;
use crate::enhancer::TextGenerator;
use crate::shape::CodeShape;
use crate::templates;
use loopforge_selector::StrategySelector;
use loopforge_strategies::{IterationContext, PerformanceEstimate, StrategyKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub context: IterationContext,
    pub shape: CodeShape,
    /// Explicit strategy override; `None` asks the selector.
    pub strategy: Option<StrategyKind>,
    pub enhance: bool,
}

impl GenerateRequest {
    pub fn new(context: IterationContext, shape: CodeShape) -> Self {
        Self {
            context,
            shape,
            strategy: None,
            enhance: false,
        }
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_enhance(mut self, enhance: bool) -> Self {
        self.enhance = enhance;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedCode {
    pub strategy: StrategyKind,
    pub source: String,
    pub enhanced: bool,
    pub enhancement_failure: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub source: String,
    pub context: IterationContext,
    pub shape: CodeShape,
    /// Routes the rewrite through the text generator; the skeleton still
    /// ships if that fails.
    pub requires_complex_logic: bool,
}

impl OptimizeRequest {
    pub fn new(source: &str, context: IterationContext) -> Self {
        Self {
            source: source.to_string(),
            context,
            shape: CodeShape::default(),
            requires_complex_logic: false,
        }
    }

    pub fn with_shape(mut self, shape: CodeShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_complex_logic(mut self, requires_complex_logic: bool) -> Self {
        self.requires_complex_logic = requires_complex_logic;
        self
    }
}

/// Model-predicted gains of a rewrite. Negative percentages are honest:
/// they mean the caller's stated context predicts a regression.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    pub performance_improvement_pct: f64,
    pub memory_improvement_pct: f64,
    pub optimization_score: f64,
}

impl OptimizationMetrics {
    pub fn zero() -> Self {
        Self {
            performance_improvement_pct: 0.0,
            memory_improvement_pct: 0.0,
            optimization_score: 0.0,
        }
    }

    pub fn from_estimates(before: &PerformanceEstimate, after: &PerformanceEstimate) -> Self {
        let performance_improvement_pct = improvement_pct(
            before.estimated_execution_time_ms,
            after.estimated_execution_time_ms,
        );
        let memory_improvement_pct = improvement_pct(
            before.estimated_memory_usage_mb,
            after.estimated_memory_usage_mb,
        );
        let optimization_score = (0.7 * performance_improvement_pct
            + 0.3 * memory_improvement_pct)
            .clamp(0.0, 100.0);
        Self {
            performance_improvement_pct,
            memory_improvement_pct,
            optimization_score,
        }
    }
}

fn improvement_pct(before: f64, after: f64) -> f64 {
    if before <= 0.0 {
        return 0.0;
    }
    (before - after) / before * 100.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    pub original_strategy: Option<StrategyKind>,
    pub selected_strategy: StrategyKind,
    pub rewritten: bool,
    pub source: String,
    pub metrics: OptimizationMetrics,
    pub enhanced: bool,
    pub enhancement_failure: Option<String>,
    pub note: String,
}

/// Turns selector choices into source text and rewrites existing loops.
/// The text generator is optional; its absence or failure never escapes
/// past the `enhancement_failure` field.
#[derive(Default)]
pub struct CodeOptimizer {
    enhancer: Option<Box<dyn TextGenerator>>,
}

impl CodeOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enhancer(mut self, enhancer: Box<dyn TextGenerator>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    pub fn has_enhancer(&self) -> bool {
        self.enhancer.is_some()
    }

    pub fn generate(&self, selector: &StrategySelector, request: &GenerateRequest) -> GeneratedCode {
        let shape = request.shape.clone().normalized();
        let strategy = request
            .strategy
            .unwrap_or_else(|| selector.select_strategy(&request.context));
        let skeleton = templates::generate(strategy, &shape);
        if !request.enhance {
            return GeneratedCode {
                strategy,
                source: skeleton,
                enhanced: false,
                enhancement_failure: None,
            };
        }
        self.enhance(strategy, &shape, skeleton)
    }

    pub fn optimize(
        &self,
        selector: &StrategySelector,
        request: &OptimizeRequest,
    ) -> OptimizationOutcome {
        let context = request.context.clone().normalized();
        let shape = request.shape.clone().normalized();
        let selected_strategy = selector.select_strategy(&context);

        let Some(original_strategy) = detect_strategy(&request.source) else {
            return OptimizationOutcome {
                original_strategy: None,
                selected_strategy,
                rewritten: false,
                source: request.source.clone(),
                metrics: OptimizationMetrics::zero(),
                enhanced: false,
                enhancement_failure: None,
                note: "no recognizable loop shape; source left unchanged".to_string(),
            };
        };

        if original_strategy == selected_strategy {
            return OptimizationOutcome {
                original_strategy: Some(original_strategy),
                selected_strategy,
                rewritten: false,
                source: request.source.clone(),
                metrics: OptimizationMetrics::zero(),
                enhanced: false,
                enhancement_failure: None,
                note: format!("{} is already the best fit", original_strategy.id()),
            };
        }

        let skeleton = templates::generate(selected_strategy, &shape);
        let generated = if request.requires_complex_logic {
            self.enhance(selected_strategy, &shape, skeleton)
        } else {
            GeneratedCode {
                strategy: selected_strategy,
                source: skeleton,
                enhanced: false,
                enhancement_failure: None,
            }
        };

        let estimator = selector.estimator();
        let before = estimator.estimate(original_strategy, &context);
        let after = estimator.estimate(selected_strategy, &context);
        let metrics = OptimizationMetrics::from_estimates(&before, &after);
        tracing::info!(
            from = original_strategy.id(),
            to = selected_strategy.id(),
            performance_improvement_pct = metrics.performance_improvement_pct,
            "rewrote loop"
        );

        OptimizationOutcome {
            original_strategy: Some(original_strategy),
            selected_strategy,
            rewritten: true,
            source: generated.source,
            metrics,
            enhanced: generated.enhanced,
            enhancement_failure: generated.enhancement_failure,
            note: format!(
                "rewrote {} as {}",
                original_strategy.id(),
                selected_strategy.id()
            ),
        }
    }

    fn enhance(&self, strategy: StrategyKind, shape: &CodeShape, skeleton: String) -> GeneratedCode {
        let Some(enhancer) = &self.enhancer else {
            return GeneratedCode {
                strategy,
                source: skeleton,
                enhanced: false,
                enhancement_failure: Some("no text generator configured".to_string()),
            };
        };
        let prompt = build_prompt(strategy, shape, &skeleton);
        match enhancer.generate(&prompt) {
            Ok(source) => GeneratedCode {
                strategy,
                source,
                enhanced: true,
                enhancement_failure: None,
            },
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    generator = enhancer.name(),
                    strategy = strategy.id(),
                    "enhancement failed, keeping the skeleton"
                );
                GeneratedCode {
                    strategy,
                    source: skeleton,
                    enhanced: false,
                    enhancement_failure: Some(format!("{error:#}")),
                }
            }
        }
    }
}

fn build_prompt(strategy: StrategyKind, shape: &CodeShape, skeleton: &str) -> String {
    format!(
        r#"You are rewriting a collection-processing loop. Keep the iteration pattern of the skeleton and fold the body logic into it.

SKELETON ({id}: {summary}):
{skeleton}

BODY LOGIC:
{body}

CONSTRAINTS:
- Keep the {id} iteration pattern exactly; do not switch strategies
- Keep the collection name `{collection}` and item name `{item}`
- Respond with ONLY the rewritten loop (no markdown, no explanation)"#,
        id = strategy.id(),
        summary = strategy.summary(),
        skeleton = skeleton,
        body = shape.body,
        collection = shape.collection,
        item = shape.item,
    )
}
