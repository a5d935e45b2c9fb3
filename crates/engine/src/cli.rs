//! CLI wiring for the LoopForge toolkit.

use crate::engine::Engine;
use crate::suite::{BenchSuite, SuiteReport};
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use loopforge_bench::BenchmarkRunner;
use loopforge_codegen::{
    CodeOptimizer, CodeShape, GenerateRequest, HttpTextGenerator, OptimizeRequest,
};
use loopforge_strategies::{
    EnvironmentProfile, IterationContext, PerformanceRequirements, StrategyKind, TargetPlatform,
};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "loopforge", about = "Iteration-strategy selection toolkit")]
pub struct Cli {
    #[arg(long, value_enum, default_value = "dotnet")]
    pub platform: PlatformArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum PlatformArg {
    #[value(name = "dotnet")]
    DotNet,
    Unity,
    Web,
    Mobile,
    Server,
}

impl From<PlatformArg> for TargetPlatform {
    fn from(value: PlatformArg) -> TargetPlatform {
        match value {
            PlatformArg::DotNet => TargetPlatform::DotNet,
            PlatformArg::Unity => TargetPlatform::Unity,
            PlatformArg::Web => TargetPlatform::Web,
            PlatformArg::Mobile => TargetPlatform::Mobile,
            PlatformArg::Server => TargetPlatform::Server,
        }
    }
}

#[derive(clap::Args, Clone, Debug)]
pub struct ContextArgs {
    /// Number of items the loop will process.
    #[arg(long, default_value_t = 10_000)]
    pub data_size: u64,
    #[arg(long, default_value_t = false)]
    pub prefer_parallel: bool,
    #[arg(long, default_value_t = false)]
    pub real_time: bool,
    #[arg(long, default_value_t = false)]
    pub memory_critical: bool,
    /// Hard execution-time cap in milliseconds.
    #[arg(long)]
    pub max_time_ms: Option<f64>,
    /// Hard memory cap in megabytes.
    #[arg(long)]
    pub max_memory_mb: Option<f64>,
    /// Override the detected host core count.
    #[arg(long)]
    pub cores: Option<u32>,
}

impl ContextArgs {
    fn into_context(self, platform: TargetPlatform) -> IterationContext {
        let mut environment = EnvironmentProfile::host();
        if let Some(cores) = self.cores {
            environment.cpu_cores = cores;
        }
        environment.is_web = platform == TargetPlatform::Web;
        environment.is_mobile = platform == TargetPlatform::Mobile;

        let mut requirements = PerformanceRequirements::default()
            .with_prefer_parallel(self.prefer_parallel)
            .with_requires_real_time(self.real_time)
            .with_memory_critical(self.memory_critical);
        if let Some(cap) = self.max_time_ms {
            requirements = requirements.with_max_execution_time_ms(cap);
        }
        if let Some(cap) = self.max_memory_mb {
            requirements = requirements.with_max_memory_usage_mb(cap);
        }

        IterationContext::new(self.data_size)
            .with_platform(platform)
            .with_requirements(requirements)
            .with_environment(environment)
            .normalized()
    }
}

#[derive(clap::Args, Clone, Debug)]
pub struct ShapeArgs {
    #[arg(long, default_value = "items")]
    pub collection: String,
    #[arg(long, default_value = "item")]
    pub item: String,
    /// Loop body statements; blank means a placeholder call.
    #[arg(long, default_value = "")]
    pub body: String,
    /// Filter expression for query-shaped strategies.
    #[arg(long)]
    pub filter: Option<String>,
    /// Projection expression for query-shaped strategies.
    #[arg(long)]
    pub selector: Option<String>,
}

impl From<ShapeArgs> for CodeShape {
    fn from(args: ShapeArgs) -> CodeShape {
        CodeShape {
            collection: args.collection,
            item: args.item,
            body: args.body,
            filter: args.filter,
            selector: args.selector,
            ..CodeShape::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pick the best strategy for a context and explain the choice.
    Select {
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Rank every registered strategy for a context.
    Compare {
        #[command(flatten)]
        context: ContextArgs,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the curated guidance for the selected platform.
    Recommend,
    /// Measure every strategy against a synthetic workload.
    Benchmark {
        #[arg(long, default_value_t = 100_000)]
        data_size: u64,
        #[arg(long, default_value_t = 1)]
        warmup: usize,
        #[arg(long, default_value_t = 5)]
        runs: usize,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run the curated benchmark ladder and emit a JSON report.
    Suite {
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        baseline: Option<PathBuf>,
    },
    /// Generate loop source for a context (or an explicit strategy).
    Generate {
        #[command(flatten)]
        context: ContextArgs,
        #[command(flatten)]
        shape: ShapeArgs,
        /// Force a strategy instead of asking the selector.
        #[arg(long)]
        strategy: Option<String>,
        /// Rewrite the skeleton through the configured text generator.
        #[arg(long, default_value_t = false)]
        enhance: bool,
    },
    /// Rewrite the loop in a source file onto the best strategy.
    Optimize {
        /// File containing the loop to rewrite.
        #[arg(long)]
        source: PathBuf,
        #[command(flatten)]
        context: ContextArgs,
        #[command(flatten)]
        shape: ShapeArgs,
        /// Route the rewrite through the configured text generator.
        #[arg(long, default_value_t = false)]
        complex: bool,
        /// Write the rewritten source here instead of stdout only.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

pub fn run_cli(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let Cli { platform, command } = cli;
    let platform: TargetPlatform = platform.into();

    match command {
        Command::Select { context } => {
            let engine = Engine::new();
            println!("{}", engine.selection_reasoning(&context.into_context(platform)));
        }
        Command::Compare { context, output } => {
            let engine = Engine::new();
            let comparisons = engine.compare_strategies(&context.into_context(platform));
            for row in &comparisons {
                let tag = if row.is_recommended {
                    " (recommended)"
                } else {
                    ""
                };
                println!(
                    "- {}{}: suitability={:.1} time_ms={:.3} memory_mb={:.3} meets={}",
                    row.strategy.id(),
                    tag,
                    row.suitability_score,
                    row.estimate.estimated_execution_time_ms,
                    row.estimate.estimated_memory_usage_mb,
                    row.estimate.meets_requirements
                );
            }
            if let Some(path) = output {
                fs::write(path, serde_json::to_string_pretty(&comparisons)?)?;
            }
        }
        Command::Recommend => {
            let engine = Engine::new();
            for row in engine.recommendations(platform) {
                let upper = if row.data_size_range.1 == u64::MAX {
                    "+".to_string()
                } else {
                    format!("..{}", row.data_size_range.1)
                };
                println!(
                    "- [{}{}] {}: {} ({})",
                    row.data_size_range.0,
                    upper,
                    row.strategy.id(),
                    row.scenario,
                    row.reasoning
                );
            }
        }
        Command::Benchmark {
            data_size,
            warmup,
            runs,
            seed,
            output,
        } => {
            let mut runner = BenchmarkRunner::new().with_runs(warmup, runs);
            if let Some(seed) = seed {
                runner = runner.with_seed(seed);
            }
            let engine = Engine::new().with_runner(runner);
            let results = engine.benchmark_all(data_size, platform);
            for result in &results {
                if let Some(reason) = &result.failure {
                    println!("- {}: FAILED ({})", result.strategy.id(), reason);
                    continue;
                }
                let tag = if result.is_recommended {
                    " (recommended)"
                } else {
                    ""
                };
                println!(
                    "- {}{}: time_ms={:.3} memory_mb={:.3} score={:.1} items_per_sec={:.0}",
                    result.strategy.id(),
                    tag,
                    result.execution_time_ms,
                    result.memory_usage_mb,
                    result.performance_score,
                    result.items_per_sec
                );
            }
            if let Some(path) = output {
                fs::write(path, serde_json::to_string_pretty(&results)?)?;
            }
        }
        Command::Suite { output, baseline } => {
            let engine = Engine::new();
            let report = BenchSuite::size_ladder().run(&engine, platform);

            println!(
                "platform={}, cases={}, generated_at={}",
                report.platform,
                report.cases.len(),
                report.generated_at_unix_ms
            );
            for case in &report.cases {
                println!(
                    "- {}: winner={} time_ms={:.3} score={:.1}",
                    case.case, case.winner, case.winner_time_ms, case.winner_score
                );
            }

            if let Some(path) = baseline {
                if path.exists() {
                    let baseline_report = SuiteReport::load(&path)?;
                    for (name, delta) in report.diff(&baseline_report) {
                        println!(
                            "Δ {}: time_ms={:+.3} score={:+.2}",
                            name, delta.time_ms_delta, delta.score_delta
                        );
                    }
                } else {
                    info!(path = %path.display(), "baseline report not found; skipping diff");
                }
            }

            if let Some(path) = output {
                report.save(&path)?;
            }
        }
        Command::Generate {
            context,
            shape,
            strategy,
            enhance,
        } => {
            let engine = engine_with_enhancer(enhance);
            let mut request = GenerateRequest::new(context.into_context(platform), shape.into())
                .with_enhance(enhance && engine.has_enhancer());
            if let Some(id) = strategy {
                let parsed = StrategyKind::from_id(&id).ok_or_else(|| {
                    anyhow!(
                        "unknown strategy {:?}; expected one of {}",
                        id,
                        known_strategy_ids()
                    )
                })?;
                request = request.with_strategy(parsed);
            }
            let generated = engine.generate_code(&request);
            info!(
                strategy = generated.strategy.id(),
                enhanced = generated.enhanced,
                "generated loop source"
            );
            if let Some(reason) = &generated.enhancement_failure {
                warn!(reason = %reason, "enhancement unavailable, emitted the skeleton");
            }
            println!("{}", generated.source);
        }
        Command::Optimize {
            source,
            context,
            shape,
            complex,
            output,
        } => {
            let engine = engine_with_enhancer(complex);
            let original = fs::read_to_string(&source)?;
            let request = OptimizeRequest::new(&original, context.into_context(platform))
                .with_shape(shape.into())
                .with_complex_logic(complex && engine.has_enhancer());
            let outcome = engine.optimize_code(&request);

            println!(
                "{} (performance {:+.1}%, memory {:+.1}%, score {:.1})",
                outcome.note,
                outcome.metrics.performance_improvement_pct,
                outcome.metrics.memory_improvement_pct,
                outcome.metrics.optimization_score
            );
            if let Some(reason) = &outcome.enhancement_failure {
                warn!(reason = %reason, "enhancement unavailable, emitted the skeleton");
            }
            println!("{}", outcome.source);
            if let Some(path) = output {
                fs::write(path, &outcome.source)?;
            }
        }
    }
    Ok(())
}

/// Builds the engine, attaching the HTTP text generator only when the
/// command asked for enhancement and credentials are present. Missing
/// credentials degrade to plain skeletons with a warning.
fn engine_with_enhancer(wants_enhancer: bool) -> Engine {
    if !wants_enhancer {
        return Engine::new();
    }
    match HttpTextGenerator::from_env() {
        Ok(generator) => {
            Engine::new().with_optimizer(CodeOptimizer::new().with_enhancer(Box::new(generator)))
        }
        Err(error) => {
            warn!(error = %error, "text generator not configured, proceeding without enhancement");
            Engine::new()
        }
    }
}

fn known_strategy_ids() -> String {
    StrategyKind::ALL
        .iter()
        .map(|strategy| strategy.id())
        .collect::<Vec<_>>()
        .join(", ")
}
