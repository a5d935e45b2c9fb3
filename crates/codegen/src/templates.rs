//! Source templates, one per catalog strategy.

use crate::shape::CodeShape;
use loopforge_strategies::StrategyKind;

/// Renders the loop skeleton for a strategy. Pure templating: equal
/// inputs produce byte-identical output, so generation is idempotent.
/// Callers normalize the shape first.
pub fn generate(strategy: StrategyKind, shape: &CodeShape) -> String {
    match strategy {
        StrategyKind::ForLoop => for_loop(shape),
        StrategyKind::ForeachLoop => foreach_loop(shape),
        StrategyKind::LinqQuery => linq_query(shape),
        StrategyKind::ParallelLinq => parallel_linq(shape),
        StrategyKind::UnityOptimized => unity_optimized(shape),
    }
}

fn for_loop(shape: &CodeShape) -> String {
    format!(
        "for (int {index} = 0; {index} < {collection}.Count; {index}++)\n{{\n    var {item} = {collection}[{index}];\n{body}\n}}",
        index = shape.index,
        collection = shape.collection,
        item = shape.item,
        body = indent(&shape.body, 1),
    )
}

fn foreach_loop(shape: &CodeShape) -> String {
    format!(
        "foreach (var {item} in {collection})\n{{\n{body}\n}}",
        item = shape.item,
        collection = shape.collection,
        body = indent(&shape.body, 1),
    )
}

fn linq_query(shape: &CodeShape) -> String {
    let mut stages = String::new();
    if let Some(filter) = &shape.filter {
        stages.push_str(&format!("\n    .Where({} => {})", shape.item, filter));
    }
    if let Some(selector) = &shape.selector {
        stages.push_str(&format!("\n    .Select({} => {})", shape.item, selector));
    }
    if stages.is_empty() {
        return format!(
            "var {result} = {collection}.ToList();\n{result}.ForEach({item} => {body});",
            result = shape.result,
            collection = shape.collection,
            item = shape.item,
            body = statement_to_expression(&shape.body),
        );
    }
    format!(
        "var {result} = {collection}{stages}\n    .ToList();",
        result = shape.result,
        collection = shape.collection,
    )
}

fn parallel_linq(shape: &CodeShape) -> String {
    let filter = match &shape.filter {
        Some(filter) => format!("\n    .Where({} => {})", shape.item, filter),
        None => String::new(),
    };
    format!(
        "{collection}\n    .AsParallel(){filter}\n    .ForAll({item} =>\n    {{\n{body}\n    }});",
        collection = shape.collection,
        item = shape.item,
        body = indent(&shape.body, 2),
    )
}

fn unity_optimized(shape: &CodeShape) -> String {
    format!(
        "int count = {collection}.Count;\nfor (int {index} = 0; {index} < count; {index}++)\n{{\n    var {item} = {collection}[{index}];\n{body}\n}}",
        collection = shape.collection,
        index = shape.index,
        item = shape.item,
        body = indent(&shape.body, 1),
    )
}

/// Indents every non-blank line by `level` four-space steps.
fn indent(text: &str, level: usize) -> String {
    let pad = "    ".repeat(level);
    text.trim_end()
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Single-statement bodies drop the trailing semicolon when spliced into
/// a lambda position.
fn statement_to_expression(body: &str) -> &str {
    body.trim().trim_end_matches(';')
}
