use colored::*;
use retitle_core::{ExecutionSummary, OperationResult, PlannedOperation};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;

const COLUMN_WIDTH: usize = 40;
const DISPLAY_LIMIT: usize = 38;
const RULE_WIDTH: usize = 80;

#[derive(Debug, Serialize)]
struct PreviewRow {
    old: String,
    new: String,
    old_name: String,
    new_name: String,
    timestamp: Option<i64>,
}

fn shorten(name: &str) -> String {
    if name.chars().count() > DISPLAY_LIMIT {
        let head: String = name.chars().take(DISPLAY_LIMIT - 3).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

pub fn preview_table(title: &str, plan: &[PlannedOperation]) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "{}", title.bold());
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(
        out,
        "{:<width$} => {:<width$}",
        "Old Name",
        "New Name",
        width = COLUMN_WIDTH
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));

    for op in plan {
        let old_name = format!("{:<width$}", shorten(&op.source_name()), width = COLUMN_WIDTH);
        let new_name = format!(
            "{:<width$}",
            shorten(&op.destination_name()),
            width = COLUMN_WIDTH
        );
        let _ = writeln!(out, "{} => {}", old_name.yellow(), new_name.green());
    }

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Total operations: {}", plan.len());
    let _ = writeln!(out, "{}\n", rule);
    out
}

pub fn preview_json(plan: &[PlannedOperation]) -> Result<String, serde_json::Error> {
    let rows: Vec<PreviewRow> = plan
        .iter()
        .map(|op| PreviewRow {
            old: op.source.display().to_string(),
            new: op.destination.display().to_string(),
            old_name: op.source_name(),
            new_name: op.destination_name(),
            timestamp: op.timestamp,
        })
        .collect();
    serde_json::to_string_pretty(&rows)
}

pub fn duplicate_lines(duplicates: &BTreeMap<String, Vec<PathBuf>>) -> Vec<String> {
    let mut lines = vec!["Duplicate target names detected:".to_string()];
    for (target_name, sources) in duplicates {
        lines.push(format!("  {}:", target_name));
        for source in sources {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| source.display().to_string());
            lines.push(format!("    - {}", name));
        }
    }
    lines.push("Please resolve duplicates before proceeding".to_string());
    lines.push("This usually means multiple identifiers have the same title in the CSV".to_string());
    lines
}

pub fn summary_lines(title: &str, results: &[OperationResult]) -> Vec<String> {
    let summary = ExecutionSummary::from_results(results);
    let rule = "=".repeat(RULE_WIDTH);

    let mut lines = vec![
        rule.clone(),
        title.to_string(),
        rule.clone(),
        format!("Total operations: {}", summary.total),
        format!("Successful: {}", summary.succeeded),
        format!("Failed: {}", summary.failed),
    ];

    if summary.failed > 0 {
        lines.push("Failed operations:".to_string());
        for result in results.iter().filter(|r| !r.success) {
            lines.push(format!(
                "  {} => {}",
                name_of(&result.source),
                name_of(&result.destination)
            ));
            lines.push(format!(
                "    Reason: {}",
                result.error.as_deref().unwrap_or("unknown")
            ));
        }
    }

    lines.push(rule);
    lines
}

fn name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
