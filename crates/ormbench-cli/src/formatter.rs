//! Output formatters for run results.

use std::collections::HashMap;

use clap::ValueEnum;
use comfy_table::{Cell, CellAlignment, Table};
use ormbench_bench::{BackendKind, RunResult, Workload};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render results in the requested format.
pub fn format_results(results: &[RunResult], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_table(results),
        OutputFormat::Json => {
            serde_json::to_string_pretty(results).unwrap_or_else(|_| "[]".to_string())
        }
    }
}

/// One row per run; `Relative` compares mean latency against the fastest
/// backend on the same workload.
fn format_table(results: &[RunResult]) -> String {
    if results.is_empty() {
        return "No results".to_string();
    }

    let mut fastest: HashMap<Workload, u64> = HashMap::new();
    for result in results {
        let best = fastest.entry(result.workload).or_insert(u64::MAX);
        *best = (*best).min(result.latency.avg_ns);
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Backend",
        "Workload",
        "Iterations",
        "Elapsed",
        "Ops/sec",
        "Avg",
        "P50",
        "P99",
        "Max",
        "Relative",
    ]);

    for result in results {
        let latency = &result.latency;
        let relative = match fastest.get(&result.workload) {
            Some(&best) if best > 0 => format!("{:.2}x", latency.avg_ns as f64 / best as f64),
            _ => "-".to_string(),
        };

        table.add_row(vec![
            Cell::new(result.backend),
            Cell::new(result.workload),
            Cell::new(result.iterations).set_alignment(CellAlignment::Right),
            Cell::new(format_ns(result.elapsed_ns)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.0}", result.ops_per_sec)).set_alignment(CellAlignment::Right),
            Cell::new(format_ns(latency.avg_ns)).set_alignment(CellAlignment::Right),
            Cell::new(format_ns(latency.p50_ns)).set_alignment(CellAlignment::Right),
            Cell::new(format_ns(latency.p99_ns)).set_alignment(CellAlignment::Right),
            Cell::new(format_ns(latency.max_ns)).set_alignment(CellAlignment::Right),
            Cell::new(relative).set_alignment(CellAlignment::Right),
        ]);
    }

    table.to_string()
}

/// Registered backends and workloads.
pub fn format_registry() -> String {
    let mut table = Table::new();
    table.set_header(vec!["Kind", "Name"]);

    for kind in BackendKind::ALL {
        table.add_row(vec!["backend", kind.name()]);
    }
    for workload in Workload::ALL {
        table.add_row(vec!["workload", workload.name()]);
    }

    table.to_string()
}

/// Human-readable duration from nanoseconds.
fn format_ns(ns: u64) -> String {
    if ns < 1_000 {
        format!("{}ns", ns)
    } else if ns < 1_000_000 {
        format!("{:.2}us", ns as f64 / 1_000.0)
    } else if ns < 1_000_000_000 {
        format!("{:.2}ms", ns as f64 / 1_000_000.0)
    } else {
        format!("{:.2}s", ns as f64 / 1_000_000_000.0)
    }
}
