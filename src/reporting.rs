// src/reporting.rs
//! Console output formatting for refactoring reports.
//!
//! Per-unit lines show what happened to each region; the summary totals
//! regions, rewrites and flags. `--json` callers use `to_json` instead.

use colored::Colorize;

use crate::error::{RefactorError, Result};
use crate::types::{Flag, RefactorReport, RegionOutcome, UnitReport};

/// Serializes the full report for machine consumption.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(report: &RefactorReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(|e| RefactorError::Other(e.to_string()))
}

/// Prints a formatted report to stdout.
pub fn print_report(report: &RefactorReport, verbose: bool) {
    for unit in &report.units {
        print_unit(unit, verbose);
    }
    print_summary(report);
}

fn print_unit(unit: &UnitReport, verbose: bool) {
    if unit.outcomes.is_empty() && unit.error.is_none() && !verbose {
        return;
    }
    println!("{} [{}]", unit.identity.bold(), unit.dialect.cyan());

    if let Some(error) = &unit.error {
        println!("  {} {error}", "skipped:".yellow());
        return;
    }
    if unit.outcomes.is_empty() {
        println!("  {}", "no nested regions".dimmed());
        return;
    }
    for outcome in &unit.outcomes {
        print_outcome(outcome);
    }
}

fn print_outcome(outcome: &RegionOutcome) {
    let location = format!("lines {}-{}", outcome.span.line_start, outcome.span.line_end);
    let tag = outcome.pattern_tag();
    let tag = if outcome.pattern.is_some() {
        tag.green().bold()
    } else {
        tag.yellow().bold()
    };

    let mut line = format!("  {location}: {tag} - {}", outcome.description);
    if let Some(confidence) = outcome.confidence() {
        line.push_str(&format!(" (confidence {confidence:.2})"));
    }
    for flag in &outcome.flags {
        if *flag == Flag::LowConfidence {
            line.push_str(&format!(" {}", "[low-confidence]".yellow()));
        }
    }
    println!("{line}");
}

fn print_summary(report: &RefactorReport) {
    println!("---------------------------------------------------");
    let line = format!(
        "{} region(s) found, {} rewritten, {} left unchanged in {}ms",
        report.total_regions,
        report.total_rewritten,
        report.total_regions - report.total_rewritten,
        report.duration_ms
    );
    if report.total_regions == 0 {
        println!("{}", "No deeply nested conditionals found.".green().bold());
    } else if report.has_unflattened() {
        println!("{}", line.yellow().bold());
    } else {
        println!("{}", line.green().bold());
    }
}
