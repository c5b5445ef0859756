//! Formatted terminal output for build and coverage runs.
//!
//! Formatting lives in one place so the reconciliation code stays clean and
//! output changes are localized.

use std::collections::BTreeMap;

use crate::domain::{DatasetFile, SourceTag};
use crate::report::CoverageSummary;

/// Format the full run summary: window, calibration, per-country tier mix,
/// FX resolution methods, and residual gaps.
pub fn format_run_summary(dataset: &DatasetFile, summary: &CoverageSummary) -> String {
    let mut out = String::new();

    out.push_str("=== m2 - Broad Money Long History ===\n");
    out.push_str(&format!(
        "Window: {}-{} | countries={} | expected rows/country={}\n",
        summary.start_year,
        summary.end_year,
        summary.country_count,
        summary.expected_years_per_country
    ));
    out.push_str(&format!(
        "Global scale: {:.6}\n",
        dataset.diagnostics.global_scale
    ));
    if dataset.diagnostics.aggregate_areas.is_empty() {
        out.push_str("Aggregate areas: none available\n");
    } else {
        out.push_str(&format!(
            "Aggregate areas: {}\n",
            dataset.diagnostics.aggregate_areas.join(", ")
        ));
    }

    out.push_str("\nCountries:\n");
    out.push_str(&format!(
        "{:<4} {:<16} {:>6} {:>8} {:>8}  {}\n",
        "code", "name", "scale", "valid", "missing", "tiers"
    ));
    for (code, block) in &dataset.countries {
        let cov = summary.by_country.get(code);
        let scale = dataset
            .diagnostics
            .scale_factors
            .get(code)
            .copied()
            .unwrap_or(1.0);
        out.push_str(&format!(
            "{:<4} {:<16} {:>6.3} {:>8} {:>8}  {}\n",
            code,
            truncate(&block.name, 16),
            scale,
            cov.map(|c| c.valid_m2).unwrap_or(0),
            cov.map(|c| c.missing_m2).unwrap_or(0),
            tier_mix(block.annual.iter().filter_map(|r| r.source)),
        ));
    }

    out.push_str("\nFX resolution:\n");
    for (currency, method) in &dataset.fx.sources {
        out.push_str(&format!("  {currency}: {method}\n"));
    }

    if !dataset.diagnostics.coverage_gaps.is_empty() {
        out.push_str("\nCoverage gaps:\n");
        for (code, years) in &dataset.diagnostics.coverage_gaps {
            out.push_str(&format!("  {code}: {} unresolved years\n", years.len()));
        }
    }

    out
}

/// Format the standalone coverage report (`m2 coverage`).
pub fn format_coverage(summary: &CoverageSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Coverage {}-{}: countries={}, totalMissingM2={}\n",
        summary.start_year, summary.end_year, summary.country_count, summary.total_missing_m2
    ));
    out.push_str(&format!(
        "{:<4} {:>6} {:>8} {:>8} {:>8} {:>8}\n",
        "code", "rows", "valid", "growth", "missing", "last"
    ));
    for (code, cov) in &summary.by_country {
        out.push_str(&format!(
            "{:<4} {:>6} {:>8} {:>8} {:>8} {:>8}\n",
            code,
            cov.rows,
            cov.valid_m2,
            cov.valid_growth,
            cov.missing_m2,
            cov.last_year.map(|y| y.to_string()).unwrap_or_default(),
        ));
    }
    out
}

/// Compact tier usage like `direct-primary:31 growth-chained:14`.
fn tier_mix(tags: impl Iterator<Item = SourceTag>) -> String {
    let mut counts: BTreeMap<SourceTag, usize> = BTreeMap::new();
    for tag in tags {
        *counts.entry(tag).or_insert(0) += 1;
    }
    if counts.is_empty() {
        return "-".to_string();
    }
    counts
        .iter()
        .map(|(tag, n)| format!("{}:{n}", tag.display_name()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
