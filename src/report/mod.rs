//! Run reporting: coverage accounting and formatted terminal output.
//!
//! Coverage numbers are computed from the finished document (not from
//! pipeline internals) so `m2 coverage` can re-derive them from a dataset
//! file on disk and reach the same answers as the run that wrote it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{DatasetFile, Year};

pub mod format;

pub use format::*;

/// Per-country coverage accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryCoverage {
    pub rows: usize,
    pub valid_m2: usize,
    pub valid_growth: usize,
    pub missing_m2: usize,
    pub first_year: Option<Year>,
    pub last_year: Option<Year>,
}

/// Whole-dataset coverage accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSummary {
    pub start_year: Year,
    pub end_year: Year,
    pub expected_years_per_country: usize,
    pub country_count: usize,
    pub total_missing_m2: usize,
    pub by_country: BTreeMap<String, CountryCoverage>,
}

/// Machine-readable run summary written next to the dataset (`--summary`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    pub updated_at: String,
    pub data_file: String,
    pub coverage: CoverageSummary,
    pub notes: Vec<String>,
}

/// Account for every country's valid and missing values.
pub fn summarize_coverage(dataset: &DatasetFile) -> CoverageSummary {
    let start = dataset.meta.start_year;
    let end = dataset.meta.end_year;
    let expected = if end >= start {
        (end - start + 1) as usize
    } else {
        0
    };

    let mut by_country = BTreeMap::new();
    let mut total_missing = 0;

    for (code, block) in &dataset.countries {
        let valid_m2 = block
            .annual
            .iter()
            .filter(|r| r.m2_local.map(f64::is_finite).unwrap_or(false))
            .count();
        let valid_growth = block
            .annual
            .iter()
            .filter(|r| r.m2_growth_pct.map(f64::is_finite).unwrap_or(false))
            .count();
        let missing = expected.saturating_sub(valid_m2);
        total_missing += missing;

        by_country.insert(
            code.clone(),
            CountryCoverage {
                rows: block.annual.len(),
                valid_m2,
                valid_growth,
                missing_m2: missing,
                first_year: block.annual.first().map(|r| r.year),
                last_year: block.annual.last().map(|r| r.year),
            },
        );
    }

    CoverageSummary {
        start_year: start,
        end_year: end,
        expected_years_per_country: expected,
        country_count: dataset.countries.len(),
        total_missing_m2: total_missing,
        by_country,
    }
}
