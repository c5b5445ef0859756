//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while reconciling
//! - exported to the dataset JSON document
//! - reloaded later for coverage checks

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Calendar year. All series in this project are annual.
pub type Year = i32;

/// Sparse ordered year → value mapping.
///
/// Absence of a key means "no observation"; keys need not be contiguous until
/// a series is finalized by the residual fill stage.
pub type AnnualSeries = BTreeMap<Year, f64>;

/// Provenance tier of a reconciled value.
///
/// Declaration order is precedence order: the first tier that resolves a year
/// wins, and later tiers must never overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceTag {
    /// Taken from the primary (governmental-statistics) provider as-is.
    DirectPrimary,
    /// Taken from the secondary (supranational-statistics) provider and
    /// multiplied by the entity's calibration factor.
    DirectSecondaryScaled,
    /// Apportioned from a shared regional aggregate by GDP share.
    SyntheticAllocated,
    /// Compounded from an adjacent known level through a growth rate.
    GrowthChained,
    /// Linear time interpolation or flat edge extension.
    Interpolated,
}

impl SourceTag {
    pub const ALL: [SourceTag; 5] = [
        SourceTag::DirectPrimary,
        SourceTag::DirectSecondaryScaled,
        SourceTag::SyntheticAllocated,
        SourceTag::GrowthChained,
        SourceTag::Interpolated,
    ];

    /// Whether this tier counts as direct coverage (not purely derived in
    /// time). Used by the coverage evaluator to bound dataset trustworthiness.
    pub fn is_direct(self) -> bool {
        matches!(
            self,
            SourceTag::DirectPrimary
                | SourceTag::DirectSecondaryScaled
                | SourceTag::SyntheticAllocated
        )
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            SourceTag::DirectPrimary => "direct-primary",
            SourceTag::DirectSecondaryScaled => "direct-secondary-scaled",
            SourceTag::SyntheticAllocated => "synthetic-allocated",
            SourceTag::GrowthChained => "growth-chained",
            SourceTag::Interpolated => "interpolated",
        }
    }
}

/// One finalized (entity, year) record in the output document.
///
/// `m2_local` stays `None` only when an entity had no resolvable data at all
/// for that year (empty series end to end); such years are also listed under
/// `diagnostics.coverageGaps`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledRecord {
    pub year: Year,
    pub m2_local: Option<f64>,
    pub m2_growth_pct: Option<f64>,
    pub lending_rate_pct: Option<f64>,
    pub source: Option<SourceTag>,
}

/// A dated annotation rendered alongside the series (policy shocks, regime
/// shifts). Carried in the immutable registry and emitted verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventNote {
    pub year: Year,
    pub title: String,
    pub detail: String,
}

/// Upstream provenance entry for the `sources` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub name: String,
    pub url: String,
}

/// Resolved FX series for one currency: dense USD-per-unit values plus the
/// method string describing how it was obtained (`fixed`, `yahoo:{ticker}`,
/// `worldbank:PA.NUS.FCRF:{ref}`, or `unavailable`).
#[derive(Debug, Clone)]
pub struct FxResolution {
    pub usd_per_unit: AnnualSeries,
    pub method: String,
}

/// Run metadata block of the output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMeta {
    pub generated_at: String,
    pub start_year: Year,
    pub end_year: Year,
    pub unit_policy: String,
    pub notes: Vec<String>,
}

/// Per-country block of the output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryBlock {
    pub name: String,
    pub wb: String,
    pub currency: String,
    pub gdp_rank: u32,
    pub annual: Vec<ReconciledRecord>,
}

/// FX block of the output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxBlock {
    pub usd_per_currency: BTreeMap<String, AnnualSeries>,
    pub sources: BTreeMap<String, String>,
    pub base_currencies: Vec<String>,
}

/// Diagnostics block: calibration outcomes and residual coverage gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub global_scale: f64,
    pub scale_factors: BTreeMap<String, f64>,
    pub aggregate_areas: Vec<String>,
    pub coverage_gaps: BTreeMap<String, Vec<Year>>,
}

/// The whole output document. This is the sole boundary artifact of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetFile {
    pub meta: RunMeta,
    pub countries: BTreeMap<String, CountryBlock>,
    pub fx: FxBlock,
    pub events: Vec<EventNote>,
    pub sources: Vec<SourceRef>,
    pub diagnostics: Diagnostics,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults); it never changes after
/// startup.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub start_year: Year,
    pub end_year: Year,
    /// Worker threads for the raw-fetch pool.
    pub jobs: usize,
    /// Build from built-in fixtures instead of the network.
    pub offline: bool,
    pub out: PathBuf,
    pub summary: Option<PathBuf>,
    /// Treat any residual coverage gap as a run failure.
    pub strict: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_tag_serializes_to_kebab_case() {
        let expected = [
            "direct-primary",
            "direct-secondary-scaled",
            "synthetic-allocated",
            "growth-chained",
            "interpolated",
        ];
        for (tag, want) in SourceTag::ALL.iter().zip(expected) {
            let got = serde_json::to_string(tag).unwrap();
            assert_eq!(got, format!("\"{want}\""));
            assert_eq!(tag.display_name(), want);
        }
    }

    #[test]
    fn source_tag_precedence_matches_declaration_order() {
        assert!(SourceTag::DirectPrimary < SourceTag::DirectSecondaryScaled);
        assert!(SourceTag::DirectSecondaryScaled < SourceTag::SyntheticAllocated);
        assert!(SourceTag::SyntheticAllocated < SourceTag::GrowthChained);
        assert!(SourceTag::GrowthChained < SourceTag::Interpolated);
    }

    #[test]
    fn direct_tiers_are_exactly_the_first_three() {
        assert!(SourceTag::DirectPrimary.is_direct());
        assert!(SourceTag::DirectSecondaryScaled.is_direct());
        assert!(SourceTag::SyntheticAllocated.is_direct());
        assert!(!SourceTag::GrowthChained.is_direct());
        assert!(!SourceTag::Interpolated.is_direct());
    }

    #[test]
    fn record_serializes_with_camel_case_keys() {
        let rec = ReconciledRecord {
            year: 1999,
            m2_local: Some(1.5),
            m2_growth_pct: None,
            lending_rate_pct: Some(7.25),
            source: Some(SourceTag::DirectPrimary),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["m2Local"], 1.5);
        assert_eq!(json["lendingRatePct"], 7.25);
        assert_eq!(json["source"], "direct-primary");
        assert!(json["m2GrowthPct"].is_null());
    }
}
