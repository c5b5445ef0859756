//! The reconciliation engine.
//!
//! Five tiers, applied as an explicit ordered fallback chain per entity:
//!
//! 1. direct-primary — the primary provider's value, as-is
//! 2. direct-secondary-scaled — the secondary provider's value, calibrated
//! 3. synthetic-allocated — GDP-share apportionment of the regional aggregate
//! 4. growth-chained — compounding through the growth-rate series
//! 5. interpolated — time interpolation / flat edge extension
//!
//! Each tier receives the still-unresolved years and may only fill those;
//! the first tier to resolve a year owns its tag permanently.

use std::collections::BTreeMap;

use crate::data::CountryRaw;
use crate::domain::{AnnualSeries, ReconciledRecord, SourceTag, Year};

pub mod allocate;
pub mod calibrate;
pub mod chain;
pub mod coverage;
pub mod fill;

/// Per-entity working state: year → (level, tag).
pub type Resolved = BTreeMap<Year, (f64, SourceTag)>;

/// Everything the tier chain needs for one entity. Built by the pipeline
/// after all raw fetches and cross-entity calibration have completed.
pub struct EntityInputs<'a> {
    pub raw: &'a CountryRaw,
    pub euro_member: bool,
    /// This entity's secondary→primary calibration factor.
    pub scale_factor: f64,
    /// Cross-entity median calibration factor (for allocation).
    pub global_scale: f64,
    /// The regional aggregate's merged direct level series.
    pub aggregate_levels: &'a AnnualSeries,
    pub aggregate_gdp: &'a AnnualSeries,
}

/// Run the full tier chain for one entity over `[start, end]`.
pub fn reconcile_entity(inputs: &EntityInputs<'_>, start: Year, end: Year) -> Resolved {
    let mut resolved = Resolved::new();

    let tiers: Vec<(SourceTag, Box<dyn Fn(&mut Resolved) -> usize + '_>)> = vec![
        (
            SourceTag::DirectPrimary,
            Box::new(|r: &mut Resolved| {
                apply_direct(r, &inputs.raw.primary, 1.0, SourceTag::DirectPrimary, start, end)
            }),
        ),
        (
            SourceTag::DirectSecondaryScaled,
            Box::new(|r: &mut Resolved| {
                apply_direct(
                    r,
                    &inputs.raw.secondary,
                    inputs.scale_factor,
                    SourceTag::DirectSecondaryScaled,
                    start,
                    end,
                )
            }),
        ),
        (
            SourceTag::SyntheticAllocated,
            Box::new(|r: &mut Resolved| {
                if !inputs.euro_member {
                    return 0;
                }
                allocate::allocate(
                    r,
                    inputs.aggregate_levels,
                    &inputs.raw.gdp,
                    inputs.aggregate_gdp,
                    inputs.global_scale,
                    start,
                    end,
                )
            }),
        ),
        (
            SourceTag::GrowthChained,
            Box::new(|r: &mut Resolved| chain::chain_growth(r, &inputs.raw.growth, start, end)),
        ),
        (
            SourceTag::Interpolated,
            Box::new(|r: &mut Resolved| fill::fill_residual(r, start, end)),
        ),
    ];

    for (tag, tier) in &tiers {
        let n = tier(&mut resolved);
        if n > 0 {
            log::debug!("tier {}: resolved {n} years", tag.display_name());
        }
    }
    resolved
}

/// Copy a direct source into unresolved years, scaled.
fn apply_direct(
    resolved: &mut Resolved,
    series: &AnnualSeries,
    scale: f64,
    tag: SourceTag,
    start: Year,
    end: Year,
) -> usize {
    let mut progressed = 0;
    for (y, v) in series.range(start..=end) {
        if resolved.contains_key(y) {
            continue;
        }
        if !v.is_finite() {
            continue;
        }
        resolved.insert(*y, (v * scale, tag));
        progressed += 1;
    }
    progressed
}

/// Finalized per-year records over `[start, end]`.
///
/// Growth comes from the sourced growth series where present, otherwise it
/// is implied from the finalized levels. Lending rates pass through
/// unchanged. Years the tier chain could not resolve keep a null level and
/// no tag.
pub fn records_for(
    resolved: &Resolved,
    raw: &CountryRaw,
    start: Year,
    end: Year,
) -> Vec<ReconciledRecord> {
    (start..=end)
        .map(|y| {
            let slot = resolved.get(&y);
            ReconciledRecord {
                year: y,
                m2_local: slot.map(|(v, _)| *v),
                m2_growth_pct: raw
                    .growth
                    .get(&y)
                    .copied()
                    .or_else(|| implied_growth(resolved, y)),
                lending_rate_pct: raw.lending.get(&y).copied(),
                source: slot.map(|(_, t)| *t),
            }
        })
        .collect()
}

fn implied_growth(resolved: &Resolved, y: Year) -> Option<f64> {
    let (level, _) = resolved.get(&y)?;
    let (prev, _) = resolved.get(&(y - 1))?;
    if *prev == 0.0 {
        return None;
    }
    Some((level / prev - 1.0) * 100.0)
}
