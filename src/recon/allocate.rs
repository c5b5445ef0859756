//! Synthetic allocation from the shared regional aggregate.
//!
//! Monetary-union members stop reporting national money aggregates, but the
//! union-wide aggregate and every member's GDP remain available. A member's
//! missing level is apportioned from the aggregate by GDP share, then scaled
//! by the cross-entity global calibration median. The global-scale multiplier
//! is a smoothing heuristic inherited from the upstream dataset, not a
//! statistically derived correction.

use crate::data::AggregateRaw;
use crate::domain::{AnnualSeries, SourceTag, Year};
use crate::recon::calibrate::scale_factor;
use crate::recon::Resolved;

/// The aggregate's own merged direct level series: primary preferred,
/// calibrated secondary as fallback.
pub fn aggregate_direct_levels(aggregate: &AggregateRaw) -> AnnualSeries {
    let scale = scale_factor(&aggregate.primary, &aggregate.secondary);
    let mut out = aggregate.primary.clone();
    for (y, v) in &aggregate.secondary {
        out.entry(*y).or_insert(v * scale);
    }
    out
}

/// Allocated level for one year, or `None` when the preconditions fail.
pub fn allocate_year(
    aggregate_level: f64,
    entity_gdp: f64,
    aggregate_gdp: f64,
    global_scale: f64,
) -> Option<f64> {
    if !(aggregate_gdp > 0.0 && aggregate_gdp.is_finite()) {
        return None;
    }
    if !(entity_gdp.is_finite() && aggregate_level.is_finite()) {
        return None;
    }
    Some(aggregate_level * (entity_gdp / aggregate_gdp) * global_scale)
}

/// Apply allocation to every still-unresolved year. Returns the number of
/// years resolved.
pub fn allocate(
    resolved: &mut Resolved,
    aggregate_levels: &AnnualSeries,
    entity_gdp: &AnnualSeries,
    aggregate_gdp: &AnnualSeries,
    global_scale: f64,
    start: Year,
    end: Year,
) -> usize {
    let mut progressed = 0;
    for y in start..=end {
        if resolved.contains_key(&y) {
            continue;
        }
        let Some(level) = aggregate_levels.get(&y) else {
            continue;
        };
        let Some(gdp) = entity_gdp.get(&y) else { continue };
        let Some(agg_gdp) = aggregate_gdp.get(&y) else {
            continue;
        };
        if let Some(allocated) = allocate_year(*level, *gdp, *agg_gdp, global_scale) {
            resolved.insert(y, (allocated, SourceTag::SyntheticAllocated));
            progressed += 1;
        }
    }
    progressed
}
