//! Residual interpolation: the last-resort tier.
//!
//! Whatever the earlier tiers left unresolved is filled by linear time
//! interpolation between the nearest resolved neighbors, with flat edge
//! extension. An entity with nothing resolved at all keeps every year
//! unresolved; the pipeline surfaces those as explicit coverage gaps.

use crate::domain::{AnnualSeries, SourceTag, Year};
use crate::math::fill_years;
use crate::recon::Resolved;

/// Interpolate/extend into every still-unresolved year. Returns the number
/// of years resolved.
pub fn fill_residual(resolved: &mut Resolved, start: Year, end: Year) -> usize {
    let known: AnnualSeries = resolved.iter().map(|(y, (v, _))| (*y, *v)).collect();
    let filled = fill_years(&known, start, end);

    let mut progressed = 0;
    for (y, value) in filled {
        if resolved.contains_key(&y) {
            continue;
        }
        let Some(v) = value else { continue };
        resolved.insert(y, (v, SourceTag::Interpolated));
        progressed += 1;
    }
    progressed
}
