//! Growth-chain filling: extend a partially known level series through a
//! companion growth-rate series (percent change year-over-year).
//!
//! Forward and backward passes alternate until a full round makes no
//! progress. The unresolved-year count is non-increasing and bounded, so the
//! fixpoint terminates on its own; a span-sized cap bounds the loop anyway.

use crate::domain::{AnnualSeries, SourceTag, Year};
use crate::recon::Resolved;

/// Run forward/backward chaining to fixpoint. Returns the number of years
/// resolved.
pub fn chain_growth(
    resolved: &mut Resolved,
    growth: &AnnualSeries,
    start: Year,
    end: Year,
) -> usize {
    if start > end {
        return 0;
    }

    let mut total = 0;
    let span = (end - start + 1) as usize;
    for _ in 0..span {
        let progressed = forward_pass(resolved, growth, start, end)
            + backward_pass(resolved, growth, start, end);
        if progressed == 0 {
            break;
        }
        total += progressed;
    }
    total
}

/// `level[y] = level[y-1] * (1 + rate[y]/100)` for ascending unresolved `y`.
fn forward_pass(resolved: &mut Resolved, growth: &AnnualSeries, start: Year, end: Year) -> usize {
    let mut progressed = 0;
    for y in start..=end {
        if resolved.contains_key(&y) {
            continue;
        }
        let Some((prev, _)) = resolved.get(&(y - 1)).copied() else {
            continue;
        };
        let Some(rate) = growth.get(&y) else { continue };
        resolved.insert(y, (prev * (1.0 + rate / 100.0), SourceTag::GrowthChained));
        progressed += 1;
    }
    progressed
}

/// `level[y] = level[y+1] / (1 + rate[y+1]/100)` for descending unresolved
/// `y`; a year whose divisor is exactly zero is left for interpolation.
fn backward_pass(resolved: &mut Resolved, growth: &AnnualSeries, start: Year, end: Year) -> usize {
    let mut progressed = 0;
    for y in (start..=end).rev() {
        if resolved.contains_key(&y) {
            continue;
        }
        let Some((next, _)) = resolved.get(&(y + 1)).copied() else {
            continue;
        };
        let Some(rate) = growth.get(&(y + 1)) else {
            continue;
        };
        let divisor = 1.0 + rate / 100.0;
        if divisor == 0.0 {
            continue;
        }
        resolved.insert(y, (next / divisor, SourceTag::GrowthChained));
        progressed += 1;
    }
    progressed
}
