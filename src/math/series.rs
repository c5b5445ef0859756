//! Annual-series numeric kernels.
//!
//! The reconciliation stages and the FX resolver share the same filling rule:
//!
//! - internal gaps: linear interpolation between the nearest known neighbors
//! - leading/trailing gaps: flat copy of the nearest known value
//! - empty input: every requested year stays unresolved (`None`)
//!
//! Numerical notes:
//! - interpolation weights are computed in `f64` from integer year distances,
//!   so known years are reproduced exactly
//! - observations outside the requested range are ignored, matching the
//!   reindex-then-interpolate behavior of the upstream dataset

use std::collections::BTreeMap;

use crate::domain::{AnnualSeries, Year};

/// Fill `[start, end]` from a sparse series.
///
/// Returns one entry per requested year in ascending order. Known years keep
/// their value; gaps are interpolated/extended; an empty (in-range) input
/// yields `None` for every year.
pub fn fill_years(series: &AnnualSeries, start: Year, end: Year) -> Vec<(Year, Option<f64>)> {
    let known: Vec<(Year, f64)> = series
        .range(start..=end)
        .map(|(y, v)| (*y, *v))
        .collect();

    if known.is_empty() {
        return (start..=end).map(|y| (y, None)).collect();
    }

    let mut out = Vec::with_capacity((end - start + 1) as usize);
    for y in start..=end {
        out.push((y, Some(value_at(&known, y))));
    }
    out
}

/// Interpolated/extended value at `y` given ascending known points.
///
/// Callers guarantee `known` is non-empty.
fn value_at(known: &[(Year, f64)], y: Year) -> f64 {
    let first = known[0];
    let last = known[known.len() - 1];

    if y <= first.0 {
        return first.1;
    }
    if y >= last.0 {
        return last.1;
    }

    // Nearest neighbors around y. `partition_point` gives the first known
    // year strictly greater than y.
    let hi = known.partition_point(|(ky, _)| *ky <= y);
    let (y1, v1) = known[hi - 1];
    let (y2, v2) = known[hi];
    if y1 == y {
        return v1;
    }

    let w = f64::from(y - y1) / f64::from(y2 - y1);
    v1 + (v2 - v1) * w
}

/// Median of a slice; `None` when empty.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

/// Average sub-annual observations into one value per year.
///
/// Non-finite and non-positive observations are dropped first; FX quotes and
/// official rates are meaningful only when strictly positive.
pub fn annual_mean(observations: &[(Year, f64)]) -> AnnualSeries {
    let mut sums: BTreeMap<Year, (f64, u32)> = BTreeMap::new();
    for (y, v) in observations {
        if !v.is_finite() || *v <= 0.0 {
            continue;
        }
        let slot = sums.entry(*y).or_insert((0.0, 0));
        slot.0 += v;
        slot.1 += 1;
    }
    sums.into_iter()
        .map(|(y, (sum, n))| (y, sum / f64::from(n)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(pairs: &[(Year, f64)]) -> AnnualSeries {
        pairs.iter().copied().collect()
    }

    #[test]
    fn fill_interpolates_internal_gaps_linearly() {
        let s = series(&[(1990, 100.0), (2000, 200.0)]);
        let filled = fill_years(&s, 1990, 2000);
        assert_eq!(filled[0], (1990, Some(100.0)));
        assert_eq!(filled[5], (1995, Some(150.0)));
        assert_eq!(filled[10], (2000, Some(200.0)));
        // 1991..1999 step evenly by 10.
        assert!((filled[1].1.unwrap() - 110.0).abs() < 1e-12);
        assert!((filled[9].1.unwrap() - 190.0).abs() < 1e-12);
    }

    #[test]
    fn fill_extends_edges_flat() {
        let s = series(&[(1990, 100.0), (2000, 200.0)]);
        let filled = fill_years(&s, 1985, 2005);
        for (y, v) in &filled {
            if *y < 1990 {
                assert_eq!(*v, Some(100.0), "year {y}");
            }
            if *y > 2000 {
                assert_eq!(*v, Some(200.0), "year {y}");
            }
        }
    }

    #[test]
    fn fill_of_empty_series_is_all_none() {
        let filled = fill_years(&AnnualSeries::new(), 1980, 1984);
        assert_eq!(filled.len(), 5);
        assert!(filled.iter().all(|(_, v)| v.is_none()));
    }

    #[test]
    fn fill_ignores_out_of_range_observations() {
        let s = series(&[(1970, 1.0), (1995, 50.0)]);
        let filled = fill_years(&s, 1990, 2000);
        // Only 1995 is in range, so everything is a flat copy of it.
        assert!(filled.iter().all(|(_, v)| *v == Some(50.0)));
    }

    #[test]
    fn fill_single_point_is_flat_everywhere() {
        let s = series(&[(1999, 42.0)]);
        let filled = fill_years(&s, 1995, 2003);
        assert!(filled.iter().all(|(_, v)| *v == Some(42.0)));
    }

    #[test]
    fn median_odd_even_and_empty() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn annual_mean_averages_and_filters() {
        let obs = [
            (1999, 1.0),
            (1999, 3.0),
            (2000, 2.0),
            (2000, -5.0),   // dropped: non-positive
            (2001, f64::NAN), // dropped: non-finite
        ];
        let annual = annual_mean(&obs);
        assert_eq!(annual.get(&1999), Some(&2.0));
        assert_eq!(annual.get(&2000), Some(&2.0));
        assert!(!annual.contains_key(&2001));
    }
}
