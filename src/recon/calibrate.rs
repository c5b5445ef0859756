//! Unit/definition scale calibration between the primary and secondary
//! level sources.
//!
//! The two sources conceptually measure the same aggregate but under
//! different definitions (and occasionally different unit conventions). The
//! factor is the median of per-year `primary/secondary` ratios, which is
//! robust to single-year definitional breaks; with too few overlapping
//! observations no correction is applied.

use crate::domain::AnnualSeries;
use crate::math::median;

/// Minimum overlapping strictly-positive years required to calibrate.
pub const MIN_OVERLAP: usize = 5;

/// Scale factor relating secondary-source units to primary-source units.
///
/// Always returns a strictly positive finite value; 1.0 when fewer than
/// [`MIN_OVERLAP`] usable ratios exist.
pub fn scale_factor(primary: &AnnualSeries, secondary: &AnnualSeries) -> f64 {
    let ratios: Vec<f64> = primary
        .iter()
        .filter_map(|(y, p)| {
            let s = secondary.get(y)?;
            if *p > 0.0 && *s > 0.0 {
                Some(p / s)
            } else {
                None
            }
        })
        .collect();

    if ratios.len() < MIN_OVERLAP {
        return 1.0;
    }

    match median(&ratios) {
        Some(m) if m.is_finite() && m > 0.0 => m,
        _ => 1.0,
    }
}

/// Cross-entity global scale: the median of all entity-level factors.
///
/// Entities with no calibratable overlap contribute their neutral 1.0; an
/// empty input yields 1.0. Used by the synthetic allocator for entities that
/// by construction have nothing of their own to calibrate against.
pub fn global_scale<'a>(factors: impl IntoIterator<Item = &'a f64>) -> f64 {
    let values: Vec<f64> = factors.into_iter().copied().collect();
    match median(&values) {
        Some(m) if m.is_finite() && m > 0.0 => m,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(pairs: &[(i32, f64)]) -> AnnualSeries {
        pairs.iter().copied().collect()
    }

    #[test]
    fn exact_constant_factor_is_recovered() {
        let secondary = series(&[
            (1990, 100.0),
            (1991, 110.0),
            (1992, 121.0),
            (1993, 133.0),
            (1994, 146.0),
            (1995, 161.0),
        ]);
        let primary: AnnualSeries = secondary.iter().map(|(y, v)| (*y, v * 2.5)).collect();
        let k = scale_factor(&primary, &secondary);
        assert!((k - 2.5).abs() < 1e-12);
    }

    #[test]
    fn under_five_overlaps_falls_back_to_one() {
        let secondary = series(&[(1990, 100.0), (1991, 110.0), (1992, 121.0), (1993, 133.0)]);
        let primary: AnnualSeries = secondary.iter().map(|(y, v)| (*y, v * 2.5)).collect();
        assert_eq!(scale_factor(&primary, &secondary), 1.0);
    }

    #[test]
    fn non_positive_years_do_not_count_as_overlap() {
        // Five overlapping years, but one has a non-positive observation,
        // leaving only four usable ratios.
        let primary = series(&[
            (1990, 200.0),
            (1991, 220.0),
            (1992, 0.0),
            (1993, 266.0),
            (1994, 292.0),
        ]);
        let secondary = series(&[
            (1990, 100.0),
            (1991, 110.0),
            (1992, 121.0),
            (1993, 133.0),
            (1994, 146.0),
        ]);
        assert_eq!(scale_factor(&primary, &secondary), 1.0);
    }

    #[test]
    fn median_absorbs_a_single_definitional_break() {
        let secondary = series(&[
            (1990, 100.0),
            (1991, 100.0),
            (1992, 100.0),
            (1993, 100.0),
            (1994, 100.0),
            (1995, 100.0),
            (1996, 100.0),
        ]);
        let mut primary: AnnualSeries = secondary.iter().map(|(y, v)| (*y, v * 2.0)).collect();
        primary.insert(1993, 900.0); // one-year break
        let k = scale_factor(&primary, &secondary);
        assert!((k - 2.0).abs() < 1e-12);
    }

    #[test]
    fn global_scale_is_the_median_of_factors() {
        let factors = [1.0, 1.02, 1.03, 1.05, 1.10];
        assert!((global_scale(factors.iter()) - 1.03).abs() < 1e-12);
        assert_eq!(global_scale([].iter()), 1.0);
    }
}
