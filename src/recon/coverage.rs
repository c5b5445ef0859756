//! Coverage evaluation: how far in time the merged dataset can be trusted.
//!
//! A (entity, year) counts as direct-covered when its tag is one of the
//! non-derived tiers (direct-primary, direct-secondary-scaled,
//! synthetic-allocated). The final end year is the latest year where enough
//! entities are direct-covered; everything after it is dropped by a pure
//! filter, never recomputed.

use std::collections::BTreeMap;

use crate::domain::Year;
use crate::recon::Resolved;

/// Absolute floor on the per-year direct-covered entity count.
pub const MIN_DIRECT_ENTITIES: usize = 5;

/// Fractional direct-coverage requirement across entities.
pub const DIRECT_SHARE: f64 = 0.6;

/// Required direct-covered entities per retained year:
/// `max(5, ceil(0.6 * entityCount))`.
pub fn required_direct(entity_count: usize) -> usize {
    let share = (DIRECT_SHARE * entity_count as f64).ceil() as usize;
    share.max(MIN_DIRECT_ENTITIES)
}

/// Entities direct-covered in `year`.
pub fn direct_count(tagged: &BTreeMap<String, Resolved>, year: Year) -> usize {
    tagged
        .values()
        .filter(|resolved| {
            resolved
                .get(&year)
                .map(|(_, tag)| tag.is_direct())
                .unwrap_or(false)
        })
        .count()
}

/// Latest year in `[start, provisional_end]` whose direct-covered count
/// meets `required`; `start` when no year qualifies.
pub fn final_end_year(
    tagged: &BTreeMap<String, Resolved>,
    start: Year,
    provisional_end: Year,
    required: usize,
) -> Year {
    for y in (start..=provisional_end).rev() {
        if direct_count(tagged, y) >= required {
            return y;
        }
    }
    log::warn!(
        "no year in {start}..={provisional_end} reaches {required} direct-covered entities; \
         truncating to the start year"
    );
    start
}

/// Drop every resolved year after `end`. Pure filter.
pub fn truncate(tagged: &mut BTreeMap<String, Resolved>, end: Year) {
    for resolved in tagged.values_mut() {
        resolved.retain(|y, _| *y <= end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceTag;

    fn entity(years: &[(Year, SourceTag)]) -> Resolved {
        years.iter().map(|(y, t)| (*y, (1.0, *t))).collect()
    }

    #[test]
    fn required_direct_applies_floor_and_share() {
        assert_eq!(required_direct(3), 5); // floor dominates
        assert_eq!(required_direct(10), 6); // ceil(6.0)
        assert_eq!(required_direct(11), 7); // ceil(6.6)
        assert_eq!(required_direct(20), 12);
    }

    #[test]
    fn derived_tiers_do_not_count_as_direct() {
        let mut tagged = BTreeMap::new();
        tagged.insert("A".to_string(), entity(&[(2000, SourceTag::DirectPrimary)]));
        tagged.insert("B".to_string(), entity(&[(2000, SourceTag::SyntheticAllocated)]));
        tagged.insert("C".to_string(), entity(&[(2000, SourceTag::GrowthChained)]));
        tagged.insert("D".to_string(), entity(&[(2000, SourceTag::Interpolated)]));
        assert_eq!(direct_count(&tagged, 2000), 2);
    }

    #[test]
    fn final_end_year_is_latest_qualifying_year() {
        // Two entities direct through 2010, only one through 2015.
        let mut tagged = BTreeMap::new();
        let full: Vec<(Year, SourceTag)> =
            (2000..=2015).map(|y| (y, SourceTag::DirectPrimary)).collect();
        let short: Vec<(Year, SourceTag)> =
            (2000..=2010).map(|y| (y, SourceTag::DirectPrimary)).collect();
        tagged.insert("A".to_string(), entity(&full));
        tagged.insert("B".to_string(), entity(&short));

        assert_eq!(final_end_year(&tagged, 2000, 2015, 2), 2010);
        assert_eq!(final_end_year(&tagged, 2000, 2015, 1), 2015);
    }

    #[test]
    fn raising_the_threshold_never_raises_the_end_year() {
        let mut tagged = BTreeMap::new();
        for (i, last) in [2005, 2010, 2015].iter().enumerate() {
            let years: Vec<(Year, SourceTag)> =
                (2000..=*last).map(|y| (y, SourceTag::DirectPrimary)).collect();
            tagged.insert(format!("E{i}"), entity(&years));
        }

        let mut prev = Year::MAX;
        for required in 1..=5 {
            let end = final_end_year(&tagged, 2000, 2015, required);
            assert!(end <= prev, "required={required}: {end} > {prev}");
            prev = end;
        }
    }

    #[test]
    fn no_qualifying_year_falls_back_to_start() {
        let mut tagged = BTreeMap::new();
        tagged.insert("A".to_string(), entity(&[(2000, SourceTag::Interpolated)]));
        assert_eq!(final_end_year(&tagged, 2000, 2005, 1), 2000);
    }

    #[test]
    fn truncate_is_a_pure_filter() {
        let mut tagged = BTreeMap::new();
        let years: Vec<(Year, SourceTag)> =
            (2000..=2010).map(|y| (y, SourceTag::DirectPrimary)).collect();
        tagged.insert("A".to_string(), entity(&years));

        truncate(&mut tagged, 2004);
        let a = &tagged["A"];
        assert_eq!(a.len(), 5);
        assert!(a.contains_key(&2004));
        assert!(!a.contains_key(&2005));
        // Retained values are untouched.
        assert_eq!(a[&2000], (1.0, SourceTag::DirectPrimary));
    }
}
