//! Built-in offline fixtures (`m2 build --offline`).
//!
//! Deterministic approximations of the real upstream series, compact enough
//! to live in code: each country is a 1980 base level compounded at a rough
//! historical growth rate, with per-country availability windows shaped to
//! match how the real providers behave (euro members lose national series
//! after 1998, some countries report sparsely, one has no secondary source).
//!
//! This exercises the full reconciliation path without network access, and
//! mirrors the hardcoded approximate tables the original tracker served when
//! no provider was reachable.

use std::collections::BTreeMap;

use crate::data::{AggregateRaw, CountryRaw, RawInputs};
use crate::domain::{AnnualSeries, BuildConfig, FxResolution, Registry, Year};
use crate::fx::fixed_unit;
use crate::math::fill_years;

/// Last year covered by the fixtures.
pub const FIXTURE_END: Year = 2023;

const FIXTURE_START: Year = 1980;

/// Secondary-source availability window (the older M2 definition was
/// discontinued around 2000 for most reporters; GB keeps it current).
const SECONDARY_END: Year = 2000;

/// Euro members stop reporting national money aggregates after 1998.
const EURO_CUTOVER: Year = 1998;

struct CountryFixture {
    code: &'static str,
    /// Level at 1980 (billions of LCU) and average annual growth (percent).
    level_base: f64,
    level_growth: f64,
    /// GDP at 1980 (billions of LCU) and average annual growth (percent).
    gdp_base: f64,
    gdp_growth: f64,
    /// Primary availability: (first, last, step).
    primary: (Year, Year, Year),
    /// Definitional ratio primary/secondary; `None` means no secondary
    /// source at all (exercises the 1.0 calibration fallback).
    secondary_ratio: Option<f64>,
    /// Last year of secondary availability.
    secondary_end: Year,
    /// Growth-rate series availability; `None` means no growth source.
    growth_years: Option<(Year, Year)>,
    /// Flat lending rate, where reported.
    lending: Option<f64>,
}

const COUNTRY_FIXTURES: [CountryFixture; 10] = [
    CountryFixture {
        code: "US",
        level_base: 1600.0,
        level_growth: 6.0,
        gdp_base: 2860.0,
        gdp_growth: 5.5,
        primary: (FIXTURE_START, FIXTURE_END, 1),
        secondary_ratio: Some(1.02),
        secondary_end: SECONDARY_END,
        growth_years: Some((FIXTURE_START, FIXTURE_END)),
        lending: Some(8.0),
    },
    CountryFixture {
        code: "CN",
        level_base: 200.0,
        level_growth: 15.0,
        gdp_base: 450.0,
        gdp_growth: 13.0,
        // Levels start at 1985; the growth series reaches further back, so
        // the early years are backward-chained.
        primary: (1985, FIXTURE_END, 1),
        secondary_ratio: Some(1.05),
        secondary_end: SECONDARY_END,
        growth_years: Some((1981, FIXTURE_END)),
        lending: Some(6.0),
    },
    CountryFixture {
        code: "JP",
        level_base: 200_000.0,
        level_growth: 4.0,
        gdp_base: 250_000.0,
        gdp_growth: 3.0,
        primary: (FIXTURE_START, FIXTURE_END, 1),
        secondary_ratio: Some(1.01),
        secondary_end: SECONDARY_END,
        growth_years: Some((FIXTURE_START, FIXTURE_END)),
        lending: Some(2.5),
    },
    CountryFixture {
        code: "DE",
        level_base: 800.0,
        level_growth: 5.0,
        gdp_base: 1500.0,
        gdp_growth: 4.0,
        primary: (FIXTURE_START, EURO_CUTOVER, 1),
        secondary_ratio: Some(1.03),
        secondary_end: EURO_CUTOVER,
        growth_years: Some((FIXTURE_START, EURO_CUTOVER)),
        lending: Some(7.0),
    },
    CountryFixture {
        code: "IN",
        level_base: 1500.0,
        level_growth: 13.0,
        gdp_base: 2000.0,
        gdp_growth: 12.0,
        // Primary stops at 2015; the growth series keeps going, so the tail
        // is growth-chained.
        primary: (FIXTURE_START, 2015, 1),
        secondary_ratio: Some(1.04),
        secondary_end: SECONDARY_END,
        growth_years: Some((FIXTURE_START, FIXTURE_END)),
        lending: Some(11.0),
    },
    CountryFixture {
        code: "GB",
        level_base: 300.0,
        level_growth: 7.0,
        gdp_base: 230.0,
        gdp_growth: 6.0,
        // Primary stops at 2010 but the secondary source stays current, so
        // the tail is direct-secondary-scaled.
        primary: (FIXTURE_START, 2010, 1),
        secondary_ratio: Some(1.03),
        secondary_end: FIXTURE_END,
        growth_years: Some((FIXTURE_START, FIXTURE_END)),
        lending: Some(6.5),
    },
    CountryFixture {
        code: "FR",
        level_base: 900.0,
        level_growth: 5.0,
        gdp_base: 1300.0,
        gdp_growth: 4.0,
        primary: (FIXTURE_START, EURO_CUTOVER, 1),
        secondary_ratio: Some(1.03),
        secondary_end: EURO_CUTOVER,
        growth_years: Some((FIXTURE_START, EURO_CUTOVER)),
        lending: Some(7.5),
    },
    CountryFixture {
        code: "IT",
        level_base: 400.0,
        level_growth: 6.0,
        gdp_base: 900.0,
        gdp_growth: 4.0,
        primary: (FIXTURE_START, EURO_CUTOVER, 1),
        secondary_ratio: Some(1.03),
        secondary_end: EURO_CUTOVER,
        growth_years: Some((FIXTURE_START, EURO_CUTOVER)),
        lending: Some(9.0),
    },
    CountryFixture {
        code: "BR",
        level_base: 10.0,
        level_growth: 12.0,
        gdp_base: 15.0,
        gdp_growth: 11.0,
        // Sparse five-yearly reporting and no growth source: the gaps are
        // interpolated.
        primary: (FIXTURE_START, 2020, 5),
        secondary_ratio: None,
        secondary_end: SECONDARY_END,
        growth_years: None,
        lending: None,
    },
    CountryFixture {
        code: "CA",
        level_base: 140.0,
        level_growth: 7.0,
        gdp_base: 310.0,
        gdp_growth: 6.0,
        primary: (FIXTURE_START, FIXTURE_END, 1),
        secondary_ratio: Some(1.02),
        secondary_end: SECONDARY_END,
        growth_years: Some((FIXTURE_START, FIXTURE_END)),
        lending: Some(9.0),
    },
];

/// Euro-area aggregate: exists from the euro launch onwards.
const AGGREGATE_START: Year = 1999;
const AGGREGATE_LEVEL_BASE: f64 = 4000.0;
const AGGREGATE_LEVEL_GROWTH: f64 = 5.0;
const AGGREGATE_GDP_BASE: f64 = 9000.0;
const AGGREGATE_GDP_GROWTH: f64 = 4.0;

/// Approximate USD-per-unit anchor quotes; interpolated over the range.
const FX_ANCHORS: [(&str, &[(Year, f64)]); 7] = [
    ("EUR", &[(1999, 1.07), (2008, 1.47), (2015, 1.11), (2023, 1.08)]),
    ("CNY", &[(1985, 0.34), (1995, 0.12), (2010, 0.148), (2023, 0.141)]),
    ("JPY", &[(1980, 0.0044), (1995, 0.0107), (2023, 0.0071)]),
    ("GBP", &[(1980, 2.33), (2008, 1.85), (2023, 1.24)]),
    ("INR", &[(1980, 0.127), (2000, 0.0222), (2023, 0.0121)]),
    ("BRL", &[(1995, 1.09), (2010, 0.568), (2023, 0.20)]),
    ("CAD", &[(1980, 0.855), (2002, 0.637), (2023, 0.741)]),
];

/// Build a complete [`RawInputs`] from fixtures, shaped like a real gather.
pub fn offline_inputs(registry: &Registry, config: &BuildConfig) -> RawInputs {
    let (start, end) = (config.start_year, config.end_year);

    let mut countries = BTreeMap::new();
    for fixture in &COUNTRY_FIXTURES {
        countries.insert(fixture.code.to_string(), fixture.build(start, end));
    }

    let aggregate = AggregateRaw {
        primary: compound_series(
            AGGREGATE_LEVEL_BASE,
            AGGREGATE_LEVEL_GROWTH,
            AGGREGATE_START,
            clamp(AGGREGATE_START, start, end),
            end.min(FIXTURE_END),
            1,
        ),
        secondary: AnnualSeries::new(),
        gdp: compound_series(
            AGGREGATE_GDP_BASE,
            AGGREGATE_GDP_GROWTH,
            AGGREGATE_START,
            clamp(AGGREGATE_START, start, end),
            end.min(FIXTURE_END),
            1,
        ),
    };

    let mut fx = BTreeMap::new();
    for currency in registry.currencies() {
        fx.insert(currency.to_string(), offline_fx(currency, start, end));
    }

    RawInputs {
        countries,
        aggregate,
        fx,
    }
}

impl CountryFixture {
    fn build(&self, start: Year, end: Year) -> CountryRaw {
        let (p_from, p_to, p_step) = self.primary;
        let primary = compound_series(
            self.level_base,
            self.level_growth,
            FIXTURE_START,
            clamp(p_from, start, end),
            p_to.min(end),
            p_step,
        );

        let secondary = match self.secondary_ratio {
            Some(ratio) => compound_series(
                self.level_base / ratio,
                self.level_growth,
                FIXTURE_START,
                clamp(p_from, start, end),
                self.secondary_end.min(end),
                1,
            ),
            None => AnnualSeries::new(),
        };

        let growth = match self.growth_years {
            Some((from, to)) => (clamp(from, start, end)..=to.min(end))
                .map(|y| (y, self.level_growth))
                .collect(),
            None => AnnualSeries::new(),
        };

        let lending = match self.lending {
            Some(rate) => (start.max(FIXTURE_START)..=end.min(FIXTURE_END))
                .map(|y| (y, rate))
                .collect(),
            None => AnnualSeries::new(),
        };

        let gdp = compound_series(
            self.gdp_base,
            self.gdp_growth,
            FIXTURE_START,
            start.max(FIXTURE_START),
            end.min(FIXTURE_END),
            1,
        );

        CountryRaw {
            primary,
            secondary,
            growth,
            lending,
            gdp,
        }
    }
}

fn offline_fx(currency: &str, start: Year, end: Year) -> FxResolution {
    if currency == "USD" {
        return fixed_unit(start, end);
    }
    let anchors = FX_ANCHORS
        .iter()
        .find(|(ccy, _)| *ccy == currency)
        .map(|(_, anchors)| *anchors)
        .unwrap_or(&[]);
    let sparse: AnnualSeries = anchors.iter().copied().collect();
    let usd_per_unit = fill_years(&sparse, start, end)
        .into_iter()
        .filter_map(|(y, v)| v.map(|v| (y, v)))
        .collect();
    FxResolution {
        usd_per_unit,
        method: "sample".to_string(),
    }
}

/// `base * (1 + pct/100)^(y - base_year)` over `[from, to]` at `step`.
fn compound_series(
    base: f64,
    pct: f64,
    base_year: Year,
    from: Year,
    to: Year,
    step: Year,
) -> AnnualSeries {
    let mut out = AnnualSeries::new();
    if from > to {
        return out;
    }
    let factor = 1.0 + pct / 100.0;
    let mut y = from;
    while y <= to {
        out.insert(y, base * factor.powi(y - base_year));
        y += step.max(1);
    }
    out
}

fn clamp(preferred: Year, start: Year, end: Year) -> Year {
    preferred.max(start).min(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(start: Year, end: Year) -> BuildConfig {
        BuildConfig {
            start_year: start,
            end_year: end,
            jobs: 1,
            offline: true,
            out: PathBuf::from("out.json"),
            summary: None,
            strict: false,
        }
    }

    #[test]
    fn offline_inputs_cover_every_country_and_currency() {
        let registry = Registry::builtin();
        let raw = offline_inputs(&registry, &config(1980, 2023));
        assert_eq!(raw.countries.len(), registry.countries.len());
        for c in &registry.countries {
            assert!(raw.countries.contains_key(c.code), "missing {}", c.code);
        }
        for ccy in registry.currencies() {
            let fx = raw.fx.get(ccy).unwrap();
            assert_eq!(fx.usd_per_unit.len(), 44, "fx {ccy} not dense");
        }
    }

    #[test]
    fn fixture_windows_shape_the_tiers() {
        let registry = Registry::builtin();
        let raw = offline_inputs(&registry, &config(1980, 2023));

        // Euro members have no national data after the cutover.
        let de = &raw.countries["DE"];
        assert!(de.primary.contains_key(&1998));
        assert!(!de.primary.contains_key(&1999));
        assert!(de.gdp.contains_key(&2023));

        // India's primary stops while its growth series continues.
        let india = &raw.countries["IN"];
        assert!(india.primary.contains_key(&2015));
        assert!(!india.primary.contains_key(&2016));
        assert!(india.growth.contains_key(&2023));

        // Brazil reports five-yearly with no growth source.
        let br = &raw.countries["BR"];
        assert!(br.primary.contains_key(&1985));
        assert!(!br.primary.contains_key(&1986));
        assert!(br.growth.is_empty());
        assert!(br.secondary.is_empty());

        // The aggregate exists only from the euro launch.
        assert!(!raw.aggregate.primary.contains_key(&1998));
        assert!(raw.aggregate.primary.contains_key(&1999));
    }

    #[test]
    fn secondary_ratio_is_recoverable_from_fixtures() {
        let registry = Registry::builtin();
        let raw = offline_inputs(&registry, &config(1980, 2023));
        let us = &raw.countries["US"];
        for y in 1980..=2000 {
            let p = us.primary[&y];
            let s = us.secondary[&y];
            assert!((p / s - 1.02).abs() < 1e-9, "year {y}");
        }
    }

    #[test]
    fn compound_series_respects_step_and_base_year() {
        let s = compound_series(100.0, 10.0, 1980, 1980, 1990, 5);
        assert_eq!(s.len(), 3);
        assert!((s[&1980] - 100.0).abs() < 1e-12);
        assert!((s[&1985] - 100.0 * 1.1f64.powi(5)).abs() < 1e-9);
        assert!((s[&1990] - 100.0 * 1.1f64.powi(10)).abs() < 1e-9);
    }
}
