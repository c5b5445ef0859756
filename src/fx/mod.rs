//! FX resolution: a full-range USD-per-unit series per currency.
//!
//! Resolution order per currency:
//!
//! 1. `fixed` — the reporting domestic currency (USD) is 1.0 for every year,
//!    no provider call
//! 2. market quotes (Yahoo), direct pair then inverse pair
//! 3. official rate (World Bank, LCU per USD for a representative country),
//!    inverted
//!
//! Whichever source wins, the sparse annual observations are filled over the
//! whole range by ascending-year interpolation with flat edge extension. A
//! currency with no data at all is recorded as `unavailable` with an empty
//! series rather than failing the run.

use crate::data::quotes::QuoteClient;
use crate::data::worldbank::WorldBankClient;
use crate::domain::{AnnualSeries, FxResolution, Registry, Year};
use crate::math::fill_years;

pub struct FxResolver<'a> {
    quotes: &'a QuoteClient,
    worldbank: &'a WorldBankClient,
    registry: &'a Registry,
}

impl<'a> FxResolver<'a> {
    pub fn new(
        quotes: &'a QuoteClient,
        worldbank: &'a WorldBankClient,
        registry: &'a Registry,
    ) -> Self {
        Self {
            quotes,
            worldbank,
            registry,
        }
    }

    pub fn resolve(&self, currency: &str, start: Year, end: Year) -> FxResolution {
        if currency == "USD" {
            return fixed_unit(start, end);
        }

        if let Some((annual, method)) = self.quotes.annual_usd_per(currency, start, end) {
            log::info!("fx {currency}: resolved via {method}");
            return FxResolution {
                usd_per_unit: densify(&annual, start, end),
                method,
            };
        }

        if let Some(ref_area) = self.registry.fx_ref(currency) {
            let indicator = self.registry.indicators.fx_official;
            let lcu_per_usd = self
                .worldbank
                .fetch_series(ref_area, indicator, start, end);
            let usd_per_unit = invert_positive(&lcu_per_usd);
            if !usd_per_unit.is_empty() {
                let method = format!("worldbank:{indicator}:{ref_area}");
                log::info!("fx {currency}: market quotes empty, resolved via {method}");
                return FxResolution {
                    usd_per_unit: densify(&usd_per_unit, start, end),
                    method,
                };
            }
        }

        log::warn!("fx {currency}: no market or official data, leaving unavailable");
        FxResolution {
            usd_per_unit: AnnualSeries::new(),
            method: "unavailable".to_string(),
        }
    }
}

/// Trivial 1.0 series for the reporting currency.
pub fn fixed_unit(start: Year, end: Year) -> FxResolution {
    FxResolution {
        usd_per_unit: (start..=end).map(|y| (y, 1.0)).collect(),
        method: "fixed".to_string(),
    }
}

/// Invert an LCU-per-USD series into USD-per-LCU, dropping non-positive
/// observations.
pub fn invert_positive(series: &AnnualSeries) -> AnnualSeries {
    series
        .iter()
        .filter(|(_, v)| **v > 0.0 && v.is_finite())
        .map(|(y, v)| (*y, 1.0 / v))
        .collect()
}

/// Fill a non-empty sparse series over the full range.
fn densify(series: &AnnualSeries, start: Year, end: Year) -> AnnualSeries {
    fill_years(series, start, end)
        .into_iter()
        .filter_map(|(y, v)| v.map(|v| (y, v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_unit_covers_every_year() {
        let fx = fixed_unit(1980, 1983);
        assert_eq!(fx.method, "fixed");
        assert_eq!(fx.usd_per_unit.len(), 4);
        assert!(fx.usd_per_unit.values().all(|v| *v == 1.0));
    }

    #[test]
    fn invert_positive_inverts_and_filters() {
        let lcu_per_usd: AnnualSeries =
            [(1990, 2.0), (1991, 0.0), (1992, -3.0), (1993, 4.0)].into_iter().collect();
        let inverted = invert_positive(&lcu_per_usd);
        assert_eq!(inverted.get(&1990), Some(&0.5));
        assert_eq!(inverted.get(&1993), Some(&0.25));
        assert!(!inverted.contains_key(&1991));
        assert!(!inverted.contains_key(&1992));
    }

    #[test]
    fn densify_interpolates_and_extends() {
        let sparse: AnnualSeries = [(1992, 1.0), (1994, 3.0)].into_iter().collect();
        let dense = densify(&sparse, 1990, 1996);
        assert_eq!(dense.len(), 7);
        assert_eq!(dense.get(&1990), Some(&1.0)); // leading flat copy
        assert_eq!(dense.get(&1993), Some(&2.0)); // interpolated
        assert_eq!(dense.get(&1996), Some(&3.0)); // trailing flat copy
    }
}
