//! Raw data acquisition: provider clients, the parallel gather, and the
//! offline fixture provider.
//!
//! Everything downstream of this module is a pure function over a fully
//! gathered [`RawInputs`]; the join barrier lives here.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::domain::{AnnualSeries, BuildConfig, FxResolution, Registry};
use crate::error::AppError;
use crate::fx::FxResolver;

pub mod quotes;
pub mod sample;
pub mod worldbank;

pub use quotes::QuoteClient;
pub use worldbank::WorldBankClient;

/// Raw sparse series for one country, one per indicator.
#[derive(Debug, Clone, Default)]
pub struct CountryRaw {
    pub primary: AnnualSeries,
    pub secondary: AnnualSeries,
    pub growth: AnnualSeries,
    pub lending: AnnualSeries,
    pub gdp: AnnualSeries,
}

/// Raw sparse series for the shared regional aggregate.
#[derive(Debug, Clone, Default)]
pub struct AggregateRaw {
    pub primary: AnnualSeries,
    pub secondary: AnnualSeries,
    pub gdp: AnnualSeries,
}

/// Everything a reconciliation run consumes. Immutable once gathered.
#[derive(Debug, Clone)]
pub struct RawInputs {
    pub countries: BTreeMap<String, CountryRaw>,
    pub aggregate: AggregateRaw,
    pub fx: BTreeMap<String, FxResolution>,
}

/// Fetch every (area, indicator) series and resolve every currency, on a
/// bounded worker pool sized by `config.jobs`.
///
/// Individual fetches degrade to empty series on failure; only local setup
/// problems (e.g. the HTTP client or the pool itself) are errors here.
pub fn fetch_all(registry: &Registry, config: &BuildConfig) -> Result<RawInputs, AppError> {
    let worldbank = WorldBankClient::new()?;
    let quotes = QuoteClient::new()?;
    let (start, end) = (config.start_year, config.end_year);
    let ind = registry.indicators;

    let mut tasks: Vec<(String, &'static str)> = Vec::new();
    for c in &registry.countries {
        for indicator in [
            ind.level_primary,
            ind.level_secondary,
            ind.growth,
            ind.lending,
            ind.gdp,
        ] {
            tasks.push((c.wb.to_string(), indicator));
        }
    }
    for indicator in [ind.level_primary, ind.level_secondary, ind.gdp] {
        tasks.push((registry.aggregate_area.to_string(), indicator));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs.max(1))
        .build()
        .map_err(|e| AppError::usage(format!("Failed to build fetch pool: {e}")))?;

    log::info!(
        "fetching {} series + {} currencies on {} workers",
        tasks.len(),
        registry.currencies().len(),
        config.jobs.max(1)
    );

    let series: BTreeMap<(String, &'static str), AnnualSeries> = pool.install(|| {
        tasks
            .par_iter()
            .map(|(area, indicator)| {
                let s = worldbank.fetch_series(area, indicator, start, end);
                ((area.clone(), *indicator), s)
            })
            .collect()
    });

    let resolver = FxResolver::new(&quotes, &worldbank, registry);
    let currencies: Vec<&'static str> = registry.currencies().into_iter().collect();
    let fx: BTreeMap<String, FxResolution> = pool.install(|| {
        currencies
            .par_iter()
            .map(|ccy| ((*ccy).to_string(), resolver.resolve(ccy, start, end)))
            .collect()
    });

    let take = |area: &str, indicator: &'static str| -> AnnualSeries {
        series
            .get(&(area.to_string(), indicator))
            .cloned()
            .unwrap_or_default()
    };

    let mut countries = BTreeMap::new();
    for c in &registry.countries {
        countries.insert(
            c.code.to_string(),
            CountryRaw {
                primary: take(c.wb, ind.level_primary),
                secondary: take(c.wb, ind.level_secondary),
                growth: take(c.wb, ind.growth),
                lending: take(c.wb, ind.lending),
                gdp: take(c.wb, ind.gdp),
            },
        );
    }

    let aggregate = AggregateRaw {
        primary: take(registry.aggregate_area, ind.level_primary),
        secondary: take(registry.aggregate_area, ind.level_secondary),
        gdp: take(registry.aggregate_area, ind.gdp),
    };

    Ok(RawInputs {
        countries,
        aggregate,
        fx,
    })
}
