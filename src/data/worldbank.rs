//! World Bank API integration (primary/secondary levels, growth, lending
//! rate, GDP, and the official-FX fallback all come from here).
//!
//! The contract is deliberately forgiving: a series fetch returns an empty
//! map once retries are exhausted, never an error. A missing upstream series
//! degrades one tier for one area; it must not abort the run.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::{AnnualSeries, Year};
use crate::error::AppError;

const BASE_URL: &str = "https://api.worldbank.org/v2";
const PER_PAGE: usize = 2000;
const ATTEMPTS: u32 = 3;
const TIMEOUT_SECS: u64 = 60;

pub struct WorldBankClient {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct WbRow {
    date: String,
    value: Option<f64>,
}

impl WorldBankClient {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::usage(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Fetch a sparse year→value series for one (area, indicator) pair.
    ///
    /// Returns an empty series after `ATTEMPTS` failed tries; each retry
    /// backs off a little longer than the last.
    pub fn fetch_series(
        &self,
        area: &str,
        indicator: &str,
        start: Year,
        end: Year,
    ) -> AnnualSeries {
        for attempt in 1..=ATTEMPTS {
            match self.fetch_series_once(area, indicator, start, end) {
                Ok(series) => return series,
                Err(e) => {
                    log::warn!(
                        "worldbank {area}/{indicator} attempt {attempt}/{ATTEMPTS} failed: {e}"
                    );
                    if attempt < ATTEMPTS {
                        std::thread::sleep(Duration::from_millis(1500 * u64::from(attempt)));
                    }
                }
            }
        }
        log::warn!("worldbank {area}/{indicator}: retries exhausted, yielding empty series");
        AnnualSeries::new()
    }

    fn fetch_series_once(
        &self,
        area: &str,
        indicator: &str,
        start: Year,
        end: Year,
    ) -> Result<AnnualSeries, AppError> {
        let url = format!("{BASE_URL}/country/{area}/indicator/{indicator}");
        let per_page = PER_PAGE.to_string();
        let date = format!("{start}:{end}");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("format", "json"),
                ("per_page", per_page.as_str()),
                ("date", date.as_str()),
            ])
            .send()
            .map_err(|e| AppError::data(format!("World Bank request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::data(format!(
                "World Bank request failed with status {}.",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::data(format!("Failed to read World Bank response: {e}")))?;

        parse_series(&body)
    }
}

/// Parse a World Bank indicator payload into a sparse annual series.
///
/// The payload is a two-element array: paging metadata, then the rows (or
/// `null` for unknown area/indicator combinations). Rows with a `null` value
/// are skipped.
pub fn parse_series(body: &str) -> Result<AnnualSeries, AppError> {
    let parsed: (serde_json::Value, Option<Vec<WbRow>>) = serde_json::from_str(body)
        .map_err(|e| AppError::data(format!("Invalid World Bank payload: {e}")))?;

    let mut out: BTreeMap<Year, f64> = BTreeMap::new();
    let Some(rows) = parsed.1 else {
        return Ok(out);
    };

    for row in rows {
        let Some(value) = row.value else { continue };
        if !value.is_finite() {
            continue;
        }
        let year: Year = row
            .date
            .parse()
            .map_err(|_| AppError::data(format!("Invalid World Bank date '{}'.", row.date)))?;
        out.insert(year, value);
    }
    Ok(out)
}
