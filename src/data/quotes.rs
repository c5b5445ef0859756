//! Market FX quotes from the Yahoo Finance chart API.
//!
//! For a currency `CCY` we try the direct pair `CCYUSD=X` (already USD per
//! unit) and then the inverse pair `USDCCY=X` (unit per USD, inverted after
//! annual averaging). Monthly closes are averaged into one observation per
//! year; sparse annual output is filled later by the FX resolver.

use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::{AnnualSeries, Year};
use crate::error::AppError;
use crate::math::annual_mean;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const ATTEMPTS: u32 = 3;
const TIMEOUT_SECS: u64 = 30;

pub struct QuoteClient {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl QuoteClient {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            // Yahoo rejects requests without a browser-ish user agent.
            .user_agent("Mozilla/5.0 (compatible; m2-history/0.1)")
            .build()
            .map_err(|e| AppError::usage(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Annual USD-per-unit series for `currency`, or `None` when neither
    /// pair yields any usable observation.
    ///
    /// The second element is the method string recorded in the FX table.
    pub fn annual_usd_per(
        &self,
        currency: &str,
        start: Year,
        end: Year,
    ) -> Option<(AnnualSeries, String)> {
        let tickers = [
            (format!("{currency}USD=X"), false),
            (format!("USD{currency}=X"), true),
        ];

        for (ticker, invert) in tickers {
            let Some(monthly) = self.fetch_monthly_closes(&ticker, start, end) else {
                continue;
            };
            let mut annual = annual_mean(&monthly);
            if invert {
                annual = annual
                    .into_iter()
                    .filter(|(_, v)| *v > 0.0)
                    .map(|(y, v)| (y, 1.0 / v))
                    .collect();
            }
            if !annual.is_empty() {
                return Some((annual, format!("yahoo:{ticker}")));
            }
        }
        None
    }

    /// Monthly closes as (year, close) observations, or `None` after retries.
    fn fetch_monthly_closes(&self, ticker: &str, start: Year, end: Year) -> Option<Vec<(Year, f64)>> {
        for attempt in 1..=ATTEMPTS {
            match self.fetch_chart_once(ticker, start, end) {
                Ok(obs) if obs.is_empty() => {
                    log::debug!("yahoo {ticker}: no observations");
                    return None;
                }
                Ok(obs) => return Some(obs),
                Err(e) => {
                    log::warn!("yahoo {ticker} attempt {attempt}/{ATTEMPTS} failed: {e}");
                    if attempt < ATTEMPTS {
                        std::thread::sleep(Duration::from_millis(1500 * u64::from(attempt)));
                    }
                }
            }
        }
        None
    }

    fn fetch_chart_once(
        &self,
        ticker: &str,
        start: Year,
        end: Year,
    ) -> Result<Vec<(Year, f64)>, AppError> {
        let period1 = year_start_timestamp(start)?;
        let period2 = year_start_timestamp(end + 1)?;

        let resp = self
            .client
            .get(format!("{BASE_URL}/{ticker}"))
            .query(&[
                ("interval", "1mo"),
                ("period1", &period1.to_string()),
                ("period2", &period2.to_string()),
                ("events", "history"),
            ])
            .send()
            .map_err(|e| AppError::data(format!("Quote request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::data(format!(
                "Quote request failed with status {}.",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::data(format!("Failed to read quote response: {e}")))?;
        parse_chart(&body)
    }
}

/// Parse a Yahoo chart payload into (year, close) observations.
///
/// Timestamps and closes are parallel arrays; null closes are skipped.
pub fn parse_chart(body: &str) -> Result<Vec<(Year, f64)>, AppError> {
    let parsed: ChartResponse = serde_json::from_str(body)
        .map_err(|e| AppError::data(format!("Invalid quote payload: {e}")))?;

    let Some(results) = parsed.chart.result else {
        return Ok(Vec::new());
    };
    let Some(result) = results.into_iter().next() else {
        return Ok(Vec::new());
    };
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for (ts, close) in result.timestamp.iter().zip(quote.close.iter()) {
        let Some(v) = close else { continue };
        if !v.is_finite() {
            continue;
        }
        let Some(dt) = DateTime::from_timestamp(*ts, 0) else {
            continue;
        };
        out.push((dt.year(), *v));
    }
    Ok(out)
}

fn year_start_timestamp(year: Year) -> Result<i64, AppError> {
    let date = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| AppError::usage(format!("Year {year} out of calendar range.")))?;
    let dt = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| AppError::usage(format!("Year {year} out of calendar range.")))?;
    Ok(dt.and_utc().timestamp())
}
