//! Immutable process-wide registry: tracked countries, indicator codes,
//! regional-aggregate membership, FX reference countries, and event-year
//! annotations.
//!
//! The registry is constructed once at startup and passed explicitly into
//! each component; nothing in this project reads ambient global state.

use std::collections::BTreeSet;

use crate::domain::types::{EventNote, SourceRef, Year};

/// World Bank indicator codes used by a run.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorSet {
    /// Broad money, current LCU (primary level source).
    pub level_primary: &'static str,
    /// Money + quasi money, current LCU (secondary level source; older M2
    /// definition, hence the scale calibration).
    pub level_secondary: &'static str,
    /// Broad money growth, annual percent.
    pub growth: &'static str,
    /// Lending interest rate, percent (pass-through attribute).
    pub lending: &'static str,
    /// GDP, current LCU (allocation weight and calibration context).
    pub gdp: &'static str,
    /// Official exchange rate, LCU per USD (FX fallback).
    pub fx_official: &'static str,
}

/// One tracked country.
#[derive(Debug, Clone)]
pub struct CountrySpec {
    pub code: &'static str,
    pub name: &'static str,
    /// World Bank area code.
    pub wb: &'static str,
    pub currency: &'static str,
    pub gdp_rank: u32,
    /// Member of the euro-area monetary union, eligible for synthetic
    /// allocation from the shared aggregate.
    pub euro_member: bool,
}

/// The immutable configuration value of a run.
#[derive(Debug, Clone)]
pub struct Registry {
    pub countries: Vec<CountrySpec>,
    pub indicators: IndicatorSet,
    /// World Bank area code of the shared regional aggregate (euro area).
    pub aggregate_area: &'static str,
    /// Currency → representative country for the official-rate FX fallback.
    pub fx_refs: Vec<(&'static str, &'static str)>,
    pub base_currencies: Vec<&'static str>,
    pub events: Vec<EventNote>,
    pub sources: Vec<SourceRef>,
    pub default_start_year: Year,
}

impl Registry {
    /// The built-in registry covering the ten largest economies.
    pub fn builtin() -> Self {
        let countries = vec![
            country("US", "United States", "US", "USD", 1, false),
            country("CN", "China", "CN", "CNY", 2, false),
            country("JP", "Japan", "JP", "JPY", 3, false),
            country("DE", "Germany", "DE", "EUR", 4, true),
            country("IN", "India", "IN", "INR", 5, false),
            country("GB", "United Kingdom", "GB", "GBP", 6, false),
            country("FR", "France", "FR", "EUR", 7, true),
            country("IT", "Italy", "IT", "EUR", 8, true),
            country("BR", "Brazil", "BR", "BRL", 9, false),
            country("CA", "Canada", "CA", "CAD", 10, false),
        ];

        Self {
            countries,
            indicators: IndicatorSet {
                level_primary: "FM.LBL.BMNY.CN",
                level_secondary: "FM.LBL.MQMY.CN",
                growth: "FM.LBL.BMNY.ZG",
                lending: "FR.INR.LEND",
                gdp: "NY.GDP.MKTP.CN",
                fx_official: "PA.NUS.FCRF",
            },
            aggregate_area: "XC",
            fx_refs: vec![
                ("USD", "US"),
                ("EUR", "DE"),
                ("CNY", "CN"),
                ("JPY", "JP"),
                ("INR", "IN"),
                ("GBP", "GB"),
                ("BRL", "BR"),
                ("CAD", "CA"),
            ],
            base_currencies: vec!["USD", "EUR", "CNY", "JPY", "GBP", "INR"],
            events: builtin_events(),
            sources: builtin_sources(),
            default_start_year: 1980,
        }
    }

    pub fn country(&self, code: &str) -> Option<&CountrySpec> {
        self.countries.iter().find(|c| c.code == code)
    }

    /// Distinct currencies across all tracked countries, sorted.
    pub fn currencies(&self) -> BTreeSet<&'static str> {
        self.countries.iter().map(|c| c.currency).collect()
    }

    /// Representative World Bank area code for a currency's official rate.
    pub fn fx_ref(&self, currency: &str) -> Option<&'static str> {
        self.fx_refs
            .iter()
            .find(|(ccy, _)| *ccy == currency)
            .map(|(_, country)| {
                self.country(country)
                    .map(|c| c.wb)
                    .unwrap_or(*country)
            })
    }
}

fn country(
    code: &'static str,
    name: &'static str,
    wb: &'static str,
    currency: &'static str,
    gdp_rank: u32,
    euro_member: bool,
) -> CountrySpec {
    CountrySpec {
        code,
        name,
        wb,
        currency,
        gdp_rank,
        euro_member,
    }
}

fn builtin_events() -> Vec<EventNote> {
    let raw: [(Year, &str, &str); 10] = [
        (1985, "Plaza Accord", "G5 agreement to depreciate the USD; major FX regime shift."),
        (1991, "USSR Dissolution", "Large geopolitical realignment and transition shocks."),
        (1997, "Asian Financial Crisis", "Regional FX collapses, reserve loss, and liquidity stress."),
        (1999, "Euro Launch", "Introduction of EUR and structural shift in European monetary transmission."),
        (2001, "China WTO Entry", "Trade integration accelerates growth and credit deepening."),
        (2008, "Global Financial Crisis", "Aggressive monetary easing, liquidity facilities, and balance sheet expansion."),
        (2010, "Euro Sovereign Debt Crisis", "Fragmentation risk and unconventional policy in euro area."),
        (2016, "Brexit Referendum", "Sterling repricing and UK macro-financial uncertainty spike."),
        (2020, "COVID-19 Policy Shock", "Historic fiscal-monetary response and sharp jump in broad money growth."),
        (2022, "Russia-Ukraine War", "Energy shock, inflation surge, and synchronized rate hikes."),
    ];
    raw.iter()
        .map(|(year, title, detail)| EventNote {
            year: *year,
            title: (*title).to_string(),
            detail: (*detail).to_string(),
        })
        .collect()
}

fn builtin_sources() -> Vec<SourceRef> {
    let raw = [
        (
            "World Bank - Broad Money (Current LCU)",
            "https://data.worldbank.org/indicator/FM.LBL.BMNY.CN",
        ),
        (
            "World Bank - Money and Quasi Money (Current LCU)",
            "https://data.worldbank.org/indicator/FM.LBL.MQMY.CN",
        ),
        (
            "World Bank - Broad Money Growth (Annual %)",
            "https://data.worldbank.org/indicator/FM.LBL.BMNY.ZG",
        ),
        (
            "World Bank - Official Exchange Rate (LCU per USD)",
            "https://data.worldbank.org/indicator/PA.NUS.FCRF",
        ),
        (
            "World Bank - Lending Interest Rate (%)",
            "https://data.worldbank.org/indicator/FR.INR.LEND",
        ),
        ("Yahoo Finance", "https://finance.yahoo.com/"),
    ];
    raw.iter()
        .map(|(name, url)| SourceRef {
            name: (*name).to_string(),
            url: (*url).to_string(),
        })
        .collect()
}
