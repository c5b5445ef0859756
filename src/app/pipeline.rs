//! Shared build pipeline used by the CLI front-end.
//!
//! One run, in dependency order:
//! raw gather (join barrier) -> per-entity calibration -> global scale ->
//! tier chain per entity -> coverage truncation -> document assembly.
//!
//! Everything after the gather is a pure function over the raw inputs, which
//! keeps the whole reconciliation testable against fixtures.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;

use crate::data::{self, sample, CountryRaw, RawInputs};
use crate::domain::{
    AnnualSeries, BuildConfig, CountryBlock, DatasetFile, Diagnostics, FxBlock, Registry, RunMeta,
    SourceTag, Year,
};
use crate::error::AppError;
use crate::recon::{self, allocate, calibrate, coverage, EntityInputs, Resolved};
use crate::report::{summarize_coverage, CoverageSummary};

/// All computed outputs of a single `m2 build` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub dataset: DatasetFile,
    pub coverage: CoverageSummary,
}

/// Execute the full build pipeline: gather raw inputs, then assemble.
pub fn run_build(registry: &Registry, config: &BuildConfig) -> Result<RunOutput, AppError> {
    if config.start_year > config.end_year {
        return Err(AppError::usage(format!(
            "Invalid year range {}..{}.",
            config.start_year, config.end_year
        )));
    }

    let raw = if config.offline {
        log::info!("offline mode: building from built-in fixtures");
        sample::offline_inputs(registry, config)
    } else {
        data::fetch_all(registry, config)?
    };

    Ok(assemble(registry, config, &raw))
}

/// Assemble the output document from fully gathered raw inputs.
///
/// This is deterministic and single-threaded; the coverage evaluator needs a
/// global view, so it runs only after every entity's tier chain finished.
pub fn assemble(registry: &Registry, config: &BuildConfig, raw: &RawInputs) -> RunOutput {
    let start = config.start_year;
    let provisional_end = config.end_year;
    let empty_raw = CountryRaw::default();

    let mut scale_factors: BTreeMap<String, f64> = BTreeMap::new();
    for c in &registry.countries {
        let cr = raw.countries.get(c.code).unwrap_or(&empty_raw);
        scale_factors.insert(
            c.code.to_string(),
            calibrate::scale_factor(&cr.primary, &cr.secondary),
        );
    }
    let global_scale = calibrate::global_scale(scale_factors.values());
    let aggregate_levels = allocate::aggregate_direct_levels(&raw.aggregate);

    let mut tagged: BTreeMap<String, Resolved> = BTreeMap::new();
    for c in &registry.countries {
        let cr = raw.countries.get(c.code).unwrap_or(&empty_raw);
        let entity = EntityInputs {
            raw: cr,
            euro_member: c.euro_member,
            scale_factor: scale_factors[c.code],
            global_scale,
            aggregate_levels: &aggregate_levels,
            aggregate_gdp: &raw.aggregate.gdp,
        };
        tagged.insert(
            c.code.to_string(),
            recon::reconcile_entity(&entity, start, provisional_end),
        );
    }

    let required = coverage::required_direct(registry.countries.len());
    let end = coverage::final_end_year(&tagged, start, provisional_end, required);
    coverage::truncate(&mut tagged, end);
    log::info!(
        "coverage: retaining {start}-{end} (requires {required} direct-covered entities per year)"
    );

    let mut countries = BTreeMap::new();
    let mut coverage_gaps: BTreeMap<String, Vec<Year>> = BTreeMap::new();
    let mut tiers_used: BTreeSet<SourceTag> = BTreeSet::new();
    for c in &registry.countries {
        let cr = raw.countries.get(c.code).unwrap_or(&empty_raw);
        let annual = recon::records_for(&tagged[c.code], cr, start, end);

        for record in &annual {
            if let Some(tag) = record.source {
                tiers_used.insert(tag);
            }
        }
        let missing: Vec<Year> = annual
            .iter()
            .filter(|r| r.m2_local.is_none())
            .map(|r| r.year)
            .collect();
        if !missing.is_empty() {
            log::warn!("{}: {} unresolved years remain", c.code, missing.len());
            coverage_gaps.insert(c.code.to_string(), missing);
        }

        countries.insert(
            c.code.to_string(),
            CountryBlock {
                name: c.name.to_string(),
                wb: c.wb.to_string(),
                currency: c.currency.to_string(),
                gdp_rank: c.gdp_rank,
                annual,
            },
        );
    }

    let mut usd_per_currency: BTreeMap<String, AnnualSeries> = BTreeMap::new();
    let mut fx_sources: BTreeMap<String, String> = BTreeMap::new();
    for (currency, resolution) in &raw.fx {
        let retained: AnnualSeries = resolution
            .usd_per_unit
            .range(start..=end)
            .map(|(y, v)| (*y, *v))
            .collect();
        usd_per_currency.insert(currency.clone(), retained);
        fx_sources.insert(currency.clone(), resolution.method.clone());
    }

    let aggregate_areas = if aggregate_levels.is_empty() {
        Vec::new()
    } else {
        vec![registry.aggregate_area.to_string()]
    };

    let notes = build_notes(registry, &tiers_used, &fx_sources, &coverage_gaps);

    let dataset = DatasetFile {
        meta: RunMeta {
            generated_at: Utc::now().to_rfc3339(),
            start_year: start,
            end_year: end,
            unit_policy:
                "Levels are nominal local currency units; convert via fx.usdPerCurrency for cross-country comparison."
                    .to_string(),
            notes,
        },
        countries,
        fx: FxBlock {
            usd_per_currency,
            sources: fx_sources,
            base_currencies: registry
                .base_currencies
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        },
        events: registry.events.clone(),
        sources: registry.sources.clone(),
        diagnostics: Diagnostics {
            global_scale,
            scale_factors,
            aggregate_areas,
            coverage_gaps,
        },
    };

    let coverage = summarize_coverage(&dataset);
    RunOutput { dataset, coverage }
}

fn build_notes(
    registry: &Registry,
    tiers_used: &BTreeSet<SourceTag>,
    fx_sources: &BTreeMap<String, String>,
    coverage_gaps: &BTreeMap<String, Vec<Year>>,
) -> Vec<String> {
    let ind = registry.indicators;
    let mut notes = vec![
        format!("M2 proxy uses World Bank broad money ({}).", ind.level_primary),
        format!(
            "Secondary fallback uses World Bank money + quasi money ({}) after scale calibration.",
            ind.level_secondary
        ),
        "FX conversion uses Yahoo Finance annual average close where available; World Bank PA.NUS.FCRF fallback otherwise.".to_string(),
        "Cross-country comparability is indicative because national aggregate definitions differ.".to_string(),
    ];

    let tiers: Vec<&str> = tiers_used.iter().map(|t| t.display_name()).collect();
    if !tiers.is_empty() {
        notes.push(format!("Fallback tiers used this run: {}.", tiers.join(", ")));
    }
    if fx_sources.values().any(|m| m.starts_with("worldbank:")) {
        notes.push("One or more currencies fell back to official exchange rates.".to_string());
    }
    if !coverage_gaps.is_empty() {
        notes.push(format!(
            "Residual coverage gaps remain for: {}.",
            coverage_gaps.keys().cloned().collect::<Vec<_>>().join(", ")
        ));
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn offline_run(start: Year, end: Year) -> RunOutput {
        let registry = Registry::builtin();
        let config = BuildConfig {
            start_year: start,
            end_year: end,
            jobs: 1,
            offline: true,
            out: PathBuf::from("out.json"),
            summary: None,
            strict: false,
        };
        let raw = sample::offline_inputs(&registry, &config);
        assemble(&registry, &config, &raw)
    }

    #[test]
    fn coverage_truncates_past_the_fixture_horizon() {
        let run = offline_run(1980, 2024);
        // Nothing is direct-covered in 2024, so the dataset ends at 2023.
        assert_eq!(run.dataset.meta.end_year, 2023);
    }

    #[test]
    fn every_country_is_dense_after_truncation() {
        let run = offline_run(1980, 2024);
        assert_eq!(run.coverage.total_missing_m2, 0);
        for (code, block) in &run.dataset.countries {
            assert_eq!(block.annual.len(), 44, "{code}");
            for record in &block.annual {
                assert!(record.m2_local.is_some(), "{code} {}", record.year);
                assert!(record.source.is_some(), "{code} {}", record.year);
            }
        }
        assert!(run.dataset.diagnostics.coverage_gaps.is_empty());
    }

    #[test]
    fn tiers_land_where_the_fixtures_put_them() {
        let run = offline_run(1980, 2024);
        let tag_at = |code: &str, year: Year| {
            run.dataset.countries[code]
                .annual
                .iter()
                .find(|r| r.year == year)
                .and_then(|r| r.source)
                .unwrap()
        };

        // Euro members: direct until the cutover, synthetic afterwards.
        assert_eq!(tag_at("DE", 1998), SourceTag::DirectPrimary);
        assert_eq!(tag_at("DE", 1999), SourceTag::SyntheticAllocated);
        assert_eq!(tag_at("FR", 2010), SourceTag::SyntheticAllocated);
        assert_eq!(tag_at("IT", 2023), SourceTag::SyntheticAllocated);

        // GB: secondary source keeps the tail direct (scaled).
        assert_eq!(tag_at("GB", 2010), SourceTag::DirectPrimary);
        assert_eq!(tag_at("GB", 2015), SourceTag::DirectSecondaryScaled);

        // India: growth series chains past the end of direct data.
        assert_eq!(tag_at("IN", 2015), SourceTag::DirectPrimary);
        assert_eq!(tag_at("IN", 2020), SourceTag::GrowthChained);

        // China: growth series chains backwards before 1985.
        assert_eq!(tag_at("CN", 1982), SourceTag::GrowthChained);
        assert_eq!(tag_at("CN", 1985), SourceTag::DirectPrimary);

        // Brazil: five-yearly reporting, interpolated in between.
        assert_eq!(tag_at("BR", 1985), SourceTag::DirectPrimary);
        assert_eq!(tag_at("BR", 1986), SourceTag::Interpolated);
        assert_eq!(tag_at("BR", 2023), SourceTag::Interpolated);
    }

    #[test]
    fn calibration_recovers_fixture_ratios() {
        let run = offline_run(1980, 2024);
        let factors = &run.dataset.diagnostics.scale_factors;
        assert!((factors["US"] - 1.02).abs() < 1e-9);
        assert!((factors["CN"] - 1.05).abs() < 1e-9);
        // Brazil has no secondary source: neutral factor.
        assert_eq!(factors["BR"], 1.0);
        assert!((run.dataset.diagnostics.global_scale - 1.03).abs() < 1e-9);
    }

    #[test]
    fn fx_block_is_dense_and_attributed() {
        let run = offline_run(1980, 2024);
        let usd = &run.dataset.fx.usd_per_currency["USD"];
        assert_eq!(usd.len(), 44);
        assert!(usd.values().all(|v| *v == 1.0));
        assert_eq!(run.dataset.fx.sources["USD"], "fixed");
        assert_eq!(run.dataset.fx.sources["EUR"], "sample");
        assert_eq!(run.dataset.fx.usd_per_currency["EUR"].len(), 44);
    }

    #[test]
    fn notes_mention_the_tiers_used() {
        let run = offline_run(1980, 2024);
        assert!(run
            .dataset
            .meta
            .notes
            .iter()
            .any(|n| n.contains("synthetic-allocated") && n.contains("growth-chained")));
    }

    #[test]
    fn aggregate_availability_is_diagnosed() {
        let run = offline_run(1980, 2024);
        assert_eq!(run.dataset.diagnostics.aggregate_areas, vec!["XC".to_string()]);
    }

    #[test]
    fn invalid_year_range_is_a_usage_error() {
        let registry = Registry::builtin();
        let config = BuildConfig {
            start_year: 2000,
            end_year: 1990,
            jobs: 1,
            offline: true,
            out: PathBuf::from("out.json"),
            summary: None,
            strict: false,
        };
        let err = run_build(&registry, &config).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
    }
}
