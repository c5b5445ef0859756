//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - initializes logging
//! - parses CLI arguments
//! - runs the build pipeline (fetch or offline fixtures)
//! - writes the dataset and optional summary JSON
//! - prints the terminal report
//! - enforces `--strict`

use chrono::Datelike;
use clap::Parser;

use crate::cli::{BuildArgs, Command, CoverageArgs};
use crate::domain::{BuildConfig, Registry};
use crate::error::{AppError, EXIT_STRICT};
use crate::report::UpdateSummary;

pub mod pipeline;

/// Entry point for the `m2` binary.
pub fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // We want `m2` and `m2 --offline` to behave like `m2 build ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing. This preserves a clean clap structure while
    // retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Build(args) => handle_build(args),
        Command::Coverage(args) => handle_coverage(args),
    }
}

fn handle_build(args: BuildArgs) -> Result<(), AppError> {
    let registry = Registry::builtin();
    let config = build_config_from_args(&args);
    let run = pipeline::run_build(&registry, &config)?;

    crate::io::write_dataset_json(&config.out, &run.dataset)?;
    log::info!("dataset written to {}", config.out.display());

    if let Some(path) = &config.summary {
        let summary = UpdateSummary {
            updated_at: run.dataset.meta.generated_at.clone(),
            data_file: config.out.display().to_string(),
            coverage: run.coverage.clone(),
            notes: run.dataset.meta.notes.clone(),
        };
        crate::io::write_update_summary(path, &summary)?;
        log::info!("summary written to {}", path.display());
    }

    println!(
        "{}",
        crate::report::format_run_summary(&run.dataset, &run.coverage)
    );

    enforce_strict(config.strict, run.coverage.total_missing_m2)
}

fn handle_coverage(args: CoverageArgs) -> Result<(), AppError> {
    let dataset = crate::io::read_dataset_json(&args.data)?;
    let summary = crate::report::summarize_coverage(&dataset);

    println!("{}", crate::report::format_coverage(&summary));

    enforce_strict(args.strict, summary.total_missing_m2)
}

fn enforce_strict(strict: bool, total_missing: usize) -> Result<(), AppError> {
    if strict && total_missing > 0 {
        return Err(AppError::new(
            EXIT_STRICT,
            format!("Strict mode: {total_missing} missing M2 values remain."),
        ));
    }
    Ok(())
}

pub fn build_config_from_args(args: &BuildArgs) -> BuildConfig {
    BuildConfig {
        start_year: args.start_year,
        end_year: args
            .end_year
            .unwrap_or_else(|| chrono::Utc::now().year()),
        jobs: args.jobs,
        offline: args.offline,
        out: args.out.clone(),
        summary: args.summary.clone(),
        strict: args.strict,
    }
}

/// Rewrite argv so `m2` defaults to `m2 build`.
///
/// Rules:
/// - `m2`                      -> `m2 build`
/// - `m2 --offline ...`        -> `m2 build --offline ...`
/// - `m2 --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("build".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "build" | "coverage");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "build flags".
    if arg1.starts_with('-') {
        argv.insert(1, "build".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_build() {
        assert_eq!(rewrite_args(args(&["m2"])), args(&["m2", "build"]));
    }

    #[test]
    fn leading_flag_defaults_to_build() {
        assert_eq!(
            rewrite_args(args(&["m2", "--offline", "--strict"])),
            args(&["m2", "build", "--offline", "--strict"])
        );
    }

    #[test]
    fn explicit_subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(args(&["m2", "coverage", "--strict"])),
            args(&["m2", "coverage", "--strict"])
        );
        assert_eq!(rewrite_args(args(&["m2", "--help"])), args(&["m2", "--help"]));
    }

    #[test]
    fn strict_mode_fails_on_missing_values() {
        assert!(enforce_strict(false, 3).is_ok());
        assert!(enforce_strict(true, 0).is_ok());
        let err = enforce_strict(true, 3).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_STRICT);
    }
}
