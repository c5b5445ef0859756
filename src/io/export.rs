//! Dataset and summary JSON IO.
//!
//! The dataset file is the sole boundary artifact of a run; `m2 coverage`
//! reads it back, so both directions live here and share the schema in
//! `domain::DatasetFile`.

use std::fs::{create_dir_all, File};
use std::path::Path;

use crate::domain::DatasetFile;
use crate::error::AppError;
use crate::report::UpdateSummary;

/// Write the dataset document, creating parent directories as needed.
pub fn write_dataset_json(path: &Path, dataset: &DatasetFile) -> Result<(), AppError> {
    let file = create_file(path, "dataset JSON")?;
    serde_json::to_writer_pretty(file, dataset)
        .map_err(|e| AppError::usage(format!("Failed to write dataset JSON: {e}")))?;
    Ok(())
}

/// Read a dataset document back.
pub fn read_dataset_json(path: &Path) -> Result<DatasetFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::usage(format!("Failed to open dataset JSON '{}': {e}", path.display()))
    })?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::data(format!("Invalid dataset JSON '{}': {e}", path.display())))
}

/// Write the machine-readable run summary (`--summary`).
pub fn write_update_summary(path: &Path, summary: &UpdateSummary) -> Result<(), AppError> {
    let file = create_file(path, "summary JSON")?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::usage(format!("Failed to write summary JSON: {e}")))?;
    Ok(())
}

fn create_file(path: &Path, what: &str) -> Result<File, AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent).map_err(|e| {
                AppError::usage(format!(
                    "Failed to create directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }
    }
    File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create {what} '{}': {e}", path.display())))
}
