use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::info;

/// Filename convention for tracker exports: `project_YYYY-MM-DD.csv`
const FILE_PATTERN: &str = r"^project_(\d{4}-\d{2}-\d{2})\.csv$";

/// Find the export file with the most recent embedded date in `folder`
/// (non-recursive).
///
/// Returns `Ok(None)` when the folder does not exist or contains no matching
/// filename. Two files with the same embedded date resolve to the
/// lexicographically greatest filename, so repeated runs pick the same file.
pub fn latest_report_file(folder: &Path) -> Result<Option<PathBuf>> {
    if !folder.is_dir() {
        info!("Folder not found: {}", folder.display());
        return Ok(None);
    }

    let pattern = Regex::new(FILE_PATTERN).unwrap();

    let mut latest: Option<(NaiveDate, String, PathBuf)> = None;

    let entries = std::fs::read_dir(folder)
        .with_context(|| format!("Failed to list folder {}", folder.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", folder.display()))?;
        let file_name = entry.file_name();
        let name = match file_name.to_str() {
            Some(name) => name,
            None => continue,
        };

        let captures = match pattern.captures(name) {
            Some(captures) => captures,
            None => continue,
        };

        // A name like project_2024-13-40.csv matches the pattern but is not
        // a date; skip it rather than fail the whole scan.
        let date = match NaiveDate::parse_from_str(&captures[1], "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => continue,
        };

        let newer = match &latest {
            None => true,
            Some((latest_date, latest_name, _)) => {
                date > *latest_date || (date == *latest_date && name > latest_name.as_str())
            }
        };

        if newer {
            latest = Some((date, name.to_string(), entry.path()));
        }
    }

    if latest.is_none() {
        info!("No matching files found in folder: {}", folder.display());
    }

    Ok(latest.map(|(_, _, path)| path))
}
