use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};
use crate::types::SourceKind;

pub const RUN_DIR_PREFIX: &str = "arcindex_out_";

/// Creates `<output_root>/arcindex_out_YYYYMMDD-HHMMSS`.
///
/// The root must already exist and be a directory.
pub fn create_run_dir(output_root: &Path, started: DateTime<Local>) -> Result<PathBuf> {
    let metadata = fs::metadata(output_root).map_err(|e| CatalogError::OutputDir {
        path: output_root.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !metadata.is_dir() {
        return Err(CatalogError::OutputDir {
            path: output_root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let run_dir = output_root.join(format!(
        "{}{}",
        RUN_DIR_PREFIX,
        started.format("%Y%m%d-%H%M%S")
    ));
    fs::create_dir_all(&run_dir).map_err(|e| CatalogError::OutputDir {
        path: run_dir.clone(),
        reason: e.to_string(),
    })?;
    Ok(run_dir)
}

/// Base name used in listing file names. Falls back to `root` for paths like `/`.
pub fn artifact_base_name(input: &Path) -> String {
    input
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "root".to_string())
}

pub fn listing_file_name(seq: usize, input: &Path, kind: SourceKind) -> String {
    let suffix = match kind {
        SourceKind::Directory => "folder_listing",
        _ => "file_listing",
    };
    format!("{}-{}_{}.db", seq, artifact_base_name(input), suffix)
}

/// Human-readable size for summaries. Below 1 KB the byte count is exact.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if size < 1024.0 {
            break;
        }
        size /= 1024.0;
        unit = next;
    }
    format!("{:.1} {}", size, unit)
}
