//! Night folder scanning

use std::path::{Path, PathBuf};

use super::header::{read_exposure, ExposureRecord, ALLOWED_EXTENSIONS};
use super::names::LookupTables;

/// Outcome of scanning one night folder
#[derive(Debug, Clone, Default)]
pub struct FolderScan {
    /// Exposures in ascending timestamp order
    pub records: Vec<ExposureRecord>,
    /// Candidate files that could not be read
    pub skipped: usize,
}

/// Collect candidate exposure files below `dir`, depth first, entries of
/// each directory in name order.
pub fn collect_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk(dir, &mut files);
    files
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Cannot read directory {}: {}", dir.display(), e);
            return;
        }
    };

    let mut entries: Vec<_> = entries.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|entry| entry.path());

    for entry in entries {
        let path = entry.path();
        // file_type() does not follow links
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            walk(&path, files);
        } else if file_type.is_symlink() && path.is_dir() {
            tracing::debug!("Not following directory link {}", path.display());
        } else if path.is_file() && has_allowed_extension(&path) {
            files.push(path);
        }
    }
}

fn has_allowed_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read every exposure below `dir` and order them by timestamp.
///
/// Unreadable files are logged and skipped. Exposures sharing a timestamp
/// keep their discovery order.
pub fn scan_folder(dir: &Path, tables: &LookupTables) -> FolderScan {
    let files = collect_files(dir);
    tracing::debug!("Found {} candidate files in {}", files.len(), dir.display());

    let mut scan = FolderScan::default();
    for file in &files {
        match read_exposure(file, tables) {
            Ok(record) => {
                tracing::trace!("data row: {:?}", record);
                scan.records.push(record);
            }
            Err(e) => {
                tracing::warn!("HDR problem in file: {} - {}", file.display(), e);
                scan.skipped += 1;
            }
        }
    }

    scan.records.sort_by_key(|record| record.timestamp);
    scan
}
