use chrono::{DateTime, Utc};
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::core::walker::{Visitor, Walker};
use crate::error::{CatalogError, Result};
use crate::types::{FileTimes, RawEntry, SourceKind, WalkStats};

/// Walks every regular file below a root directory.
pub struct DirectoryWalker {
    root: PathBuf,
    excluded: Option<PathBuf>,
}

impl DirectoryWalker {
    pub fn open(root: &Path) -> Result<Self> {
        fs::read_dir(root).map_err(|e| CatalogError::archive_open(root, e))?;
        Ok(DirectoryWalker {
            root: root.to_path_buf(),
            excluded: None,
        })
    }

    /// Leaves out a directory subtree, e.g. the run's own output directory
    /// when it lives inside the tree being cataloged.
    pub fn excluding(mut self, dir: &Path) -> Self {
        self.excluded = dir.canonicalize().ok();
        self
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        match &self.excluded {
            Some(excluded) if entry.file_type().is_dir() => {
                entry.file_name() == excluded.file_name().unwrap_or_default()
                    && entry.path().canonicalize().ok().as_ref() == Some(excluded)
            }
            _ => false,
        }
    }
}

fn file_times(metadata: &Metadata) -> FileTimes {
    FileTimes {
        created: metadata.created().ok().map(DateTime::<Utc>::from),
        modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        accessed: metadata.accessed().ok().map(DateTime::<Utc>::from),
    }
}

impl Walker for DirectoryWalker {
    fn kind(&self) -> SourceKind {
        SourceKind::Directory
    }

    fn walk(self: Box<Self>, visit: &mut Visitor<'_>) -> Result<WalkStats> {
        let mut stats = WalkStats::default();

        let walk = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e));

        for entry in walk {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable path: {}", e);
                    stats.skipped += 1;
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let (size, times) = match entry.metadata() {
                Ok(metadata) => (Some(metadata.len()), Some(file_times(&metadata))),
                Err(e) => {
                    warn!("Failed to read metadata for {:?}: {}", entry.path(), e);
                    (None, None)
                }
            };

            visit(RawEntry::File {
                path: entry.path().to_string_lossy().to_string(),
                location: entry.path().to_path_buf(),
                size,
                times,
            })?;
            stats.visited += 1;
        }

        debug!(
            "Walked {} files under {:?} ({} skipped)",
            stats.visited, self.root, stats.skipped
        );
        Ok(stats)
    }
}
