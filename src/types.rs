use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::core::timestamp::ExtendedTimestamps;

/// One normalized row of a file listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRecord {
    pub file_name: Option<String>,
    pub file_extension: Option<String>,
    pub entry_path: String,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub accessed_at: Option<DateTime<Utc>>,
    pub is_file: bool,
    pub size: Option<u64>,
    pub compressed_size: Option<u64>,
}

/// Timestamps read from filesystem metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileTimes {
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
}

/// A record as produced by a walker, before normalization.
#[derive(Debug, Clone)]
pub enum RawEntry {
    File {
        path: String,
        location: PathBuf,
        size: Option<u64>,
        times: Option<FileTimes>,
    },
    Zip {
        name: String,
        size: u64,
        compressed_size: u64,
        dos_modified: Option<DateTime<Utc>>,
        extended: Option<ExtendedTimestamps>,
    },
    Tar {
        path: String,
        is_regular: bool,
        size: u64,
        mtime: u64,
    },
}

impl RawEntry {
    pub fn path(&self) -> &str {
        match self {
            RawEntry::File { path, .. } => path,
            RawEntry::Zip { name, .. } => name,
            RawEntry::Tar { path, .. } => path,
        }
    }
}

/// Compression wrapped around a TAR stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarCompression {
    None,
    Gzip,
    Bzip2,
    Xz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Directory,
    Zip,
    Tar(TarCompression),
}

impl SourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Directory => "directory",
            SourceKind::Zip => "ZIP",
            SourceKind::Tar(TarCompression::None) => "TAR",
            SourceKind::Tar(TarCompression::Gzip) => "TAR (gzip)",
            SourceKind::Tar(TarCompression::Bzip2) => "TAR (bzip2)",
            SourceKind::Tar(TarCompression::Xz) => "TAR (xz)",
        }
    }

    pub fn is_archive(&self) -> bool {
        !matches!(self, SourceKind::Directory)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub visited: usize,
    pub skipped: usize,
}

/// Result of closing a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSummary {
    pub location: PathBuf,
    pub inserted: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingStats {
    pub total_entries: usize,
    pub files: usize,
    pub directories: usize,
    pub total_size: u64,
    pub total_compressed_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UnrecognizedInput,
    ArchiveOpen,
    OutputDir,
    Io,
    Storage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStatus {
    Cataloged {
        kind: SourceKind,
        listing: ListingSummary,
        skipped: usize,
    },
    Failed {
        kind: FailureKind,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOutcome {
    pub input: PathBuf,
    pub status: ArtifactStatus,
}

impl ArtifactOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, ArtifactStatus::Cataloged { .. })
    }
}

#[derive(Debug, Clone)]
pub struct CatalogOptions {
    pub input: String,
    pub output: String,
    pub embedded: bool,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub artifacts: Vec<ArtifactOutcome>,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.artifacts.iter().filter(|a| !a.is_success()).count()
    }
}
