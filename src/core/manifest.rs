use std::path::{Path, PathBuf};

use crate::error::Result;

pub const MANIFEST_FILE_NAME: &str = "manifest.csv";
pub const MANIFEST_HEADER: [&str; 2] = ["Input Path", "Exported File Listing"];

/// Collects (input artifact, listing) pairs for one run and writes them once.
#[derive(Debug, Default)]
pub struct ManifestBuilder {
    rows: Vec<(PathBuf, PathBuf)>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, input_path: &Path, listing_location: &Path) {
        self.rows
            .push((input_path.to_path_buf(), listing_location.to_path_buf()));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the manifest CSV. Consumes the builder so it is written at most once.
    pub fn finalize(self, manifest_path: &Path) -> Result<PathBuf> {
        let mut writer = csv::Writer::from_path(manifest_path)?;
        writer.write_record(MANIFEST_HEADER)?;
        for (input, listing) in &self.rows {
            writer.write_record([&*input.to_string_lossy(), &*listing.to_string_lossy()])?;
        }
        writer.flush()?;
        Ok(manifest_path.to_path_buf())
    }
}
