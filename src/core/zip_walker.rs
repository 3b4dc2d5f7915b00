use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::warn;
use zip::ZipArchive;

use crate::core::timestamp::{decode_extended_timestamp, from_dos_datetime};
use crate::core::walker::{Visitor, Walker};
use crate::error::{CatalogError, Result};
use crate::types::{RawEntry, SourceKind, WalkStats};

/// Reads entry headers from a ZIP central directory. Entry data is never
/// decompressed.
pub struct ZipWalker {
    archive: ZipArchive<BufReader<File>>,
}

impl ZipWalker {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| CatalogError::archive_open(path, e))?;
        let archive = ZipArchive::new(BufReader::new(file))
            .map_err(|e| CatalogError::archive_open(path, e))?;
        Ok(ZipWalker { archive })
    }
}

impl Walker for ZipWalker {
    fn kind(&self) -> SourceKind {
        SourceKind::Zip
    }

    fn walk(self: Box<Self>, visit: &mut Visitor<'_>) -> Result<WalkStats> {
        let mut archive = self.archive;
        let mut stats = WalkStats::default();

        for index in 0..archive.len() {
            let raw = match archive.by_index_raw(index) {
                Ok(file) => {
                    let stamp = file.last_modified();
                    RawEntry::Zip {
                        name: file.name().to_string(),
                        size: file.size(),
                        compressed_size: file.compressed_size(),
                        dos_modified: from_dos_datetime(
                            stamp.year(),
                            stamp.month(),
                            stamp.day(),
                            stamp.hour(),
                            stamp.minute(),
                            stamp.second(),
                        ),
                        extended: decode_extended_timestamp(file.extra_data()),
                    }
                }
                Err(e) => {
                    warn!("Skipping ZIP entry #{}: {}", index, e);
                    stats.skipped += 1;
                    continue;
                }
            };

            visit(raw)?;
            stats.visited += 1;
        }

        Ok(stats)
    }
}
