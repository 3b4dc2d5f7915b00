use std::fs::File;
use std::io::Read;
use std::path::Path;
use tar::{Archive, EntryType};
use tracing::warn;

use crate::core::walker::{Visitor, Walker};
use crate::error::{CatalogError, Result};
use crate::types::{RawEntry, SourceKind, TarCompression, WalkStats};
use crate::utils::compression::open_stream;

/// Reads member headers from a TAR stream, plain or gzip/bzip2/xz compressed.
pub struct TarWalker {
    archive: Archive<Box<dyn Read>>,
    compression: TarCompression,
}

impl TarWalker {
    pub fn open(path: &Path, compression: TarCompression) -> Result<Self> {
        let file = File::open(path).map_err(|e| CatalogError::archive_open(path, e))?;
        Ok(TarWalker {
            archive: Archive::new(open_stream(file, compression)),
            compression,
        })
    }
}

fn is_regular(entry_type: EntryType) -> bool {
    matches!(
        entry_type,
        EntryType::Regular | EntryType::Continuous | EntryType::GNUSparse
    )
}

impl Walker for TarWalker {
    fn kind(&self) -> SourceKind {
        SourceKind::Tar(self.compression)
    }

    fn walk(self: Box<Self>, visit: &mut Visitor<'_>) -> Result<WalkStats> {
        let mut archive = self.archive;
        let mut stats = WalkStats::default();

        // The tar iterator stops after the first header error.
        for entry in archive.entries()? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable TAR member: {}", e);
                    stats.skipped += 1;
                    continue;
                }
            };

            let path = String::from_utf8_lossy(&entry.path_bytes()).to_string();
            let header = entry.header();
            let mtime = header.mtime().unwrap_or_else(|e| {
                warn!("Bad mtime on TAR member {}: {}", path, e);
                0
            });

            visit(RawEntry::Tar {
                is_regular: is_regular(header.entry_type()),
                size: entry.size(),
                mtime,
                path,
            })?;
            stats.visited += 1;
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn header(path: &str, entry_type: EntryType, size: u64, mtime: u64) -> tar::Header {
        let mut header = tar::Header::new_gnu();
        header.set_path(path).unwrap();
        header.set_entry_type(entry_type);
        header.set_size(size);
        header.set_mode(0o644);
        header.set_mtime(mtime);
        header.set_cksum();
        header
    }

    fn tar_bytes() -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        builder
            .append(&header("logs/", EntryType::Directory, 0, 0), std::io::empty())
            .unwrap();
        builder
            .append(
                &header("logs/app.log", EntryType::Regular, 5, 1_609_459_200),
                &b"hello"[..],
            )
            .unwrap();
        let mut link = header("logs/latest", EntryType::Symlink, 0, 1_609_459_200);
        link.set_link_name("app.log").unwrap();
        link.set_cksum();
        builder.append(&link, std::io::empty()).unwrap();
        builder.into_inner().unwrap()
    }

    fn collect(path: &Path, compression: TarCompression) -> (Vec<RawEntry>, WalkStats) {
        let walker = Box::new(TarWalker::open(path, compression).unwrap());
        let mut entries = Vec::new();
        let stats = walker
            .walk(&mut |raw| {
                entries.push(raw);
                Ok(())
            })
            .unwrap();
        (entries, stats)
    }

    #[test]
    fn test_walks_members() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs.tar");
        std::fs::write(&path, tar_bytes()).unwrap();

        let (entries, stats) = collect(&path, TarCompression::None);
        assert_eq!(stats.visited, 3);

        match &entries[0] {
            RawEntry::Tar {
                path,
                is_regular,
                mtime,
                ..
            } => {
                assert_eq!(path, "logs/");
                assert!(!is_regular);
                assert_eq!(*mtime, 0);
            }
            other => panic!("unexpected entry {:?}", other),
        }
        match &entries[1] {
            RawEntry::Tar {
                path,
                is_regular,
                size,
                mtime,
            } => {
                assert_eq!(path, "logs/app.log");
                assert!(*is_regular);
                assert_eq!(*size, 5);
                assert_eq!(*mtime, 1_609_459_200);
            }
            other => panic!("unexpected entry {:?}", other),
        }
        match &entries[2] {
            RawEntry::Tar { is_regular, .. } => assert!(!is_regular),
            other => panic!("unexpected entry {:?}", other),
        }
    }

    #[test]
    fn test_walks_compressed_streams() {
        let dir = tempdir().unwrap();
        let plain = tar_bytes();

        let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        gz.write_all(&plain).unwrap();
        let mut bz = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
        bz.write_all(&plain).unwrap();
        let mut xz = xz2::write::XzEncoder::new(Vec::new(), 6);
        xz.write_all(&plain).unwrap();

        for (name, compression, bytes) in [
            ("logs.tar.gz", TarCompression::Gzip, gz.finish().unwrap()),
            ("logs.tar.bz2", TarCompression::Bzip2, bz.finish().unwrap()),
            ("logs.tar.xz", TarCompression::Xz, xz.finish().unwrap()),
        ] {
            let path = dir.path().join(name);
            std::fs::write(&path, bytes).unwrap();

            let walker = TarWalker::open(&path, compression).unwrap();
            assert_eq!(walker.kind(), SourceKind::Tar(compression));

            let (entries, stats) = collect(&path, compression);
            let names: Vec<_> = entries.iter().map(|e| e.path()).collect();
            assert_eq!(names, vec!["logs/", "logs/app.log", "logs/latest"], "{}", name);
            assert_eq!(stats.skipped, 0);
        }
    }

    #[test]
    fn test_truncated_archive_keeps_earlier_members() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cut.tar");
        let bytes = tar_bytes();
        // directory header intact, the next header block mangled
        let mut cut = bytes[..512].to_vec();
        cut.extend_from_slice(&[0xffu8; 512]);
        std::fs::write(&path, cut).unwrap();

        let (entries, stats) = collect(&path, TarCompression::None);
        assert_eq!(entries.len(), 1);
        assert_eq!(stats.skipped, 1);
    }
}
