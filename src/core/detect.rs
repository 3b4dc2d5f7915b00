use std::fs::{self, File};
use std::path::Path;

use crate::error::{CatalogError, Result};
use crate::types::{SourceKind, TarCompression};
use crate::utils::compression::{decompressed_prefix, read_prefix, sniff_compression};

const TAR_BLOCK: usize = 512;
const TAR_CHECKSUM: std::ops::Range<usize> = 148..156;

const ZIP_SIGNATURES: [&[u8; 4]; 3] = [
    b"PK\x03\x04", // local file header
    b"PK\x05\x06", // end of central directory (empty archive)
    b"PK\x07\x08", // spanned archive marker
];

pub fn is_zip_header(header: &[u8]) -> bool {
    ZIP_SIGNATURES.iter().any(|sig| header.starts_with(&sig[..]))
}

fn parse_octal(field: &[u8]) -> Option<u32> {
    let digits: Vec<u8> = field
        .iter()
        .copied()
        .skip_while(|b| *b == b' ')
        .take_while(|b| (b'0'..=b'7').contains(b))
        .collect();
    if digits.is_empty() {
        return None;
    }
    let text = std::str::from_utf8(&digits).ok()?;
    u32::from_str_radix(text, 8).ok()
}

/// Checks whether `block` is a TAR header by verifying its checksum field.
///
/// Both the POSIX unsigned sum and the historical signed sum are accepted.
/// An all-zero block (end-of-archive marker) is not a header.
pub fn is_tar_header(block: &[u8]) -> bool {
    if block.len() < TAR_BLOCK || block[..TAR_BLOCK].iter().all(|b| *b == 0) {
        return false;
    }
    let Some(stored) = parse_octal(&block[TAR_CHECKSUM]) else {
        return false;
    };

    let mut unsigned: u32 = 0;
    let mut signed: i32 = 0;
    for (i, b) in block[..TAR_BLOCK].iter().enumerate() {
        let b = if TAR_CHECKSUM.contains(&i) { b' ' } else { *b };
        unsigned += b as u32;
        signed += b as i8 as i32;
    }

    stored == unsigned || stored as i32 == signed
}

/// Decides which walker handles `path`.
///
/// Directory, then ZIP signature, then TAR header, then a gzip, bzip2 or xz
/// stream whose first decompressed block is a TAR header.
/// Anything else is rejected as unrecognized.
pub fn classify(path: &Path) -> Result<SourceKind> {
    let metadata =
        fs::metadata(path).map_err(|e| CatalogError::archive_open(path, e))?;
    if metadata.is_dir() {
        return Ok(SourceKind::Directory);
    }

    let file = File::open(path).map_err(|e| CatalogError::archive_open(path, e))?;
    let header = read_prefix(file, TAR_BLOCK).map_err(|e| CatalogError::archive_open(path, e))?;

    if is_zip_header(&header) {
        return Ok(SourceKind::Zip);
    }
    if is_tar_header(&header) {
        return Ok(SourceKind::Tar(TarCompression::None));
    }
    if let Some(compression) = sniff_compression(&header) {
        let file = File::open(path).map_err(|e| CatalogError::archive_open(path, e))?;
        // A stream that fails to decode stays unrecognized.
        if let Ok(inner) = decompressed_prefix(file, compression, TAR_BLOCK) {
            if is_tar_header(&inner) {
                return Ok(SourceKind::Tar(compression));
            }
        }
    }

    Err(CatalogError::UnrecognizedInput(path.to_path_buf()))
}
