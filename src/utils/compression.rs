use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Read};
use xz2::read::XzDecoder;

use crate::types::TarCompression;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];

/// Compression format named by the stream's magic bytes, if any.
pub fn sniff_compression(header: &[u8]) -> Option<TarCompression> {
    if header.starts_with(GZIP_MAGIC) {
        Some(TarCompression::Gzip)
    } else if header.starts_with(BZIP2_MAGIC) {
        Some(TarCompression::Bzip2)
    } else if header.starts_with(XZ_MAGIC) {
        Some(TarCompression::Xz)
    } else {
        None
    }
}

/// Wraps `reader` in the decoder for `compression`.
pub fn decode_stream<'a, R: Read + 'a>(
    reader: R,
    compression: TarCompression,
) -> Box<dyn Read + 'a> {
    match compression {
        TarCompression::None => Box::new(reader),
        TarCompression::Gzip => Box::new(GzDecoder::new(reader)),
        TarCompression::Bzip2 => Box::new(BzDecoder::new(reader)),
        TarCompression::Xz => Box::new(XzDecoder::new(reader)),
    }
}

pub fn open_stream(file: File, compression: TarCompression) -> Box<dyn Read> {
    decode_stream(BufReader::new(file), compression)
}

/// Reads up to `limit` bytes, stopping early only at end of stream.
pub fn read_prefix<R: Read>(reader: R, limit: usize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(limit);
    reader.take(limit as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// First `limit` decompressed bytes. Corrupt data gives an error.
pub fn decompressed_prefix<R: Read>(
    reader: R,
    compression: TarCompression,
    limit: usize,
) -> io::Result<Vec<u8>> {
    read_prefix(decode_stream(reader, compression), limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::new(6));
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn bzip2(data: &[u8]) -> Vec<u8> {
        let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn xz(data: &[u8]) -> Vec<u8> {
        let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_sniff_compression() {
        assert_eq!(sniff_compression(&gzip(b"hello")), Some(TarCompression::Gzip));
        assert_eq!(sniff_compression(&bzip2(b"hello")), Some(TarCompression::Bzip2));
        assert_eq!(sniff_compression(&xz(b"hello")), Some(TarCompression::Xz));
        assert_eq!(sniff_compression(b"PK\x03\x04"), None);
        assert_eq!(sniff_compression(b"BZ"), None);
        assert_eq!(sniff_compression(b""), None);
    }

    #[test]
    fn test_decompressed_prefix() {
        let data = vec![7u8; 2048];
        for (compression, packed) in [
            (TarCompression::Gzip, gzip(&data)),
            (TarCompression::Bzip2, bzip2(&data)),
            (TarCompression::Xz, xz(&data)),
        ] {
            let prefix = decompressed_prefix(&packed[..], compression, 512).unwrap();
            assert_eq!(prefix, vec![7u8; 512], "{:?}", compression);
        }
    }

    #[test]
    fn test_short_stream_and_passthrough() {
        let prefix = decompressed_prefix(&gzip(b"abc")[..], TarCompression::Gzip, 512).unwrap();
        assert_eq!(prefix, b"abc");

        let plain = decompressed_prefix(&b"plain bytes"[..], TarCompression::None, 5).unwrap();
        assert_eq!(plain, b"plain");
    }

    #[test]
    fn test_corrupt_streams() {
        assert!(decompressed_prefix(&[0x1f, 0x8b, 0xff, 0xff][..], TarCompression::Gzip, 512).is_err());
        assert!(decompressed_prefix(&b"BZh9garbage"[..], TarCompression::Bzip2, 512).is_err());
        assert!(decompressed_prefix(&XZ_MAGIC[..], TarCompression::Xz, 512).is_err());
    }
}
