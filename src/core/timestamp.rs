//! Decoding of ZIP entry timestamps.
//!
//! The ZIP header only carries a DOS date/time (local time, 2-second
//! resolution). Info-ZIP writers add an "extended timestamp" extra field
//! (header id `0x5455`) with Unix-epoch modification, access and creation
//! times.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

pub const EXTENDED_TIMESTAMP_ID: u16 = 0x5455;

const FLAG_MODIFIED: u8 = 0b001;
const FLAG_ACCESSED: u8 = 0b010;
const FLAG_CREATED: u8 = 0b100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtendedTimestamps {
    pub modified: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
}

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub fn from_unix_seconds(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

/// Scans an extra-field block for the first extended timestamp sub-record.
///
/// Returns `None` when no such sub-record exists or when a sub-record header
/// or declared length runs past the end of the block. Only the first `0x5455`
/// sub-record is decoded; later ones are never looked at.
pub fn decode_extended_timestamp(extra: &[u8]) -> Option<ExtendedTimestamps> {
    let mut offset = 0;

    while offset < extra.len() {
        let header_id = read_u16(extra, offset)?;
        let data_size = read_u16(extra, offset + 2)? as usize;
        let start = offset + 4;
        let payload = extra.get(start..start + data_size)?;

        if header_id == EXTENDED_TIMESTAMP_ID {
            return decode_payload(payload);
        }

        offset = start + data_size;
    }

    None
}

fn decode_payload(payload: &[u8]) -> Option<ExtendedTimestamps> {
    let (&flags, _) = payload.split_first()?;
    let mut timestamps = ExtendedTimestamps::default();
    let mut offset = 1;

    // Central-directory copies keep every flag bit but only carry mtime, so
    // a field is read only if it fits in the declared payload.
    for (bit, slot) in [
        (FLAG_MODIFIED, &mut timestamps.modified),
        (FLAG_ACCESSED, &mut timestamps.accessed),
        (FLAG_CREATED, &mut timestamps.created),
    ] {
        if flags & bit == 0 {
            continue;
        }
        match read_u32(payload, offset) {
            Some(secs) => *slot = from_unix_seconds(secs as i64),
            None => break,
        }
        offset += 4;
    }

    Some(timestamps)
}

/// Converts a ZIP header's DOS date/time into UTC. Invalid dates give `None`.
pub fn from_dos_datetime(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
) -> Option<DateTime<Utc>> {
    let naive = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)?.and_hms_opt(
        hour as u32,
        minute as u32,
        second as u32,
    )?;
    Some(Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub_record(id: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn ut_payload(flags: u8, times: &[u32]) -> Vec<u8> {
        let mut out = vec![flags];
        for t in times {
            out.extend_from_slice(&t.to_le_bytes());
        }
        out
    }

    const MTIME: u32 = 1_609_459_200; // 2021-01-01T00:00:00Z
    const ATIME: u32 = 1_612_137_600; // 2021-02-01T00:00:00Z
    const CTIME: u32 = 1_577_836_800; // 2020-01-01T00:00:00Z

    #[test]
    fn test_all_three_fields() {
        let block = sub_record(0x5455, &ut_payload(0b111, &[MTIME, ATIME, CTIME]));
        let ts = decode_extended_timestamp(&block).unwrap();
        assert_eq!(ts.modified, from_unix_seconds(MTIME as i64));
        assert_eq!(ts.accessed, from_unix_seconds(ATIME as i64));
        assert_eq!(ts.created, from_unix_seconds(CTIME as i64));
    }

    #[test]
    fn test_fields_follow_flag_bits() {
        // bits 0 and 2 set: mtime then ctime, no atime
        let block = sub_record(0x5455, &ut_payload(0b101, &[MTIME, CTIME]));
        let ts = decode_extended_timestamp(&block).unwrap();
        assert_eq!(ts.modified, from_unix_seconds(MTIME as i64));
        assert_eq!(ts.accessed, None);
        assert_eq!(ts.created, from_unix_seconds(CTIME as i64));

        let block = sub_record(0x5455, &ut_payload(0b010, &[ATIME]));
        let ts = decode_extended_timestamp(&block).unwrap();
        assert_eq!(ts.modified, None);
        assert_eq!(ts.accessed, from_unix_seconds(ATIME as i64));
        assert_eq!(ts.created, None);
    }

    #[test]
    fn test_skips_other_sub_records() {
        let mut block = sub_record(0x000a, &[0u8; 32]);
        block.extend(sub_record(0x7875, &[1, 4, 0xe8, 3, 0, 0, 4, 0xe8, 3, 0, 0]));
        block.extend(sub_record(0x5455, &ut_payload(0b001, &[MTIME])));
        let ts = decode_extended_timestamp(&block).unwrap();
        assert_eq!(
            ts.modified.unwrap().to_rfc3339(),
            "2021-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_no_extended_timestamp() {
        assert_eq!(decode_extended_timestamp(&[]), None);

        let mut block = sub_record(0x000a, &[0u8; 8]);
        block.extend(sub_record(0x7875, &[1, 4, 0, 0, 0, 0]));
        assert_eq!(decode_extended_timestamp(&block), None);
    }

    #[test]
    fn test_declared_length_past_end() {
        let mut block = sub_record(0x000a, &[0u8; 8]);
        // claims 200 bytes, only 5 follow
        block.extend_from_slice(&0x5455u16.to_le_bytes());
        block.extend_from_slice(&200u16.to_le_bytes());
        block.extend_from_slice(&ut_payload(0b001, &[MTIME]));
        assert_eq!(decode_extended_timestamp(&block), None);
    }

    #[test]
    fn test_truncated_header() {
        let mut block = sub_record(0x000a, &[0u8; 4]);
        block.extend_from_slice(&[0x55, 0x54, 0x05]);
        assert_eq!(decode_extended_timestamp(&block), None);
    }

    #[test]
    fn test_central_directory_form() {
        // flags advertise all three, payload only carries mtime
        let block = sub_record(0x5455, &ut_payload(0b111, &[MTIME]));
        let ts = decode_extended_timestamp(&block).unwrap();
        assert_eq!(ts.modified, from_unix_seconds(MTIME as i64));
        assert_eq!(ts.accessed, None);
        assert_eq!(ts.created, None);
    }

    #[test]
    fn test_empty_payload() {
        let block = sub_record(0x5455, &[]);
        assert_eq!(decode_extended_timestamp(&block), None);
    }

    #[test]
    fn test_only_first_match_is_used() {
        let mut block = sub_record(0x5455, &ut_payload(0b001, &[MTIME]));
        block.extend(sub_record(0x5455, &ut_payload(0b111, &[ATIME, ATIME, ATIME])));
        let ts = decode_extended_timestamp(&block).unwrap();
        assert_eq!(ts.modified, from_unix_seconds(MTIME as i64));
        assert_eq!(ts.accessed, None);
    }

    #[test]
    fn test_dos_datetime() {
        let dt = from_dos_datetime(2021, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(dt.to_rfc3339(), "2021-01-01T00:00:00+00:00");
        assert_eq!(from_dos_datetime(1980, 0, 0, 0, 0, 0), None);
    }
}
