use anyhow::{bail, Context, Result};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::core::store::ListingReader;
use crate::types::ListingStats;
use crate::utils::fs::format_bytes;
use crate::utils::progress::print_box;

/// Summarizes a listing database. With `json`, also writes every entry to
/// stdout as one JSON object per line. With `entry`, looks up a single path
/// (case-insensitively) and prints it as JSON instead.
pub fn inspect(listing: &str, json: bool, entry: Option<&str>) -> Result<ListingStats> {
    let db_path = Path::new(listing);

    if !db_path.is_file() {
        bail!("Listing not found: {}", db_path.display());
    }

    let reader = ListingReader::open(db_path)
        .with_context(|| format!("Failed to open listing {}", db_path.display()))?;
    let version = reader.schema_version()?;
    let stats = reader.stats()?;

    if let Some(entry_path) = entry {
        match reader.find(entry_path)? {
            Some(record) => println!("{}", serde_json::to_string(&record)?),
            None => bail!("Entry not found: {}", entry_path),
        }
    } else if json {
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        write_json_lines(&reader, &mut out)?;
        out.flush()?;
    }

    print_box(
        "Listing",
        &[
            format!("File: {}", db_path.display()),
            format!("Schema version: {}", version),
            format!("Entries: {}", stats.total_entries),
            format!("Files: {}", stats.files),
            format!("Directories: {}", stats.directories),
            format!("Size: {}", format_bytes(stats.total_size)),
            format!("Compressed: {}", format_bytes(stats.total_compressed_size)),
        ],
        "\x1b[36m",
    );

    Ok(stats)
}

fn write_json_lines<W: Write>(reader: &ListingReader, out: &mut W) -> Result<usize> {
    let entries = reader.entries()?;
    for entry in &entries {
        serde_json::to_writer(&mut *out, entry)?;
        out.write_all(b"\n")?;
    }
    Ok(entries.len())
}
