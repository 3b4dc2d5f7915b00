use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OpenFlags, Row};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::Result;
use crate::types::{EntryRecord, ListingStats, ListingSummary};

const SCHEMA_VERSION: i32 = 1;

const CREATE_TABLE_SQL: &str = "
CREATE TABLE IF NOT EXISTS file_listing (
  file_name TEXT,
  file_extension TEXT,
  entry_path TEXT COLLATE NOCASE PRIMARY KEY,
  created_at TEXT,
  modified_at TEXT,
  accessed_at TEXT,
  is_file INTEGER NOT NULL,
  size INTEGER,
  compressed_size INTEGER
);
";

const SELECT_COLUMNS: &str = "file_name, file_extension, entry_path, created_at, modified_at,
     accessed_at, is_file, size, compressed_size";

fn format_timestamp(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn parse_timestamp(text: Option<String>) -> Option<DateTime<Utc>> {
    let text = text?;
    DateTime::parse_from_rfc3339(&text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn remove_with_sidecars(db_path: &Path) -> Result<()> {
    if db_path.exists() {
        fs::remove_file(db_path)?;
    }
    for suffix in ["-journal", "-wal", "-shm"] {
        let mut sidecar = db_path.as_os_str().to_owned();
        sidecar.push(suffix);
        let sidecar = PathBuf::from(sidecar);
        if sidecar.exists() {
            fs::remove_file(&sidecar)?;
        }
    }
    Ok(())
}

/// Write side of one listing database.
///
/// All inserts go into a single transaction that `close` commits. Dropping
/// the store without closing it rolls the transaction back.
pub struct ListingStore {
    conn: Connection,
    location: PathBuf,
    inserted: usize,
    duplicates: usize,
}

impl ListingStore {
    pub fn create(db_path: &Path) -> Result<Self> {
        remove_with_sidecars(db_path)?;

        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.execute_batch(CREATE_TABLE_SQL)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        conn.execute_batch("BEGIN")?;

        Ok(ListingStore {
            conn,
            location: db_path.to_path_buf(),
            inserted: 0,
            duplicates: 0,
        })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Inserts one entry. Returns `false` when a row with the same path
    /// (compared case-insensitively) already exists; that row is kept as is.
    pub fn insert(&mut self, entry: &EntryRecord) -> Result<bool> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR IGNORE INTO file_listing
               (file_name, file_extension, entry_path, created_at, modified_at,
                accessed_at, is_file, size, compressed_size)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        let changed = stmt.execute(params![
            entry.file_name,
            entry.file_extension,
            entry.entry_path,
            format_timestamp(entry.created_at),
            format_timestamp(entry.modified_at),
            format_timestamp(entry.accessed_at),
            entry.is_file,
            entry.size,
            entry.compressed_size,
        ])?;

        if changed == 0 {
            self.duplicates += 1;
            Ok(false)
        } else {
            self.inserted += 1;
            Ok(true)
        }
    }

    /// Commits the listing. If the commit fails the file is removed, so a
    /// failed artifact never leaves a partial listing behind.
    pub fn close(self) -> Result<ListingSummary> {
        if let Err(e) = self.conn.execute_batch("COMMIT") {
            if let Err(cleanup) = self.discard() {
                warn!("Could not remove uncommitted listing: {}", cleanup);
            }
            return Err(e.into());
        }
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(ListingSummary {
            location: self.location,
            inserted: self.inserted,
            duplicates: self.duplicates,
        })
    }

    /// Drops uncommitted rows and deletes the database file.
    pub fn discard(self) -> Result<()> {
        let location = self.location;
        drop(self.conn);
        remove_with_sidecars(&location)
    }
}

fn entry_from_row(row: &Row) -> rusqlite::Result<EntryRecord> {
    Ok(EntryRecord {
        file_name: row.get(0)?,
        file_extension: row.get(1)?,
        entry_path: row.get(2)?,
        created_at: parse_timestamp(row.get(3)?),
        modified_at: parse_timestamp(row.get(4)?),
        accessed_at: parse_timestamp(row.get(5)?),
        is_file: row.get(6)?,
        size: row.get::<_, Option<i64>>(7)?.map(|v| v as u64),
        compressed_size: row.get::<_, Option<i64>>(8)?.map(|v| v as u64),
    })
}

/// Read side of a finished listing database.
pub struct ListingReader {
    conn: Connection,
}

impl ListingReader {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(ListingReader { conn })
    }

    pub fn schema_version(&self) -> Result<i32> {
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;
        Ok(version)
    }

    pub fn entries(&self) -> Result<Vec<EntryRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM file_listing ORDER BY rowid",
            SELECT_COLUMNS
        ))?;
        let rows = stmt.query_map([], entry_from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    pub fn find(&self, entry_path: &str) -> Result<Option<EntryRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM file_listing WHERE entry_path = ?1",
            SELECT_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![entry_path], entry_from_row)?;
        let found = rows.next().transpose()?;
        Ok(found)
    }

    pub fn stats(&self) -> Result<ListingStats> {
        let mut stmt = self.conn.prepare(
            "SELECT COUNT(*) as count,
                    COALESCE(SUM(is_file), 0) as files,
                    COALESCE(SUM(size), 0) as size,
                    COALESCE(SUM(compressed_size), 0) as compressed
             FROM file_listing",
        )?;
        let stats = stmt.query_row([], |row| {
            let total = row.get::<_, i64>(0)? as usize;
            let files = row.get::<_, i64>(1)? as usize;
            Ok(ListingStats {
                total_entries: total,
                files,
                directories: total - files,
                total_size: row.get::<_, i64>(2)? as u64,
                total_compressed_size: row.get::<_, i64>(3)? as u64,
            })
        })?;
        Ok(stats)
    }
}
