use crate::core::timestamp::from_unix_seconds;
use crate::types::{EntryRecord, RawEntry};

/// Last `/`-separated component of a path.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Suffix of a file name including the dot, or `""` when there is none.
///
/// Leading dots do not start a suffix, so `.bashrc` has no extension.
pub fn file_extension(name: &str) -> &str {
    let stem_start = name.len() - name.trim_start_matches('.').len();
    match name[stem_start..].rfind('.') {
        Some(idx) => &name[stem_start + idx..],
        None => "",
    }
}

fn name_parts(path: &str, is_file: bool) -> (Option<String>, Option<String>) {
    if !is_file {
        return (None, None);
    }
    let name = base_name(path);
    (Some(name.to_string()), Some(file_extension(name).to_string()))
}

pub fn normalize(raw: RawEntry) -> EntryRecord {
    match raw {
        RawEntry::File {
            path,
            size,
            times,
            ..
        } => {
            let entry_path = path.replace('\\', "/");
            let (file_name, file_extension) = name_parts(&entry_path, true);
            let times = times.unwrap_or_default();
            EntryRecord {
                file_name,
                file_extension,
                entry_path,
                created_at: times.created,
                modified_at: times.modified,
                accessed_at: times.accessed,
                is_file: true,
                size,
                compressed_size: None,
            }
        }
        RawEntry::Zip {
            name,
            size,
            compressed_size,
            dos_modified,
            extended,
        } => {
            let is_file = !name.ends_with('/');
            let (file_name, file_extension) = name_parts(&name, is_file);

            let mut modified_at = dos_modified;
            let mut created_at = None;
            let mut accessed_at = None;
            if let Some(ext) = extended {
                modified_at = ext.modified.or(modified_at);
                accessed_at = ext.accessed;
                created_at = ext.created;
            }

            EntryRecord {
                file_name,
                file_extension,
                entry_path: name,
                created_at,
                modified_at,
                accessed_at,
                is_file,
                size: Some(size),
                compressed_size: Some(compressed_size),
            }
        }
        RawEntry::Tar {
            path,
            is_regular,
            size,
            mtime,
        } => {
            let (file_name, file_extension) = name_parts(&path, is_regular);
            // TAR stores a single mtime; it fills created_at as well.
            let stamp = if mtime == 0 {
                None
            } else {
                i64::try_from(mtime).ok().and_then(from_unix_seconds)
            };
            EntryRecord {
                file_name,
                file_extension,
                entry_path: path,
                created_at: stamp,
                modified_at: stamp,
                accessed_at: None,
                is_file: is_regular,
                size: Some(size),
                compressed_size: None,
            }
        }
    }
}
