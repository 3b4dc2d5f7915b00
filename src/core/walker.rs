use std::path::Path;

use crate::core::dir_walker::DirectoryWalker;
use crate::core::tar_walker::TarWalker;
use crate::core::zip_walker::ZipWalker;
use crate::error::Result;
use crate::types::{RawEntry, SourceKind, WalkStats};

pub type Visitor<'a> = dyn FnMut(RawEntry) -> Result<()> + 'a;

/// A source of raw entries: a directory tree, a ZIP archive or a TAR archive.
///
/// Opening a walker acquires its file handle; `walk` consumes the walker, so a
/// walk cannot be restarted, and the handle is released when it returns.
/// Entries are pushed to `visit` in the source's native order. A member that
/// cannot be read is logged and counted in `WalkStats::skipped`; an error
/// returned by `visit` aborts the walk.
pub trait Walker {
    fn kind(&self) -> SourceKind;

    fn walk(self: Box<Self>, visit: &mut Visitor<'_>) -> Result<WalkStats>;
}

/// Opens the walker for `kind`. `exclude` names a directory subtree that a
/// directory walk leaves out; archive walkers ignore it.
pub fn open_walker(
    path: &Path,
    kind: SourceKind,
    exclude: Option<&Path>,
) -> Result<Box<dyn Walker>> {
    let walker: Box<dyn Walker> = match kind {
        SourceKind::Directory => {
            let walker = DirectoryWalker::open(path)?;
            match exclude {
                Some(dir) => Box::new(walker.excluding(dir)),
                None => Box::new(walker),
            }
        }
        SourceKind::Zip => Box::new(ZipWalker::open(path)?),
        SourceKind::Tar(compression) => Box::new(TarWalker::open(path, compression)?),
    };
    Ok(walker)
}
