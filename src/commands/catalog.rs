use anyhow::Result;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::core::detect::classify;
use crate::core::manifest::{ManifestBuilder, MANIFEST_FILE_NAME};
use crate::core::normalizer::normalize;
use crate::core::store::ListingStore;
use crate::core::walker::open_walker;
use crate::error::CatalogError;
use crate::types::{
    ArtifactOutcome, ArtifactStatus, CatalogOptions, ListingSummary, RawEntry, RunReport,
    SourceKind, WalkStats,
};
use crate::utils::fs::{create_run_dir, listing_file_name};
use crate::utils::progress::{create_spinner, print_box};

const PROGRESS_EVERY: u64 = 256;

fn truncate_display(path: &str) -> String {
    path.chars().take(40).collect()
}

/// State threaded through one run: where listings go, the next sequence
/// number, the manifest being built and every artifact's outcome.
pub struct RunContext {
    run_dir: PathBuf,
    seq: usize,
    manifest: ManifestBuilder,
    outcomes: Vec<ArtifactOutcome>,
    quiet: bool,
}

struct Cataloged {
    listing: ListingSummary,
    walk: WalkStats,
    embedded: Vec<PathBuf>,
}

impl RunContext {
    pub fn new(run_dir: PathBuf, quiet: bool) -> Self {
        RunContext {
            run_dir,
            seq: 0,
            manifest: ManifestBuilder::new(),
            outcomes: Vec::new(),
            quiet,
        }
    }

    /// Catalogs one input path. With `embedded`, archives found in a
    /// directory tree are cataloged as their own artifacts afterwards.
    pub fn process_input(&mut self, input: &Path, embedded: bool) {
        let kind = match classify(input) {
            Ok(kind) => kind,
            Err(e) => {
                self.record_failure(input, e);
                return;
            }
        };
        info!("Processing {} input: {}", kind.label(), input.display());

        let probe = embedded && kind == SourceKind::Directory;
        let Some(found) = self.process_artifact(input, kind, probe) else {
            return;
        };

        for candidate in found {
            self.process_embedded(&candidate);
        }
    }

    /// Catalogs a file from a directory tree if it is an archive. Files that
    /// are not archives are skipped; any other failure is recorded.
    fn process_embedded(&mut self, candidate: &Path) {
        match classify(candidate) {
            Ok(kind) if kind.is_archive() => {
                info!("Found {} file: {}", kind.label(), candidate.display());
                self.process_artifact(candidate, kind, false);
            }
            Ok(_) | Err(CatalogError::UnrecognizedInput(_)) => {}
            Err(e) => self.record_failure(candidate, e),
        }
    }

    /// Walks one artifact into its listing and records the outcome. Returns
    /// the embedded-archive candidates when the walk succeeded.
    fn process_artifact(
        &mut self,
        input: &Path,
        kind: SourceKind,
        probe: bool,
    ) -> Option<Vec<PathBuf>> {
        match self.catalog_artifact(input, kind, probe) {
            Ok(done) => {
                info!(
                    "Cataloged {} -> {} ({} entries, {} duplicates, {} skipped)",
                    input.display(),
                    done.listing.location.display(),
                    done.listing.inserted,
                    done.listing.duplicates,
                    done.walk.skipped
                );
                self.manifest.record(input, &done.listing.location);
                self.outcomes.push(ArtifactOutcome {
                    input: input.to_path_buf(),
                    status: ArtifactStatus::Cataloged {
                        kind,
                        listing: done.listing,
                        skipped: done.walk.skipped,
                    },
                });
                Some(done.embedded)
            }
            Err(e) => {
                self.record_failure(input, e);
                None
            }
        }
    }

    fn record_failure(&mut self, input: &Path, e: CatalogError) {
        error!("{}", e);
        self.outcomes.push(ArtifactOutcome {
            input: input.to_path_buf(),
            status: ArtifactStatus::Failed {
                kind: e.kind(),
                message: e.to_string(),
            },
        });
    }

    fn catalog_artifact(
        &mut self,
        input: &Path,
        kind: SourceKind,
        probe: bool,
    ) -> crate::error::Result<Cataloged> {
        // Open the source before creating its listing, so an unreadable
        // archive leaves nothing behind.
        let walker = open_walker(input, kind, Some(&self.run_dir))?;
        debug!("Opened {} walker for {}", walker.kind().label(), input.display());

        self.seq += 1;
        let listing_path = self.run_dir.join(listing_file_name(self.seq, input, kind));
        let mut store = ListingStore::create(&listing_path)?;
        debug!("Writing listing {}", store.location().display());

        let pb = create_spinner(self.quiet);
        let mut embedded = Vec::new();
        let walked = walker.walk(&mut |raw| {
            if probe {
                if let RawEntry::File { location, .. } = &raw {
                    embedded.push(location.clone());
                }
            }
            pb.inc(1);
            if pb.position() % PROGRESS_EVERY == 1 {
                pb.set_message(truncate_display(raw.path()));
            }
            store.insert(&normalize(raw))?;
            Ok(())
        });
        pb.finish_and_clear();

        match walked {
            Ok(walk) => Ok(Cataloged {
                listing: store.close()?,
                walk,
                embedded,
            }),
            Err(e) => {
                if let Err(cleanup) = store.discard() {
                    warn!("Could not remove partial listing: {}", cleanup);
                }
                Err(e)
            }
        }
    }

    /// Writes the manifest and returns the run report.
    pub fn finish(self) -> crate::error::Result<RunReport> {
        if self.manifest.is_empty() {
            warn!("No listings were produced");
        } else {
            debug!("Writing manifest with {} rows", self.manifest.len());
        }
        let manifest_path = self
            .manifest
            .finalize(&self.run_dir.join(MANIFEST_FILE_NAME))?;
        Ok(RunReport {
            output_dir: self.run_dir,
            manifest_path,
            artifacts: self.outcomes,
        })
    }
}

pub fn catalog(options: &CatalogOptions, quiet: bool) -> Result<RunReport> {
    let input = Path::new(&options.input);
    let started = Local::now();
    let start = Instant::now();

    let run_dir = create_run_dir(Path::new(&options.output), started)?;

    eprintln!("Start: {}", started.format("%Y-%m-%d %H:%M:%S"));
    eprintln!("Source: {}", input.display());
    eprintln!("Destination: {}", run_dir.display());

    let mut ctx = RunContext::new(run_dir, quiet);
    ctx.process_input(input, options.embedded);
    let report = ctx.finish()?;

    let elapsed = start.elapsed().as_secs_f64();
    let mut lines = vec![
        format!("Output: {}", report.output_dir.display()),
        format!("Manifest: {}", report.manifest_path.display()),
        format!("Runtime: {:.1}s", elapsed),
    ];
    for artifact in &report.artifacts {
        match &artifact.status {
            ArtifactStatus::Cataloged {
                listing, skipped, ..
            } => lines.push(format!(
                "OK   {} ({} entries, {} duplicates, {} skipped)",
                artifact.input.display(),
                listing.inserted,
                listing.duplicates,
                skipped
            )),
            ArtifactStatus::Failed { message, .. } => {
                lines.push(format!("FAIL {}: {}", artifact.input.display(), message))
            }
        }
    }

    let color = if report.failures() == 0 {
        "\x1b[32m"
    } else {
        "\x1b[33m"
    };
    print_box("Catalog Complete", &lines, color);

    Ok(report)
}
