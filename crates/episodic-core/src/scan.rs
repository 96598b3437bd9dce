//! # Library Scanning
//!
//! Walks directory trees and feeds every video file through
//! [`ImportService::import_file`], one file at a time.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

use crate::error::Result;
use crate::import::{ImportOutcome, ImportService};
use crate::types::Series;

/// Per-scan counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Video files handed to the import engine.
    pub files: usize,
    pub imported: usize,
    /// Already registered, or not better than the current file.
    pub skipped: usize,
    /// Failed the size/runtime gate.
    pub rejected: usize,
    /// Unparseable, or no matching episodes.
    pub warned: usize,
    /// Collaborator errors.
    pub failed: usize,
    /// The scan stopped early on request.
    pub cancelled: bool,
}

impl ScanReport {
    /// Counts one import outcome.
    pub fn record(&mut self, outcome: &ImportOutcome) {
        self.files += 1;
        match outcome {
            ImportOutcome::Imported(_) => self.imported += 1,
            ImportOutcome::AlreadyExists | ImportOutcome::Skipped(_) => self.skipped += 1,
            ImportOutcome::Rejected { .. } => self.rejected += 1,
            ImportOutcome::NotParsed | ImportOutcome::NoEpisodes(_) => self.warned += 1,
        }
    }

    /// Counts one file whose import returned an error.
    pub fn record_failure(&mut self) {
        self.files += 1;
        self.failed += 1;
    }

    /// Adds the counts of `other` to this report.
    pub fn merge(&mut self, other: &ScanReport) {
        self.files += other.files;
        self.imported += other.imported;
        self.skipped += other.skipped;
        self.rejected += other.rejected;
        self.warned += other.warned;
        self.failed += other.failed;
        self.cancelled |= other.cancelled;
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files: {} imported, {} skipped, {} rejected, {} warned, {} failed",
            self.files, self.imported, self.skipped, self.rejected, self.warned, self.failed
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

/// Drives the import engine over directory trees.
pub struct LibraryScanner<'a> {
    service: &'a ImportService,
    follow_links: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> LibraryScanner<'a> {
    pub fn new(service: &'a ImportService) -> Self {
        Self {
            service,
            follow_links: false,
            cancel: None,
        }
    }

    /// Set whether to follow symbolic links
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Stops the scan before the next file once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Video files below `dir`, sorted by path. A missing directory yields
    /// nothing; unreadable entries are logged and skipped.
    pub fn collect_files(&self, dir: &Path) -> Vec<PathBuf> {
        if !dir.is_dir() {
            warn!(path = %dir.display(), "Scan root is not a directory");
            return Vec::new();
        }

        let config = self.service.config();
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).follow_links(self.follow_links) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && config.is_video_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        files
    }

    /// Imports every video file in the series root.
    pub fn scan_series(&self, series: &Series) -> ScanReport {
        self.scan_directory(series, &series.path)
    }

    /// Imports every video file below `dir` as a release of `series`.
    ///
    /// `dir` may lie outside the series root (a download folder); those
    /// files are identified by filename only.
    pub fn scan_directory(&self, series: &Series, dir: &Path) -> ScanReport {
        info!(series_id = %series.id, title = %series.title, path = %dir.display(), "Scanning");
        let files = self.collect_files(dir);
        let report = self.import_paths(series, &files);
        info!(series_id = %series.id, %report, "Scan finished");
        report
    }

    /// Imports the given files in order, stopping early when cancelled.
    pub fn import_paths(&self, series: &Series, paths: &[PathBuf]) -> ScanReport {
        let mut report = ScanReport::default();
        let disk = self.service.disk();

        for path in paths {
            if self.is_cancelled() {
                info!(series_id = %series.id, "Scan cancelled");
                report.cancelled = true;
                break;
            }
            if !disk.file_exists(path) {
                trace!(path = %path.display(), "File vanished before import");
                continue;
            }

            match self.service.import_file(series, path) {
                Ok(outcome) => {
                    debug!(
                        path = %path.display(),
                        imported = outcome.is_imported(),
                        "Processed file"
                    );
                    report.record(&outcome);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Import failed");
                    report.record_failure();
                }
            }
        }

        report
    }

    /// Scans the root of every series in the catalog.
    pub fn scan_all(&self) -> Result<ScanReport> {
        let mut total = ScanReport::default();
        for series in self.service.catalog().all_series()? {
            let report = self.scan_series(&series);
            total.merge(&report);
            if report.cancelled {
                break;
            }
        }
        Ok(total)
    }

    /// Drops catalog records of files that no longer exist on disk and
    /// unlinks their episodes. Returns the number of records removed.
    pub fn clean_missing(&self, series: &Series) -> Result<usize> {
        let catalog = self.service.catalog();
        let disk = self.service.disk();

        let missing: Vec<_> = catalog
            .media_files_for_series(series.id)?
            .into_iter()
            .filter(|file| !disk.file_exists(&file.path))
            .collect();
        if missing.is_empty() {
            return Ok(0);
        }

        let episodes = catalog.episodes_for_series(series.id)?;
        for file in &missing {
            for episode in episodes
                .iter()
                .filter(|ep| ep.media_file_id == Some(file.id))
            {
                catalog.update_episode_file_link(episode.id, None)?;
            }
            catalog.delete_media_file(file.id)?;
            info!(
                path = %file.path.display(),
                file_id = %file.id,
                "Removed missing file from catalog"
            );
        }

        Ok(missing.len())
    }
}
