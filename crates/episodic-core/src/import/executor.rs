//! Registers an accepted candidate and cleans up the files it supersedes.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::disk::DiskProvider;
use crate::error::Result;
use crate::types::{EpisodeId, MediaFile, NewMediaFile, ParsedCandidate};

use super::decision::{EpisodeDecision, any_accepts};

/// Applies a set of episode decisions to the catalog and the disk.
pub struct ImportExecutor<'a> {
    catalog: &'a dyn Catalog,
    disk: &'a dyn DiskProvider,
}

impl<'a> ImportExecutor<'a> {
    pub fn new(catalog: &'a dyn Catalog, disk: &'a dyn DiskProvider) -> Self {
        Self { catalog, disk }
    }

    /// Imports `candidate` for every matched episode.
    ///
    /// Returns `Ok(None)` without touching anything when every decision is a
    /// skip. Otherwise one record is created and linked to all episodes in a
    /// single catalog call; superseded files are trashed afterwards, each at
    /// most once. A failed catalog write leaves the disk untouched.
    pub fn execute(
        &self,
        candidate: &ParsedCandidate,
        size: u64,
        decisions: &[EpisodeDecision],
    ) -> Result<Option<MediaFile>> {
        if !any_accepts(decisions) {
            return Ok(None);
        }

        let mut linked: Vec<EpisodeId> = Vec::with_capacity(decisions.len());
        for d in decisions {
            if !linked.contains(&d.episode.id) {
                linked.push(d.episode.id);
            }
        }

        let file = NewMediaFile {
            series_id: candidate.series_id,
            size,
            quality: candidate.quality,
            date_added: Utc::now(),
            path: candidate.path.clone(),
        };
        let stored = self.catalog.persist_media_file(file, &linked)?;
        info!(
            path = %stored.path.display(),
            file_id = %stored.id,
            quality = %stored.quality,
            episodes = linked.len(),
            "Imported media file"
        );

        let mut trashed = BTreeSet::new();
        for previous in decisions.iter().filter_map(|d| d.current.as_ref()) {
            if previous.id == stored.id || !trashed.insert(previous.id) {
                continue;
            }
            self.remove_superseded(previous);
        }

        Ok(Some(stored))
    }

    /// The import already committed, so failures here are logged rather than
    /// returned.
    fn remove_superseded(&self, previous: &MediaFile) {
        debug!(
            path = %previous.path.display(),
            file_id = %previous.id,
            quality = %previous.quality,
            "Removing superseded file"
        );

        if self.disk.file_exists(&previous.path) {
            if let Err(e) = self.disk.delete_file(&previous.path) {
                warn!(
                    path = %previous.path.display(),
                    error = %e,
                    "Failed to trash superseded file"
                );
            }
        }
        if let Err(e) = self.catalog.delete_media_file(previous.id) {
            warn!(file_id = %previous.id, error = %e, "Failed to remove superseded file record");
        }
    }
}
