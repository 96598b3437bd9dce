//! Maps a file to the catalog episodes it claims to contain.

use std::path::Path;

use tracing::trace;

use crate::catalog::Catalog;
use crate::disk::DiskProvider;
use crate::error::Result;
use crate::types::{Episode, ParsedCandidate, Series};

/// Identifies candidate files against the catalog.
pub struct EpisodeResolver<'a> {
    catalog: &'a dyn Catalog,
    disk: &'a dyn DiskProvider,
}

impl<'a> EpisodeResolver<'a> {
    pub fn new(catalog: &'a dyn Catalog, disk: &'a dyn DiskProvider) -> Self {
        Self { catalog, disk }
    }

    /// A file outside the series root came from a download folder, so only
    /// its filename can be trusted for identification.
    pub fn is_scene_source(&self, series: &Series, path: &Path) -> bool {
        let scene = !self.disk.is_path_under_root(path, &series.path);
        trace!(
            path = %path.display(),
            root = %series.path.display(),
            scene,
            "Resolved file origin"
        );
        scene
    }

    /// Catalog episodes addressed by `candidate`, in candidate order and
    /// without duplicates. Empty when none are known.
    pub fn resolve(&self, candidate: &ParsedCandidate) -> Result<Vec<Episode>> {
        let mut episodes = self.catalog.find_episodes_for_candidate(candidate)?;
        let mut seen = Vec::with_capacity(episodes.len());
        episodes.retain(|ep| {
            if seen.contains(&ep.id) {
                false
            } else {
                seen.push(ep.id);
                true
            }
        });
        Ok(episodes)
    }
}
