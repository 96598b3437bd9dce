//! # Import Engine
//!
//! Decides whether a file on disk becomes the current file of one or more
//! catalog episodes.
//!
//! ## Pipeline
//!
//! 1. **Registration check**: paths already in the catalog are left alone.
//! 2. **Heuristic gate**: undersized, short files are rejected unless they
//!    turn out to be specials. Runtime is probed only for small files.
//! 3. **Parsing**: the filename (and, inside the series root, its folder)
//!    becomes a [`ParsedCandidate`].
//! 4. **Resolution**: the candidate is matched against catalog episodes.
//! 5. **Decision**: each episode imports, replaces or skips; any acceptance
//!    imports the file for all of them.
//! 6. **Execution**: one record, linked to every matched episode, and the
//!    superseded files are trashed.

pub mod decision;
pub mod executor;
pub mod gate;
pub mod resolver;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{debug, trace, warn};

use crate::catalog::Catalog;
use crate::config::ImportConfig;
use crate::disk::DiskProvider;
use crate::error::Result;
use crate::parser::FilenameParser;
use crate::probe::RuntimeProber;
use crate::types::{Episode, MediaFile, MediaFileId, ParsedCandidate, Series, SeriesId};

pub use decision::{Decision, EpisodeDecision, any_accepts};
pub use executor::ImportExecutor;
pub use gate::{GateVerdict, HeuristicGate};
pub use resolver::EpisodeResolver;

/// Result of [`ImportService::import_file`].
///
/// Only `Imported` changed anything; every other variant explains why the
/// file was left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The file is now the current file of every matched episode.
    Imported(MediaFile),
    /// A media file record already points at this path.
    AlreadyExists,
    /// Too small and too short to be a real episode.
    Rejected { size: u64, runtime_secs: u64 },
    /// The filename could not be identified as this series.
    NotParsed,
    /// Parsed, but none of the episodes exist in the catalog.
    NoEpisodes(ParsedCandidate),
    /// Every matched episode already has an equal or better file.
    Skipped(ParsedCandidate),
}

impl ImportOutcome {
    #[must_use]
    pub fn is_imported(&self) -> bool {
        matches!(self, ImportOutcome::Imported(_))
    }

    /// The created record, if the file was imported.
    #[must_use]
    pub fn media_file(&self) -> Option<&MediaFile> {
        match self {
            ImportOutcome::Imported(file) => Some(file),
            _ => None,
        }
    }
}

/// Runs the import pipeline over injected collaborators.
///
/// Safe to share between threads: imports for the same series are
/// serialized, imports for different series run independently.
pub struct ImportService {
    config: ImportConfig,
    gate: HeuristicGate,
    parser: Arc<dyn FilenameParser>,
    catalog: Arc<dyn Catalog>,
    disk: Arc<dyn DiskProvider>,
    prober: Arc<dyn RuntimeProber>,
    series_locks: Mutex<HashMap<SeriesId, Arc<Mutex<()>>>>,
}

impl ImportService {
    pub fn new(
        config: ImportConfig,
        parser: Arc<dyn FilenameParser>,
        catalog: Arc<dyn Catalog>,
        disk: Arc<dyn DiskProvider>,
        prober: Arc<dyn RuntimeProber>,
    ) -> Self {
        Self {
            gate: HeuristicGate::from_config(&config),
            config,
            parser,
            catalog,
            disk,
            prober,
            series_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn disk(&self) -> &Arc<dyn DiskProvider> {
        &self.disk
    }

    /// Decides whether `path` is imported for `series`, and does it.
    ///
    /// # Errors
    ///
    /// Collaborator failures (disk, catalog, parser) are returned for this
    /// file only. A failed probe is not an error; the runtime counts as zero.
    pub fn import_file(&self, series: &Series, path: &Path) -> Result<ImportOutcome> {
        let lock = self.series_lock(series.id);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if self.catalog.media_file_exists(path)? {
            trace!(path = %path.display(), "File already registered");
            return Ok(ImportOutcome::AlreadyExists);
        }

        let size = self.disk.file_size(path)?;
        let verdict = self.gate.check(size, || self.probe_runtime(path));

        let resolver = EpisodeResolver::new(self.catalog.as_ref(), self.disk.as_ref());
        let scene_source = resolver.is_scene_source(series, path);
        let parsed = self.parser.parse(path, series, scene_source)?;

        if let GateVerdict::Undersized { size, runtime_secs } = verdict {
            let special = parsed.as_ref().is_some_and(ParsedCandidate::is_special);
            if !verdict.admits(special) {
                debug!(path = %path.display(), size, runtime_secs, "Rejected undersized file");
                return Ok(ImportOutcome::Rejected { size, runtime_secs });
            }
            debug!(path = %path.display(), size, runtime_secs, "Undersized special admitted");
        }

        let Some(candidate) = parsed else {
            warn!(path = %path.display(), series_id = %series.id, "Unable to parse file");
            return Ok(ImportOutcome::NotParsed);
        };

        let episodes = resolver.resolve(&candidate)?;
        if episodes.is_empty() {
            warn!(
                path = %path.display(),
                series_id = %series.id,
                episodes = %candidate.episodes,
                "No matching episodes in catalog"
            );
            return Ok(ImportOutcome::NoEpisodes(candidate));
        }

        let decisions = self.decide(&candidate, episodes)?;
        let executor = ImportExecutor::new(self.catalog.as_ref(), self.disk.as_ref());
        match executor.execute(&candidate, size, &decisions)? {
            Some(file) => Ok(ImportOutcome::Imported(file)),
            None => {
                debug!(
                    path = %path.display(),
                    quality = %candidate.quality,
                    "Existing files are equal or better"
                );
                Ok(ImportOutcome::Skipped(candidate))
            }
        }
    }

    /// Pairs each episode with its current file and the verdict for the
    /// candidate. Files shared by several episodes are looked up once.
    fn decide(
        &self,
        candidate: &ParsedCandidate,
        episodes: Vec<Episode>,
    ) -> Result<Vec<EpisodeDecision>> {
        let mut files: HashMap<MediaFileId, Option<MediaFile>> = HashMap::new();
        let mut decisions = Vec::with_capacity(episodes.len());

        for episode in episodes {
            let current = match episode.media_file_id {
                Some(id) => match files.get(&id) {
                    Some(cached) => cached.clone(),
                    None => {
                        let file = self.catalog.media_file(id)?;
                        if file.is_none() {
                            debug!(
                                episode_id = %episode.id,
                                file_id = %id,
                                "Linked file record is gone"
                            );
                        }
                        files.insert(id, file.clone());
                        file
                    }
                },
                None => None,
            };

            let decision = EpisodeDecision::new(
                &self.config.quality_table,
                episode,
                current,
                candidate.quality,
            );
            trace!(
                episode_id = %decision.episode.id,
                decision = %decision.decision,
                "Episode decision"
            );
            decisions.push(decision);
        }

        Ok(decisions)
    }

    fn probe_runtime(&self, path: &Path) -> u64 {
        match self.prober.probe_runtime_seconds(path) {
            Ok(secs) => secs,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Runtime probe failed, assuming zero");
                0
            }
        }
    }

    fn series_lock(&self, series: SeriesId) -> Arc<Mutex<()>> {
        let mut locks = self
            .series_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(series).or_default())
    }
}

impl std::fmt::Debug for ImportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportService")
            .field("config", &self.config)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}
