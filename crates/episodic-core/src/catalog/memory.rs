//! In-process catalog used by tests and dry runs.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{EpisodicError, Result};
use crate::types::{
    Episode, EpisodeId, MediaFile, MediaFileId, NewMediaFile, ParsedCandidate, Series, SeriesId,
};

use super::{Catalog, NewEpisode, NewSeries, select_episodes};

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    series: BTreeMap<SeriesId, Series>,
    episodes: BTreeMap<EpisodeId, Episode>,
    files: BTreeMap<MediaFileId, MediaFile>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// [`Catalog`] kept entirely in memory behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: Mutex<State>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Looks an episode up by id.
    pub fn episode(&self, id: EpisodeId) -> Option<Episode> {
        self.lock().episodes.get(&id).cloned()
    }

    /// Number of stored media file records.
    pub fn media_file_count(&self) -> usize {
        self.lock().files.len()
    }
}

impl Catalog for MemoryCatalog {
    fn media_file_exists(&self, path: &Path) -> Result<bool> {
        Ok(self.lock().files.values().any(|f| f.path == path))
    }

    fn find_episodes_for_candidate(&self, candidate: &ParsedCandidate) -> Result<Vec<Episode>> {
        let state = self.lock();
        let episodes: Vec<Episode> = state
            .episodes
            .values()
            .filter(|ep| ep.series_id == candidate.series_id)
            .cloned()
            .collect();
        Ok(select_episodes(&candidate.episodes, &episodes))
    }

    fn media_file(&self, id: MediaFileId) -> Result<Option<MediaFile>> {
        Ok(self.lock().files.get(&id).cloned())
    }

    fn persist_media_file(&self, file: NewMediaFile, linked: &[EpisodeId]) -> Result<MediaFile> {
        if linked.is_empty() {
            return Err(EpisodicError::Catalog(
                "media file must be linked to at least one episode".into(),
            ));
        }

        let mut state = self.lock();
        if let Some(missing) = linked.iter().find(|id| !state.episodes.contains_key(*id)) {
            return Err(EpisodicError::Catalog(format!("unknown episode {missing}")));
        }
        if state.files.values().any(|f| f.path == file.path) {
            return Err(EpisodicError::Catalog(format!(
                "media file already registered: {}",
                file.path.display()
            )));
        }

        let stored = file.into_stored(MediaFileId(state.next_id()));
        state.files.insert(stored.id, stored.clone());
        for id in linked {
            if let Some(ep) = state.episodes.get_mut(id) {
                ep.media_file_id = Some(stored.id);
            }
        }
        Ok(stored)
    }

    fn update_episode_file_link(
        &self,
        episode: EpisodeId,
        file: Option<MediaFileId>,
    ) -> Result<()> {
        let mut state = self.lock();
        let ep = state
            .episodes
            .get_mut(&episode)
            .ok_or_else(|| EpisodicError::Catalog(format!("unknown episode {episode}")))?;
        ep.media_file_id = file;
        Ok(())
    }

    fn delete_media_file(&self, id: MediaFileId) -> Result<()> {
        let mut state = self.lock();
        state.files.remove(&id);
        for ep in state.episodes.values_mut() {
            if ep.media_file_id == Some(id) {
                ep.media_file_id = None;
            }
        }
        Ok(())
    }

    fn add_series(&self, series: NewSeries) -> Result<Series> {
        let mut state = self.lock();
        let id = SeriesId(state.next_id());
        let stored = Series {
            id,
            title: series.title,
            path: series.path,
            daily: series.daily,
        };
        state.series.insert(id, stored.clone());
        Ok(stored)
    }

    fn add_episode(&self, episode: NewEpisode) -> Result<Episode> {
        let mut state = self.lock();
        if !state.series.contains_key(&episode.series_id) {
            return Err(EpisodicError::Catalog(format!(
                "unknown series {}",
                episode.series_id
            )));
        }
        let duplicate = state.episodes.values().any(|ep| {
            ep.series_id == episode.series_id
                && ep.season == episode.season
                && ep.number == episode.number
        });
        if duplicate {
            return Err(EpisodicError::Catalog(format!(
                "episode S{:02}E{:02} already exists",
                episode.season, episode.number
            )));
        }

        let stored = Episode {
            id: EpisodeId(state.next_id()),
            series_id: episode.series_id,
            season: episode.season,
            number: episode.number,
            air_date: episode.air_date,
            media_file_id: None,
        };
        state.episodes.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn series(&self, id: SeriesId) -> Result<Option<Series>> {
        Ok(self.lock().series.get(&id).cloned())
    }

    fn all_series(&self) -> Result<Vec<Series>> {
        Ok(self.lock().series.values().cloned().collect())
    }

    fn episodes_for_series(&self, series: SeriesId) -> Result<Vec<Episode>> {
        let mut episodes: Vec<Episode> = self
            .lock()
            .episodes
            .values()
            .filter(|ep| ep.series_id == series)
            .cloned()
            .collect();
        episodes.sort_by_key(|ep| (ep.season, ep.number));
        Ok(episodes)
    }

    fn media_files_for_series(&self, series: SeriesId) -> Result<Vec<MediaFile>> {
        Ok(self
            .lock()
            .files
            .values()
            .filter(|f| f.series_id == series)
            .cloned()
            .collect())
    }
}
