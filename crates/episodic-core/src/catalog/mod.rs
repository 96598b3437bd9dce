//! # Catalog
//!
//! Persistence boundary for series, episodes and media file records.
//!
//! The import engine needs only a handful of these operations; the rest
//! exist for the scanner and the command-line tool. Implementations must
//! make [`Catalog::persist_media_file`] atomic: either the record exists and
//! every listed episode points at it, or nothing changed.

pub mod memory;
pub mod sqlite;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{
    Episode, EpisodeId, EpisodeSpec, MediaFile, MediaFileId, NewMediaFile, ParsedCandidate,
    Series, SeriesId,
};

pub use memory::MemoryCatalog;
pub use sqlite::SqliteCatalog;

/// A series that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSeries {
    pub title: String,
    pub path: PathBuf,
    pub daily: bool,
}

/// An episode that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEpisode {
    pub series_id: SeriesId,
    pub season: u32,
    pub number: u32,
    pub air_date: Option<NaiveDate>,
}

/// Storage for series, episodes and media files.
pub trait Catalog: Send + Sync {
    /// Returns `true` if a media file record already points at `path`.
    fn media_file_exists(&self, path: &Path) -> Result<bool>;

    /// Episodes addressed by the candidate, in the order the candidate lists
    /// them. Numbers with no catalog entry are left out.
    fn find_episodes_for_candidate(&self, candidate: &ParsedCandidate) -> Result<Vec<Episode>>;

    /// Looks a media file record up by id.
    fn media_file(&self, id: MediaFileId) -> Result<Option<MediaFile>>;

    /// Stores `file` and links every episode in `linked` to it, atomically.
    ///
    /// Fails without side effects when `linked` is empty or names an
    /// unknown episode.
    fn persist_media_file(&self, file: NewMediaFile, linked: &[EpisodeId]) -> Result<MediaFile>;

    /// Points an episode at a file, or clears its link with `None`.
    fn update_episode_file_link(&self, episode: EpisodeId, file: Option<MediaFileId>)
    -> Result<()>;

    /// Removes a media file record. Episodes still pointing at it are unlinked.
    fn delete_media_file(&self, id: MediaFileId) -> Result<()>;

    /// Stores a new series.
    fn add_series(&self, series: NewSeries) -> Result<Series>;

    /// Stores a new episode with no file.
    fn add_episode(&self, episode: NewEpisode) -> Result<Episode>;

    /// Looks a series up by id.
    fn series(&self, id: SeriesId) -> Result<Option<Series>>;

    /// Every series, ordered by id.
    fn all_series(&self) -> Result<Vec<Series>>;

    /// Every episode of a series, ordered by season and number.
    fn episodes_for_series(&self, series: SeriesId) -> Result<Vec<Episode>>;

    /// Every media file record of a series, ordered by id.
    fn media_files_for_series(&self, series: SeriesId) -> Result<Vec<MediaFile>>;
}

/// Picks the episodes a candidate addresses out of a series' episode list.
///
/// Shared by implementations that load a series' episodes up front.
pub(crate) fn select_episodes(spec: &EpisodeSpec, episodes: &[Episode]) -> Vec<Episode> {
    match spec {
        EpisodeSpec::Daily(date) => episodes
            .iter()
            .filter(|ep| ep.air_date == Some(*date))
            .cloned()
            .collect(),
        _ => {
            let season = spec.season().unwrap_or_default();
            spec.episode_numbers()
                .into_iter()
                .filter_map(|number| {
                    episodes
                        .iter()
                        .find(|ep| ep.season == season && ep.number == number)
                        .cloned()
                })
                .collect()
        }
    }
}
