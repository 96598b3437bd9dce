use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::quality::Quality;

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

catalog_id!(
    /// Catalog identifier of a series.
    SeriesId
);
catalog_id!(
    /// Catalog identifier of an episode.
    EpisodeId
);
catalog_id!(
    /// Catalog identifier of a media file record.
    MediaFileId
);

/// A show in the library. Read-only to the import engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub id: SeriesId,
    pub title: String,
    /// Canonical storage root; files outside it are scene-sourced.
    pub path: PathBuf,
    /// Date-addressed rather than season/episode-addressed.
    pub daily: bool,
}

/// One catalog episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    pub series_id: SeriesId,
    pub season: u32,
    pub number: u32,
    pub air_date: Option<NaiveDate>,
    /// The file currently satisfying this episode, if any.
    pub media_file_id: Option<MediaFileId>,
}

impl Episode {
    /// Returns `true` if the episode has no linked file.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.media_file_id.is_none()
    }
}

/// A file on disk registered in the catalog. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub id: MediaFileId,
    pub series_id: SeriesId,
    pub size: u64,
    pub quality: Quality,
    pub date_added: DateTime<Utc>,
    pub path: PathBuf,
}

/// A media file that has cleared the import decision but is not stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMediaFile {
    pub series_id: SeriesId,
    pub size: u64,
    pub quality: Quality,
    pub date_added: DateTime<Utc>,
    pub path: PathBuf,
}

impl NewMediaFile {
    /// Attaches the identifier assigned by the catalog.
    #[must_use]
    pub fn into_stored(self, id: MediaFileId) -> MediaFile {
        MediaFile {
            id,
            series_id: self.series_id,
            size: self.size,
            quality: self.quality,
            date_added: self.date_added,
            path: self.path,
        }
    }
}
