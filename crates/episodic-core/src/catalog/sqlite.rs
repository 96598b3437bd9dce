//! SQLite-backed catalog.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use crate::error::{EpisodicError, Result};
use crate::types::{
    Episode, EpisodeId, EpisodeSpec, MediaFile, MediaFileId, NewMediaFile, ParsedCandidate,
    Quality, QualityType, Series, SeriesId,
};

use super::{Catalog, NewEpisode, NewSeries};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS series (
    id      INTEGER PRIMARY KEY,
    title   TEXT NOT NULL,
    path    TEXT NOT NULL UNIQUE,
    daily   INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS media_files (
    id          INTEGER PRIMARY KEY,
    series_id   INTEGER NOT NULL REFERENCES series(id) ON DELETE CASCADE,
    size        INTEGER NOT NULL,
    quality     TEXT NOT NULL,
    proper      INTEGER NOT NULL DEFAULT 0,
    date_added  TEXT NOT NULL,
    path        TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS episodes (
    id              INTEGER PRIMARY KEY,
    series_id       INTEGER NOT NULL REFERENCES series(id) ON DELETE CASCADE,
    season          INTEGER NOT NULL,
    number          INTEGER NOT NULL,
    air_date        TEXT,
    media_file_id   INTEGER REFERENCES media_files(id) ON DELETE SET NULL,
    UNIQUE (series_id, season, number)
);
CREATE INDEX IF NOT EXISTS idx_episodes_air_date ON episodes(series_id, air_date);
";

const EPISODE_COLUMNS: &str = "id, series_id, season, number, air_date, media_file_id";
const MEDIA_FILE_COLUMNS: &str = "id, series_id, size, quality, proper, date_added, path";
const AIR_DATE_FORMAT: &str = "%Y-%m-%d";

/// [`Catalog`] stored in a SQLite database.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Opening catalog");
        Self::init(Connection::open(path)?)
    }

    /// Opens a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for SqliteCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCatalog").finish_non_exhaustive()
    }
}

/// Raw `episodes` row before date parsing.
struct EpisodeRow {
    id: i64,
    series_id: i64,
    season: u32,
    number: u32,
    air_date: Option<String>,
    media_file_id: Option<i64>,
}

impl EpisodeRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            series_id: row.get(1)?,
            season: row.get(2)?,
            number: row.get(3)?,
            air_date: row.get(4)?,
            media_file_id: row.get(5)?,
        })
    }

    fn into_episode(self) -> Result<Episode> {
        let air_date = self
            .air_date
            .map(|raw| {
                NaiveDate::parse_from_str(&raw, AIR_DATE_FORMAT)
                    .map_err(|e| EpisodicError::Catalog(format!("bad air date {raw:?}: {e}")))
            })
            .transpose()?;
        Ok(Episode {
            id: EpisodeId(self.id),
            series_id: SeriesId(self.series_id),
            season: self.season,
            number: self.number,
            air_date,
            media_file_id: self.media_file_id.map(MediaFileId),
        })
    }
}

/// Raw `media_files` row before quality and timestamp parsing.
struct MediaFileRow {
    id: i64,
    series_id: i64,
    size: i64,
    quality: String,
    proper: bool,
    date_added: String,
    path: String,
}

impl MediaFileRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            series_id: row.get(1)?,
            size: row.get(2)?,
            quality: row.get(3)?,
            proper: row.get(4)?,
            date_added: row.get(5)?,
            path: row.get(6)?,
        })
    }

    fn into_media_file(self) -> Result<MediaFile> {
        let kind = QualityType::from_name(&self.quality)
            .ok_or_else(|| EpisodicError::Catalog(format!("unknown quality {:?}", self.quality)))?;
        let date_added = DateTime::parse_from_rfc3339(&self.date_added)
            .map_err(|e| {
                EpisodicError::Catalog(format!("bad timestamp {:?}: {e}", self.date_added))
            })?
            .with_timezone(&Utc);
        let size = u64::try_from(self.size)
            .map_err(|_| EpisodicError::Catalog(format!("negative file size {}", self.size)))?;
        Ok(MediaFile {
            id: MediaFileId(self.id),
            series_id: SeriesId(self.series_id),
            size,
            quality: Quality::new(kind, self.proper),
            date_added,
            path: PathBuf::from(self.path),
        })
    }
}

fn series_from_row(row: &Row<'_>) -> rusqlite::Result<Series> {
    Ok(Series {
        id: SeriesId(row.get(0)?),
        title: row.get(1)?,
        path: PathBuf::from(row.get::<_, String>(2)?),
        daily: row.get(3)?,
    })
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl Catalog for SqliteCatalog {
    fn media_file_exists(&self, path: &Path) -> Result<bool> {
        let exists = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM media_files WHERE path = ?1)",
            params![path_text(path)],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn find_episodes_for_candidate(&self, candidate: &ParsedCandidate) -> Result<Vec<Episode>> {
        let conn = self.conn();
        let series = candidate.series_id.0;

        let rows = match &candidate.episodes {
            EpisodeSpec::Daily(date) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {EPISODE_COLUMNS} FROM episodes
                     WHERE series_id = ?1 AND air_date = ?2 ORDER BY id"
                ))?;
                let rows = stmt
                    .query_map(
                        params![series, date.format(AIR_DATE_FORMAT).to_string()],
                        EpisodeRow::from_row,
                    )?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            spec => {
                let season = spec.season().unwrap_or_default();
                let mut stmt = conn.prepare(&format!(
                    "SELECT {EPISODE_COLUMNS} FROM episodes
                     WHERE series_id = ?1 AND season = ?2 AND number = ?3"
                ))?;
                let mut rows = Vec::new();
                for number in spec.episode_numbers() {
                    if let Some(row) = stmt
                        .query_row(params![series, season, number], EpisodeRow::from_row)
                        .optional()?
                    {
                        rows.push(row);
                    }
                }
                rows
            }
        };

        rows.into_iter().map(EpisodeRow::into_episode).collect()
    }

    fn media_file(&self, id: MediaFileId) -> Result<Option<MediaFile>> {
        let row = self
            .conn()
            .query_row(
                &format!("SELECT {MEDIA_FILE_COLUMNS} FROM media_files WHERE id = ?1"),
                params![id.0],
                MediaFileRow::from_row,
            )
            .optional()?;
        row.map(MediaFileRow::into_media_file).transpose()
    }

    fn persist_media_file(&self, file: NewMediaFile, linked: &[EpisodeId]) -> Result<MediaFile> {
        if linked.is_empty() {
            return Err(EpisodicError::Catalog(
                "media file must be linked to at least one episode".into(),
            ));
        }
        let size = i64::try_from(file.size)
            .map_err(|_| EpisodicError::Catalog(format!("file too large: {}", file.size)))?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO media_files (series_id, size, quality, proper, date_added, path)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                file.series_id.0,
                size,
                file.quality.kind.name(),
                file.quality.proper,
                file.date_added.to_rfc3339(),
                path_text(&file.path),
            ],
        )?;
        let id = MediaFileId(tx.last_insert_rowid());

        for episode in linked {
            let updated = tx.execute(
                "UPDATE episodes SET media_file_id = ?1 WHERE id = ?2",
                params![id.0, episode.0],
            )?;
            if updated != 1 {
                // dropping the transaction rolls the insert back
                return Err(EpisodicError::Catalog(format!("unknown episode {episode}")));
            }
        }
        tx.commit()?;

        debug!(file_id = %id, episodes = linked.len(), "Persisted media file");
        Ok(file.into_stored(id))
    }

    fn update_episode_file_link(
        &self,
        episode: EpisodeId,
        file: Option<MediaFileId>,
    ) -> Result<()> {
        let updated = self.conn().execute(
            "UPDATE episodes SET media_file_id = ?1 WHERE id = ?2",
            params![file.map(|id| id.0), episode.0],
        )?;
        if updated == 0 {
            return Err(EpisodicError::Catalog(format!("unknown episode {episode}")));
        }
        Ok(())
    }

    fn delete_media_file(&self, id: MediaFileId) -> Result<()> {
        self.conn()
            .execute("DELETE FROM media_files WHERE id = ?1", params![id.0])?;
        Ok(())
    }

    fn add_series(&self, series: NewSeries) -> Result<Series> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO series (title, path, daily) VALUES (?1, ?2, ?3)",
            params![series.title, path_text(&series.path), series.daily],
        )?;
        Ok(Series {
            id: SeriesId(conn.last_insert_rowid()),
            title: series.title,
            path: series.path,
            daily: series.daily,
        })
    }

    fn add_episode(&self, episode: NewEpisode) -> Result<Episode> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO episodes (series_id, season, number, air_date) VALUES (?1, ?2, ?3, ?4)",
            params![
                episode.series_id.0,
                episode.season,
                episode.number,
                episode
                    .air_date
                    .map(|d| d.format(AIR_DATE_FORMAT).to_string()),
            ],
        )?;
        Ok(Episode {
            id: EpisodeId(conn.last_insert_rowid()),
            series_id: episode.series_id,
            season: episode.season,
            number: episode.number,
            air_date: episode.air_date,
            media_file_id: None,
        })
    }

    fn series(&self, id: SeriesId) -> Result<Option<Series>> {
        let series = self
            .conn()
            .query_row(
                "SELECT id, title, path, daily FROM series WHERE id = ?1",
                params![id.0],
                series_from_row,
            )
            .optional()?;
        Ok(series)
    }

    fn all_series(&self) -> Result<Vec<Series>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, title, path, daily FROM series ORDER BY id")?;
        let series = stmt
            .query_map([], series_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(series)
    }

    fn episodes_for_series(&self, series: SeriesId) -> Result<Vec<Episode>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EPISODE_COLUMNS} FROM episodes
             WHERE series_id = ?1 ORDER BY season, number"
        ))?;
        let rows = stmt
            .query_map(params![series.0], EpisodeRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(EpisodeRow::into_episode).collect()
    }

    fn media_files_for_series(&self, series: SeriesId) -> Result<Vec<MediaFile>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MEDIA_FILE_COLUMNS} FROM media_files WHERE series_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![series.0], MediaFileRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(MediaFileRow::into_media_file).collect()
    }
}
