use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::episode::EpisodeSpec;
use super::library::SeriesId;
use super::quality::Quality;

/// The output of a [`FilenameParser`](crate::parser::FilenameParser).
///
/// Describes which series and episode(s) a file on disk claims to be, and
/// the quality it was released at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCandidate {
    /// Path the candidate was parsed from.
    pub path: PathBuf,

    /// Series the file was matched against.
    pub series_id: SeriesId,

    /// Show title as written in the filename, normalized.
    pub title: Option<String>,

    /// Episode(s) the file claims to contain.
    pub episodes: EpisodeSpec,

    /// Proposed quality, including the proper/repack flag.
    pub quality: Quality,

    /// Release group (e.g. "HELLYWOOD").
    pub release_group: Option<String>,

    /// The file lives outside the series root; identification came from the
    /// filename rather than the folder layout.
    pub scene_source: bool,
}

impl ParsedCandidate {
    /// Creates a candidate with no title or release group.
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        series_id: SeriesId,
        episodes: EpisodeSpec,
        quality: Quality,
        scene_source: bool,
    ) -> Self {
        Self {
            path: path.into(),
            series_id,
            title: None,
            episodes,
            quality,
            release_group: None,
            scene_source,
        }
    }

    /// Returns `true` if the candidate addresses a special.
    #[must_use]
    pub fn is_special(&self) -> bool {
        self.episodes.is_special()
    }
}

impl std::fmt::Display for ParsedCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ParsedCandidate(")?;
        if let Some(ref title) = self.title {
            write!(f, "title={title:?}, ")?;
        }
        write!(f, "ep={}, quality={}", self.episodes, self.quality)?;
        if self.scene_source {
            write!(f, ", scene")?;
        }
        write!(f, ")")
    }
}
