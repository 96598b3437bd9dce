use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which catalog episode(s) a file claims to contain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpisodeSpec {
    /// Single episode: "S03E01", "3x01"
    Single {
        /// Season number (0 for specials).
        season: u32,
        /// Episode number within the season.
        episode: u32,
    },

    /// Multi-part file: "S03E01E02", "S03E01-E03"
    Multi {
        /// Season number shared by every part.
        season: u32,
        /// Episode numbers in file order, deduplicated.
        episodes: Vec<u32>,
    },

    /// Daily show addressed by air date: "2012.01.15"
    Daily(NaiveDate),
}

impl EpisodeSpec {
    /// Builds a spec from a season and a list of episode numbers, collapsing
    /// to `Single` when only one distinct episode is present.
    #[must_use]
    pub fn numbered(season: u32, episodes: &[u32]) -> Option<Self> {
        let mut unique: Vec<u32> = Vec::with_capacity(episodes.len());
        for &ep in episodes {
            if !unique.contains(&ep) {
                unique.push(ep);
            }
        }
        match unique.as_slice() {
            [] => None,
            [episode] => Some(Self::Single {
                season,
                episode: *episode,
            }),
            _ => Some(Self::Multi {
                season,
                episodes: unique,
            }),
        }
    }

    /// Season number, if the spec is season based.
    #[must_use]
    pub fn season(&self) -> Option<u32> {
        match self {
            Self::Single { season, .. } | Self::Multi { season, .. } => Some(*season),
            Self::Daily(_) => None,
        }
    }

    /// Episode numbers claimed by the file; empty for daily specs.
    #[must_use]
    pub fn episode_numbers(&self) -> Vec<u32> {
        match self {
            Self::Single { episode, .. } => vec![*episode],
            Self::Multi { episodes, .. } => episodes.clone(),
            Self::Daily(_) => Vec::new(),
        }
    }

    /// Air date for daily specs.
    #[must_use]
    pub fn air_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Daily(date) => Some(*date),
            _ => None,
        }
    }

    /// Season zero or an episode numbered zero.
    #[must_use]
    pub fn is_special(&self) -> bool {
        match self {
            Self::Single { season, episode } => *season == 0 || *episode == 0,
            Self::Multi { season, episodes } => *season == 0 || episodes.contains(&0),
            Self::Daily(_) => false,
        }
    }
}

impl fmt::Display for EpisodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single { season, episode } => write!(f, "S{season:02}E{episode:02}"),
            Self::Multi { season, episodes } => {
                write!(f, "S{season:02}")?;
                for ep in episodes {
                    write!(f, "E{ep:02}")?;
                }
                Ok(())
            }
            Self::Daily(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}
