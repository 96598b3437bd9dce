use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EpisodicError, Result};

/// Quality level of a release, as proposed by the filename parser.
///
/// The declaration order carries no meaning: ranking always goes through a
/// [`QualityTable`], so new levels can be appended without reshuffling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityType {
    #[serde(rename = "Unknown")]
    Unknown,
    #[serde(rename = "SDTV")]
    SDTV,
    #[serde(rename = "DVD")]
    DVD,
    #[serde(rename = "HDTV-720p")]
    HDTV720p,
    #[serde(rename = "WEBDL-720p")]
    WEBDL720p,
    #[serde(rename = "Bluray-720p")]
    Bluray720p,
    #[serde(rename = "HDTV-1080p")]
    HDTV1080p,
    #[serde(rename = "WEBDL-1080p")]
    WEBDL1080p,
    #[serde(rename = "Bluray-1080p")]
    Bluray1080p,
    #[serde(rename = "HDTV-2160p")]
    HDTV2160p,
    #[serde(rename = "WEBDL-2160p")]
    WEBDL2160p,
    #[serde(rename = "Bluray-2160p")]
    Bluray2160p,
}

impl QualityType {
    /// Every known level, in default rank order.
    pub const ALL: [QualityType; 12] = [
        Self::Unknown,
        Self::SDTV,
        Self::DVD,
        Self::HDTV720p,
        Self::WEBDL720p,
        Self::Bluray720p,
        Self::HDTV1080p,
        Self::WEBDL1080p,
        Self::Bluray1080p,
        Self::HDTV2160p,
        Self::WEBDL2160p,
        Self::Bluray2160p,
    ];

    /// Stable display/storage name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::SDTV => "SDTV",
            Self::DVD => "DVD",
            Self::HDTV720p => "HDTV-720p",
            Self::WEBDL720p => "WEBDL-720p",
            Self::Bluray720p => "Bluray-720p",
            Self::HDTV1080p => "HDTV-1080p",
            Self::WEBDL1080p => "WEBDL-1080p",
            Self::Bluray1080p => "Bluray-1080p",
            Self::HDTV2160p => "HDTV-2160p",
            Self::WEBDL2160p => "WEBDL-2160p",
            Self::Bluray2160p => "Bluray-2160p",
        }
    }

    /// Looks a level up by its storage name (case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|q| q.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for QualityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A quality level together with its proper/repack modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quality {
    /// The quality level.
    pub kind: QualityType,
    /// Whether the release is a proper or repack.
    pub proper: bool,
}

impl Quality {
    /// Creates a new quality value.
    #[must_use]
    pub const fn new(kind: QualityType, proper: bool) -> Self {
        Self { kind, proper }
    }

    /// Shorthand for a non-proper release of `kind`.
    #[must_use]
    pub const fn plain(kind: QualityType) -> Self {
        Self::new(kind, false)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::plain(QualityType::Unknown)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.proper {
            write!(f, "{} Proper", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

/// Total order over quality levels.
///
/// Rank is the position in the table; `proper` breaks ties between equal
/// levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<QualityType>", into = "Vec<QualityType>")]
pub struct QualityTable {
    order: Vec<QualityType>,
}

impl Default for QualityTable {
    fn default() -> Self {
        Self {
            order: QualityType::ALL.to_vec(),
        }
    }
}

impl QualityTable {
    /// Builds a table from lowest to highest level.
    ///
    /// # Errors
    ///
    /// Returns `EpisodicError::InvalidQualityTable` when a level is listed
    /// twice or missing.
    pub fn new(order: Vec<QualityType>) -> Result<Self> {
        for (i, kind) in order.iter().enumerate() {
            if order[..i].contains(kind) {
                return Err(EpisodicError::InvalidQualityTable(format!(
                    "{kind} is listed more than once"
                )));
            }
        }
        if let Some(missing) = QualityType::ALL.iter().find(|k| !order.contains(k)) {
            return Err(EpisodicError::InvalidQualityTable(format!(
                "{missing} is missing"
            )));
        }
        Ok(Self { order })
    }

    /// Position of `kind` in the table, lowest first.
    #[must_use]
    pub fn rank(&self, kind: QualityType) -> usize {
        // Construction guarantees every level is present.
        self.order.iter().position(|k| *k == kind).unwrap_or(0)
    }

    /// Compares two qualities: level rank first, then the proper flag.
    #[must_use]
    pub fn compare(&self, a: Quality, b: Quality) -> Ordering {
        self.rank(a.kind)
            .cmp(&self.rank(b.kind))
            .then(a.proper.cmp(&b.proper))
    }

    /// Returns `true` only if `candidate` strictly outranks `current`.
    #[must_use]
    pub fn is_upgrade(&self, candidate: Quality, current: Quality) -> bool {
        self.compare(candidate, current) == Ordering::Greater
    }
}

impl TryFrom<Vec<QualityType>> for QualityTable {
    type Error = EpisodicError;

    fn try_from(order: Vec<QualityType>) -> Result<Self> {
        Self::new(order)
    }
}

impl From<QualityTable> for Vec<QualityType> {
    fn from(table: QualityTable) -> Self {
        table.order
    }
}
